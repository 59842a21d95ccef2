use anyhow::{Context, Result};
use clap::Parser;

use modmine::{default_cache_dir, default_output_path, init_tracing};
use modmine_core::{BatchReport, MinerConfig, ModuleMiner, PipelineStages, ProcessOptions};

#[derive(Parser)]
#[command(name = "modmine")]
#[command(about = "Mine course-module records out of module-handbook text dumps")]
struct Args {
    /// Text or XHTML dumps of module handbooks to process
    #[arg(required_unless_present_any = ["show_configs", "print_default_config"])]
    inputs: Vec<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output format: report or records
    #[arg(short = 'f', long, default_value = "report")]
    output_format: String,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Print the built-in rule table as YAML and exit
    #[arg(long)]
    print_default_config: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Skip cache and force fresh processing (useful for development/testing)
    #[arg(long)]
    skip_cache: bool,

    /// Disable the on-disk result cache entirely
    #[arg(long)]
    no_cache: bool,

    /// Result cache directory (default: user cache dir)
    #[arg(long)]
    cache_dir: Option<String>,

    /// Dump all intermediate pipeline stage outputs of the first input
    /// Captures: text, candidate boundaries, spans, and records as separate files
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output (default: test_outputs/stages)
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    println!("🦀 modmine Module Handbook Miner");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    if args.print_default_config {
        print!("{}", MinerConfig::default().to_yaml()?);
        return Ok(());
    }

    // An explicit config that fails to load is fatal; defaults only when none was given
    let config = match &args.config {
        Some(config_path) => {
            let config = MinerConfig::load_from_file(config_path)
                .with_context(|| format!("Failed to load config {config_path}"))?;
            println!("📋 Loaded config from: {}", config_path);
            config
        }
        None => {
            println!("📋 Using default config");
            MinerConfig::default()
        }
    };

    let miner = create_miner(&args, &config)?;

    // Stage dump mode: capture and save all intermediates
    if args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        let input = args
            .inputs
            .first()
            .context("--dump-stages needs an input document")?;
        match miner.process_document_capture_stages(input) {
            Ok(stages) => {
                save_stages(&stages, input, &args.stages_dir)?;
                println!("\n✅ All stages dumped to: {}", args.stages_dir);
            }
            Err(e) => {
                eprintln!("❌ Stage dump failed: {e:#}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    println!("📄 Processing {} document(s)", args.inputs.len());
    let options = ProcessOptions {
        skip_cache: args.skip_cache,
        profile: args.profile,
    };
    let report = miner.process_batch(&args.inputs, options);
    tracing::info!(
        documents = report.totals.documents,
        failed = report.totals.failed_documents,
        modules = report.totals.total_modules_found,
        "batch finished"
    );
    print_report_summary(&report);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.inputs));
    save_report(&report, &output_path, &args.output_format)?;

    if report.totals.failed_documents == report.totals.documents {
        eprintln!("❌ No document could be processed");
        std::process::exit(1);
    }

    Ok(())
}

fn create_miner(args: &Args, config: &MinerConfig) -> Result<ModuleMiner> {
    if args.no_cache {
        println!("🚫 Result cache disabled (--no-cache)");
        return ModuleMiner::new(config);
    }

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| default_cache_dir().to_string_lossy().into_owned());
    println!("🗄️  Cache directory: {}", cache_dir);
    ModuleMiner::new_with_cache(config, &cache_dir)
}

fn print_report_summary(report: &BatchReport) {
    for document in &report.documents {
        match (document.result(), document.error()) {
            (Some(result), _) => {
                println!("✅ {}", document.source_file);
                println!("   - Modules: {}", result.statistics.total_modules_found);
                println!("   - With name: {}", result.statistics.modules_with_name);
                println!("   - With ECTS: {}", result.statistics.modules_with_ects);
                if !result.diagnostics.is_empty() {
                    println!("   - ⚠️  Warnings: {}", result.diagnostics.len());
                }
            }
            (None, Some(error)) => println!("❌ {}: {}", document.source_file, error),
            (None, None) => {}
        }
    }

    println!("📊 Totals:");
    println!("   - Documents: {}", report.totals.documents);
    println!("   - Failed: {}", report.totals.failed_documents);
    println!("   - Modules: {}", report.totals.total_modules_found);
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  <inputs>...             Text (.txt) or XHTML (.html, .xhtml) handbook dumps");
    println!("  --config <path>         Load custom config file");
    println!("  --output <path>         Output file path (auto-generated if not specified)");
    println!("  --output-format <fmt>   Output format: report or records");
    println!("  --print-default-config  Print the built-in rule table as YAML");
    println!("  --skip-cache            Ignore cached results for this run");
    println!("  --no-cache              Disable the result cache");
    println!("  --cache-dir <path>      Result cache directory");

    println!("\n📄 Output Formats:");
    println!("  report   - Per-document records, statistics and warnings (default)");
    println!("  records  - Flat list of module records across all documents");

    println!("\n📝 Usage Examples:");
    println!("  modmine handbuch.txt");
    println!("  modmine handbuch.txt -o /path/to/output.json");
    println!("  modmine a.txt b.html -c rules.yaml -f records");
    println!("  modmine --print-default-config > rules.yaml");
}

fn save_stages(stages: &PipelineStages, input: &str, output_dir: &str) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1: Document text
    let text_path = format!("{}/stage1_text.txt", output_dir);
    fs::write(&text_path, &stages.text)?;
    println!("  💾 {}", text_path);

    // Stage 2a: Candidate boundaries
    let candidates_path = format!("{}/stage2a_candidates.json", output_dir);
    fs::write(&candidates_path, serde_json::to_string_pretty(&stages.candidates)?)?;
    println!("  💾 {} ({} candidates)", candidates_path, stages.candidates.len());

    // Stage 2b: Spans
    let spans_path = format!("{}/stage2b_spans.json", output_dir);
    fs::write(&spans_path, serde_json::to_string_pretty(&stages.spans)?)?;
    println!("  💾 {} ({} spans)", spans_path, stages.spans.len());

    // Stage 3: Records
    let records_path = format!("{}/stage3_records.json", output_dir);
    fs::write(&records_path, serde_json::to_string_pretty(&stages.result)?)?;
    println!("  💾 {} ({} records)", records_path, stages.result.modules.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "input": input,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "text_bytes": stages.text.len(),
            "candidates": stages.candidates.len(),
            "spans": stages.spans.len(),
            "records": stages.result.modules.len(),
            "diagnostics": stages.result.diagnostics.len(),
        }
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path);

    Ok(())
}

fn save_report(report: &BatchReport, output_path: &str, format: &str) -> Result<()> {
    report.save_with_format(output_path, format)?;

    match format {
        "records" => println!("💾 Records saved to: {}", output_path),
        "report" => println!("💾 Report saved to: {}", output_path),
        _ => {
            tracing::warn!(format, "unknown output format, writing report");
            println!("⚠️  Unknown output format '{}', using default report format", format);
            println!("💾 Report saved to: {}", output_path);
        }
    }

    Ok(())
}
