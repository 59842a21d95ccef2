// All core functionality is in modmine-core
// This CLI acts as a thin wrapper around the core library

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Re-export core types for convenience
pub use modmine_core::*;

/// Result cache location: `<user cache dir>/modmine`, or `./.modmine-cache`
/// on platforms without one
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("modmine"))
        .unwrap_or_else(|| PathBuf::from(".modmine-cache"))
}

/// Log to stderr; `RUST_LOG` wins over the `--verbose` default
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "modmine=debug,modmine_core=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Report path used when `--output` is not given
pub fn default_output_path(inputs: &[String]) -> String {
    match inputs {
        [single] => {
            let stem = std::path::Path::new(single)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            format!("{stem}_modmine.json")
        }
        _ => "modmine_report.json".to_string(),
    }
}
