use crate::cache::{ResultCacheKey, ResultCacheValue};
use crate::config::MinerConfig;
use crate::detection::derive_spans;
use crate::engine::MiningEngine;
use crate::sources::SourceRegistry;
use crate::storage::{
    calculate_config_hash, calculate_text_hash, FileStorage, NoOpStorage, ResultStorage,
};
use crate::types::*;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics: lets you inspect/compare each boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub text: String,
    pub candidates: Vec<CandidateBoundary>,
    pub spans: Vec<RecordSpan>,
    pub result: DocumentResult,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        tracing::info!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    /// Human-readable table of the collected timings, `None` when disabled
    pub fn summary(&self) -> Option<String> {
        if !self.enabled || self.timings.is_empty() {
            return None;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        let mut out = String::from("📊 Performance Summary:\n");
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            out.push_str(&format!(
                "   {:.<35} {:.0}ms ({:.1}%)\n",
                step,
                duration.as_millis(),
                percentage
            ));
        }
        out.push_str(&format!("   {:.<35} {:.0}ms", "Total", total.as_millis()));
        Some(out)
    }
}

/// Per-run switches for document processing
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub skip_cache: bool,
    pub profile: bool,
}

/// Name records are keyed by: the file name, so ids survive moving the input
fn source_name_of(input_path: &str) -> &str {
    Path::new(input_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(input_path)
}

pub struct ModuleMiner {
    sources: SourceRegistry,
    storage: Box<dyn ResultStorage + Send + Sync>,
    engine: MiningEngine,
    config_hash: String,
}

impl ModuleMiner {
    /// Create ModuleMiner with full dependency injection
    pub fn new_with_dependencies(
        config: &MinerConfig,
        sources: SourceRegistry,
        storage: Box<dyn ResultStorage + Send + Sync>,
    ) -> Result<Self> {
        let engine = MiningEngine::from_config(config).context("Failed to compile miner config")?;
        Ok(Self {
            sources,
            storage,
            engine,
            config_hash: calculate_config_hash(config)?,
        })
    }

    /// Default text sources, no caching
    pub fn new(config: &MinerConfig) -> Result<Self> {
        Self::new_with_dependencies(config, SourceRegistry::default(), Box::new(NoOpStorage::new()))
    }

    /// Default text sources with an on-disk result cache
    pub fn new_with_cache(config: &MinerConfig, cache_dir: &str) -> Result<Self> {
        let storage = FileStorage::new(cache_dir)
            .with_context(|| format!("Failed to create cache directory {cache_dir}"))?;
        Self::new_with_dependencies(config, SourceRegistry::default(), Box::new(storage))
    }

    pub fn engine(&self) -> &MiningEngine {
        &self.engine
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Mine text that is already in memory; never touches the cache
    pub fn mine_text(&self, text: &str, source_name: &str) -> DocumentResult {
        self.engine.mine(text, source_name)
    }

    pub fn process_document(&self, input_path: &str, skip_cache: bool) -> Result<DocumentResult> {
        let options = ProcessOptions {
            skip_cache,
            profile: false,
        };
        self.process_document_with_options(input_path, options)
    }

    pub fn process_document_with_options(
        &self,
        input_path: &str,
        options: ProcessOptions,
    ) -> Result<DocumentResult> {
        let mut profiler = StepProfiler::new(options.profile);
        let result = self.process_document_with_profiler(input_path, &mut profiler, options.skip_cache);
        if let Some(summary) = profiler.summary() {
            tracing::info!(path = input_path, "\n{summary}");
        }
        result
    }

    fn process_document_with_profiler(
        &self,
        input_path: &str,
        profiler: &mut StepProfiler,
        skip_cache: bool,
    ) -> Result<DocumentResult> {
        let start_time = Instant::now();
        let source_name = source_name_of(input_path);

        let text = profiler.time_step("1. Read Text", || self.sources.read_text(Path::new(input_path)))?;

        let cache_key = profiler.time_step("2. Cache Key Generation", || {
            ResultCacheKey::new(calculate_text_hash(&text), self.config_hash.clone(), source_name)
        });

        if skip_cache {
            tracing::debug!(path = input_path, "skipping cache lookup");
        } else {
            let cached = profiler.time_step("3. Cache Lookup", || self.storage.get_result(&cache_key));
            match cached {
                Ok(Some(cached)) => {
                    tracing::info!(path = input_path, "cache hit");
                    return Ok(cached.result);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(path = input_path, error = %e, "ignoring unreadable cache entry"),
            }
        }

        let candidates = profiler.time_step("4. Boundary Detection", || self.engine.detect(&text));
        let result = profiler.time_step("5. Field Extraction", || {
            self.engine.mine_candidates(&text, source_name, &candidates)
        });

        if !skip_cache {
            let processing_time = start_time.elapsed().as_millis() as u64;
            let cache_value = ResultCacheValue::new(result.clone(), processing_time);
            let stored = profiler.time_step("6. Cache Storage", || {
                self.storage.store_result(&cache_key, &cache_value)
            });
            if let Err(e) = stored {
                tracing::warn!(path = input_path, error = %e, "failed to store result in cache");
            }
        }

        tracing::debug!(
            path = input_path,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "document processed"
        );
        Ok(result)
    }

    /// Process documents in parallel. The report lists every input in input
    /// order; a document that fails carries its error instead of records.
    pub fn process_batch(&self, input_paths: &[String], options: ProcessOptions) -> BatchReport {
        let documents: Vec<DocumentReport> = input_paths
            .par_iter()
            .map(|input_path| {
                let outcome = match self.process_document_with_options(input_path, options) {
                    Ok(result) => DocumentOutcome::Extracted(result),
                    Err(e) => {
                        tracing::warn!(path = %input_path, error = %e, "document failed");
                        DocumentOutcome::Failed {
                            error: format!("{e:#}"),
                        }
                    }
                };
                DocumentReport {
                    source_file: input_path.clone(),
                    outcome,
                }
            })
            .collect();

        BatchReport::new(self.config_hash.clone(), documents)
    }

    /// Process document and capture all intermediate stage outputs
    /// Used for pipeline diagnostics and testing stage boundaries
    pub fn process_document_capture_stages(&self, input_path: &str) -> Result<PipelineStages> {
        let text = self.sources.read_text(Path::new(input_path))?;
        tracing::info!(bytes = text.len(), "stage 1: text captured");

        let candidates = self.engine.detect(&text);
        let spans = derive_spans(&candidates, text.len());
        tracing::info!(
            candidates = candidates.len(),
            spans = spans.len(),
            "stage 2: boundaries captured"
        );

        let result = self
            .engine
            .mine_candidates(&text, source_name_of(input_path), &candidates);
        tracing::info!(records = result.modules.len(), "stage 3: records captured");

        Ok(PipelineStages {
            text,
            candidates,
            spans,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_profiler_has_no_summary() {
        let mut profiler = StepProfiler::new(false);
        assert_eq!(profiler.time_step("step", || 41 + 1), 42);
        assert!(profiler.summary().is_none());
        assert!(profiler.timings().is_empty());
    }

    #[test]
    fn enabled_profiler_records_steps() {
        let mut profiler = StepProfiler::new(true);
        profiler.time_step("1. Read Text", || ());
        profiler.time_step("2. Mine", || ());
        assert_eq!(profiler.timings().len(), 2);
        let summary = profiler.summary().unwrap();
        assert!(summary.contains("1. Read Text"));
        assert!(summary.contains("Total"));
    }

    #[test]
    fn source_name_is_file_name() {
        assert_eq!(source_name_of("docs/handbuch.txt"), "handbuch.txt");
        assert_eq!(source_name_of("handbuch.txt"), "handbuch.txt");
    }
}
