//! Boundary detection
//!
//! Independent strategies scan the full document text and propose record
//! start offsets. Their candidates are concatenated and stably sorted by
//! position; duplicates are kept and resolve into empty spans later.
//!
//! ```text
//! text ──► DirectMarkerStrategy ────┐
//!     └──► ProximityMarkerStrategy ─┴─► sort by position ─► derive_spans
//! ```

pub mod direct;
pub mod proximity;

pub use direct::DirectMarkerStrategy;
pub use proximity::ProximityMarkerStrategy;

use crate::config::DetectionConfig;
use crate::error::{MinerError, MinerResult};
use crate::rules::compile_pattern;
use crate::types::{CandidateBoundary, RecordSpan};
use regex::Regex;

/// A boundary signal. Implementations must be pure functions of `text`.
pub trait DetectionStrategy {
    fn detect(&self, text: &str) -> Vec<CandidateBoundary>;
    fn name(&self) -> &str;
}

/// Compile a marker pattern; group 1 (when present) is the seed capture
pub(crate) fn compile_marker(name: &str, pattern: &str, size_limit: usize) -> MinerResult<Regex> {
    compile_pattern(pattern, size_limit).map_err(|source| MinerError::InvalidPattern {
        field: name.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Trimmed group 1 of a marker match, `None` if absent or blank
pub(crate) fn seed_from(caps: &regex::Captures<'_>) -> Option<String> {
    caps.get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub struct BoundaryDetector {
    strategies: Vec<Box<dyn DetectionStrategy + Send + Sync>>,
}

impl BoundaryDetector {
    pub fn new(strategies: Vec<Box<dyn DetectionStrategy + Send + Sync>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &DetectionConfig, size_limit: usize) -> MinerResult<Self> {
        let direct = compile_marker("direct_marker", &config.direct_marker, size_limit)?;
        let mut strategies: Vec<Box<dyn DetectionStrategy + Send + Sync>> =
            vec![Box::new(DirectMarkerStrategy::new(direct.clone()))];

        if config.enable_proximity {
            let secondary =
                compile_marker("proximity_marker", &config.proximity_marker, size_limit)?;
            strategies.push(Box::new(ProximityMarkerStrategy::new(
                secondary,
                direct,
                config.proximity_window,
            )));
        }

        Ok(Self::new(strategies))
    }

    /// Ordered candidate boundaries; empty when the text has no markers
    pub fn detect(&self, text: &str) -> Vec<CandidateBoundary> {
        let mut candidates = Vec::new();
        for strategy in &self.strategies {
            let found = strategy.detect(text);
            tracing::debug!(strategy = strategy.name(), candidates = found.len(), "boundary strategy finished");
            candidates.extend(found);
        }
        // Stable: at equal positions, earlier strategies stay first
        candidates.sort_by_key(|c| c.position);
        candidates
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

/// Span i runs from candidate i to candidate i+1; the last one to the end.
pub fn derive_spans(candidates: &[CandidateBoundary], text_len: usize) -> Vec<RecordSpan> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let end = candidates
                .get(i + 1)
                .map_or(text_len, |next| next.position);
            RecordSpan::new(candidate.position, end)
        })
        .collect()
}
