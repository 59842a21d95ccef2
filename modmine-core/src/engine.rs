//! Record mining over one document: detect boundaries, derive spans,
//! extract fields per span and keep the spans that pass acceptance.

use crate::config::MinerConfig;
use crate::detection::{derive_spans, BoundaryDetector};
use crate::error::MinerResult;
use crate::extraction::{char_prefix, AcceptancePredicate, FieldExtractor, RecordAssembler};
use crate::rules::RuleTable;
use crate::types::{
    BoundaryStrategy, CandidateBoundary, Diagnostic, DocumentResult, ExtractedRecord,
    ExtractionStatistics, RecordSpan,
};
use std::time::Duration;

/// Outcome of running one span through extraction and acceptance
#[derive(Debug, Clone)]
pub struct SpanOutcome {
    pub record: Option<ExtractedRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiled detector plus rule table. Holds no per-document state, so one
/// engine can mine any number of documents, from any number of threads.
pub struct MiningEngine {
    detector: BoundaryDetector,
    rules: RuleTable,
    acceptance: AcceptancePredicate,
    assembler: RecordAssembler,
    max_span_chars: Option<usize>,
    span_budget: Option<Duration>,
}

impl MiningEngine {
    pub fn from_config(config: &MinerConfig) -> MinerResult<Self> {
        let rules = RuleTable::compile(config)?;
        let detector =
            BoundaryDetector::from_config(&config.detection, config.limits.regex_size_limit)?;
        Ok(Self::new(detector, rules, config))
    }

    /// Assemble an engine from already built parts; `config` supplies the
    /// extraction and limit settings only.
    pub fn new(detector: BoundaryDetector, rules: RuleTable, config: &MinerConfig) -> Self {
        Self {
            acceptance: AcceptancePredicate::from_rules(&rules),
            assembler: RecordAssembler::new(&config.extraction, rules.identity_field()),
            detector,
            rules,
            max_span_chars: config.limits.max_span_chars,
            span_budget: config.limits.span_budget_ms.map(Duration::from_millis),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    pub fn detect(&self, text: &str) -> Vec<CandidateBoundary> {
        self.detector.detect(text)
    }

    pub fn mine(&self, text: &str, source_name: &str) -> DocumentResult {
        let candidates = self.detect(text);
        self.mine_candidates(text, source_name, &candidates)
    }

    /// Mine from boundaries that were already detected (stage capture reuses them)
    pub fn mine_candidates(
        &self,
        text: &str,
        source_name: &str,
        candidates: &[CandidateBoundary],
    ) -> DocumentResult {
        let spans = derive_spans(candidates, text.len());
        let mut statistics = ExtractionStatistics {
            spans_examined: spans.len(),
            ..ExtractionStatistics::default()
        };
        for candidate in candidates {
            match candidate.strategy {
                BoundaryStrategy::DirectMarker => statistics.direct_candidates += 1,
                BoundaryStrategy::ProximityMarker => statistics.proximity_candidates += 1,
            }
        }

        let mut modules = Vec::new();
        let mut diagnostics = Vec::new();
        for (candidate, span) in candidates.iter().zip(spans) {
            let outcome = self.extract_record(text, span, candidate, source_name, modules.len() + 1);
            diagnostics.extend(outcome.diagnostics);
            match outcome.record {
                Some(record) => modules.push(record),
                None => statistics.spans_rejected += 1,
            }
        }

        let identity = self.rules.identity_field();
        let credit = self.rules.credit_field();
        statistics.total_modules_found = modules.len();
        statistics.modules_with_name = modules.iter().filter(|m| m.field(identity).is_some()).count();
        statistics.modules_with_ects = modules.iter().filter(|m| m.field(credit).is_some()).count();

        tracing::info!(
            source = source_name,
            candidates = candidates.len(),
            modules = statistics.total_modules_found,
            rejected = statistics.spans_rejected,
            diagnostics = diagnostics.len(),
            "mined document"
        );

        DocumentResult {
            modules,
            statistics,
            diagnostics,
        }
    }

    /// Extract one span; `ordinal` numbers the record if it gets accepted
    pub fn extract_record(
        &self,
        text: &str,
        span: RecordSpan,
        candidate: &CandidateBoundary,
        source_name: &str,
        ordinal: usize,
    ) -> SpanOutcome {
        let span_text = span.slice(text);
        let search_text = match self.max_span_chars {
            Some(limit) => {
                let capped = char_prefix(span_text, limit);
                if capped.len() < span_text.len() {
                    tracing::debug!(span_start = span.start, limit, "span capped for field search");
                }
                capped
            }
            None => span_text,
        };

        let extraction = FieldExtractor::new(&self.rules)
            .with_budget(self.span_budget)
            .extract(search_text, candidate.seed_value.as_deref());

        let diagnostics = extraction
            .issues
            .iter()
            .map(|issue| Diagnostic::warning(span.start, issue.field.as_deref(), issue.message.clone()))
            .collect();

        if !self.acceptance.accepts(&extraction) {
            tracing::debug!(span_start = span.start, span_len = span.len(), "span rejected");
            return SpanOutcome {
                record: None,
                diagnostics,
            };
        }

        let record = self.assembler.assemble(
            source_name,
            text,
            span,
            candidate.strategy,
            extraction,
            ordinal,
        );
        SpanOutcome {
            record: Some(record),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MiningEngine {
        MiningEngine::from_config(&MinerConfig::default()).unwrap()
    }

    #[test]
    fn duplicate_boundaries_yield_one_record() {
        let text = "Modul: Lineare Algebra\nECTS: 9\n";
        let result = engine().mine(text, "la.txt");
        assert_eq!(result.statistics.spans_examined, 2);
        assert_eq!(result.statistics.spans_rejected, 1);
        assert_eq!(result.modules.len(), 1);
        assert_eq!(result.modules[0].key, "PDF_LineareAlgebra");
        assert_eq!(result.modules[0].strategy, BoundaryStrategy::ProximityMarker);
    }

    #[test]
    fn empty_document_yields_empty_result() {
        let result = engine().mine("", "empty.txt");
        assert!(result.modules.is_empty());
        assert_eq!(result.statistics, ExtractionStatistics::default());
    }

    #[test]
    fn capped_search_keeps_full_excerpt() {
        let mut config = MinerConfig::default();
        config.limits.max_span_chars = Some(20);
        let engine = MiningEngine::from_config(&config).unwrap();
        let text = "Modul: Analysis\nSprache: Deutsch\nECTS: 6\n";
        let result = engine.mine(text, "a.txt");

        let record = &result.modules[0];
        assert_eq!(record.text("modul_name"), Some("Analysis"));
        assert_eq!(record.field("sprache"), None);
        assert_eq!(record.raw_excerpt, text);
    }

    #[test]
    fn malformed_credit_surfaces_as_document_diagnostic() {
        let mut config = MinerConfig::default();
        config.fields[1].patterns.insert(
            0,
            crate::config::PatternConfig::inline(r"Kreditpunkte[:\s]+([^\n]+)", None),
        );
        let engine = MiningEngine::from_config(&config).unwrap();
        let text = "Modul: Statistik\nKreditpunkte: n.a.\n";
        let result = engine.mine(text, "s.txt");

        assert_eq!(result.modules.len(), 1);
        assert_eq!(result.modules[0].field("ects"), None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].span_start, 0);
        assert_eq!(result.diagnostics[0].field.as_deref(), Some("ects"));
    }
}
