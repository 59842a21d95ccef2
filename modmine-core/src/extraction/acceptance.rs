use super::normalize::{char_prefix, key_fragment};
use super::SpanExtraction;
use crate::config::ExtractionConfig;
use crate::rules::RuleTable;
use crate::types::{BoundaryStrategy, ExtractedRecord, RecordId, RecordSpan};
use uuid::Uuid;

/// Keeps a span only if it resolved its identity or its credit field.
/// Everything else (cover pages, indices, boilerplate) is dropped.
#[derive(Debug, Clone)]
pub struct AcceptancePredicate {
    identity_field: String,
    credit_field: String,
}

impl AcceptancePredicate {
    pub fn new(identity_field: &str, credit_field: &str) -> Self {
        Self {
            identity_field: identity_field.to_string(),
            credit_field: credit_field.to_string(),
        }
    }

    pub fn from_rules(rules: &RuleTable) -> Self {
        Self::new(rules.identity_field(), rules.credit_field())
    }

    pub fn accepts(&self, extraction: &SpanExtraction) -> bool {
        extraction.is_resolved(&self.identity_field) || extraction.is_resolved(&self.credit_field)
    }
}

/// Stable record id: same source and span start give the same id on every run
pub fn record_id(source_name: &str, span_start: usize) -> RecordId {
    let name = format!("modmine:{source_name}#{span_start}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

/// Turns an accepted extraction into the output record
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    identity_field: String,
    excerpt_limit: usize,
    key_prefix: String,
    key_name_limit: usize,
}

impl RecordAssembler {
    pub fn new(config: &ExtractionConfig, identity_field: &str) -> Self {
        Self {
            identity_field: identity_field.to_string(),
            excerpt_limit: config.excerpt_limit,
            key_prefix: config.key_prefix.clone(),
            key_name_limit: config.key_name_limit,
        }
    }

    /// `ordinal` is the 1-based index of the record in its document, used
    /// for the pseudo-key when the identity is missing or has no key characters.
    pub fn assemble(
        &self,
        source_name: &str,
        document: &str,
        span: RecordSpan,
        strategy: BoundaryStrategy,
        extraction: SpanExtraction,
        ordinal: usize,
    ) -> ExtractedRecord {
        let key = self.key_for(&extraction, ordinal);
        ExtractedRecord {
            id: record_id(source_name, span.start),
            key,
            fields: extraction.fields,
            raw_excerpt: char_prefix(span.slice(document), self.excerpt_limit).to_string(),
            span,
            strategy,
            provenance: extraction.provenance,
        }
    }

    fn key_for(&self, extraction: &SpanExtraction, ordinal: usize) -> String {
        let fragment = extraction
            .fields
            .get(&self.identity_field)
            .and_then(|value| value.as_ref())
            .and_then(|value| value.as_text())
            .map(|name| key_fragment(name, self.key_name_limit))
            .filter(|fragment| !fragment.is_empty());

        match fragment {
            Some(fragment) => format!("{}_{}", self.key_prefix, fragment),
            None => format!("{}_Module_{}", self.key_prefix, ordinal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinerConfig;
    use crate::extraction::FieldExtractor;
    use crate::types::FieldValue;

    fn rules() -> RuleTable {
        RuleTable::compile(&MinerConfig::default()).unwrap()
    }

    #[test]
    fn accepts_on_either_anchor() {
        let rules = rules();
        let predicate = AcceptancePredicate::from_rules(&rules);
        let extractor = FieldExtractor::new(&rules);

        assert!(predicate.accepts(&extractor.extract("Modul: Analysis", None)));
        assert!(predicate.accepts(&extractor.extract("Leistungspunkte: 5", None)));
        assert!(!predicate.accepts(&extractor.extract("Sprache: Deutsch\nVorlesung", None)));
    }

    #[test]
    fn record_ids_are_deterministic() {
        assert_eq!(record_id("a.txt", 10), record_id("a.txt", 10));
        assert_ne!(record_id("a.txt", 10), record_id("a.txt", 11));
        assert_ne!(record_id("a.txt", 10), record_id("b.txt", 10));
    }

    #[test]
    fn assembles_key_and_excerpt() {
        let rules = rules();
        let config = ExtractionConfig {
            excerpt_limit: 12,
            ..ExtractionConfig::default()
        };
        let assembler = RecordAssembler::new(&config, rules.identity_field());
        let document = "Vorwort\nModul: Übung zur Analysis\nECTS: 5\n";
        let span = RecordSpan::new(8, document.len());
        let extraction = FieldExtractor::new(&rules).extract(span.slice(document), None);

        let record = assembler.assemble(
            "handbuch.txt",
            document,
            span,
            BoundaryStrategy::DirectMarker,
            extraction,
            1,
        );
        assert_eq!(record.key, "PDF_UebungzurAnalysis");
        assert_eq!(record.raw_excerpt, "Modul: Übung");
        assert_eq!(record.integer("ects"), Some(5));
        assert_eq!(record.id, record_id("handbuch.txt", 8));
    }

    #[test]
    fn unnamed_record_gets_ordinal_key() {
        let rules = rules();
        let assembler = RecordAssembler::new(&ExtractionConfig::default(), rules.identity_field());
        let document = "ECTS: 6\n";
        let span = RecordSpan::new(0, document.len());
        let extraction = FieldExtractor::new(&rules).extract(document, None);
        let record = assembler.assemble(
            "x.txt",
            document,
            span,
            BoundaryStrategy::ProximityMarker,
            extraction,
            3,
        );
        assert_eq!(record.key, "PDF_Module_3");
        assert_eq!(record.field("modul_name"), None);
        assert_eq!(record.fields.get("modul_name"), Some(&None));
        assert_eq!(record.field("ects"), Some(&FieldValue::Integer(6)));
    }
}
