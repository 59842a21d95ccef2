//! Field extraction
//!
//! Resolves every field of the rule table against one span's text:
//! matchers are tried in declared order and the first non-empty
//! normalized capture wins. Unmatched fields are simply absent.

pub mod acceptance;
pub mod normalize;

pub use acceptance::{record_id, AcceptancePredicate, RecordAssembler};
pub use normalize::{char_prefix, key_fragment, normalize_credits, normalize_whitespace, CreditError};

use crate::config::FieldKind;
use crate::rules::{FieldRule, RuleTable};
use crate::types::{FieldValue, MatchProvenance};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A non-fatal problem found while resolving a span's fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: Option<String>,
    pub message: String,
}

/// Outcome of running the rule table over one span
#[derive(Debug, Clone, Default)]
pub struct SpanExtraction {
    /// Every rule-table field, `None` when unresolved
    pub fields: BTreeMap<String, Option<FieldValue>>,
    pub provenance: BTreeMap<String, MatchProvenance>,
    pub issues: Vec<FieldIssue>,
}

impl SpanExtraction {
    fn unresolved(rules: &RuleTable) -> Self {
        Self {
            fields: rules
                .fields()
                .iter()
                .map(|rule| (rule.name.clone(), None))
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_resolved(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(Some(_)))
    }

    fn set(&mut self, field: &str, value: FieldValue, provenance: MatchProvenance) {
        self.fields.insert(field.to_string(), Some(value));
        self.provenance.insert(field.to_string(), provenance);
    }
}

/// Stateless per span; borrows the compiled rule table.
pub struct FieldExtractor<'r> {
    rules: &'r RuleTable,
    budget: Option<Duration>,
}

impl<'r> FieldExtractor<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self {
            rules,
            budget: None,
        }
    }

    /// Stop evaluating further fields once a span has used this much time
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn extract(&self, span_text: &str, seed_name: Option<&str>) -> SpanExtraction {
        let mut extraction = SpanExtraction::unresolved(self.rules);

        // Degenerate span (duplicate boundary): nothing to attribute, not even the seed
        if span_text.trim().is_empty() {
            return extraction;
        }

        if let Some(seed) = seed_name.map(normalize_whitespace).filter(|s| !s.is_empty()) {
            extraction.set(
                self.rules.identity_field(),
                FieldValue::Text(seed),
                MatchProvenance::Seed,
            );
        }

        let deadline = self.budget.map(|budget| Instant::now() + budget);
        let fields = self.rules.fields();
        for (position, rule) in fields.iter().enumerate() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                let skipped = fields.len() - position;
                tracing::warn!(skipped, "span match budget exhausted");
                extraction.issues.push(FieldIssue {
                    field: None,
                    message: format!("match budget exhausted, {skipped} field(s) not evaluated"),
                });
                break;
            }
            self.resolve_field(rule, span_text, &mut extraction);
        }

        extraction
    }

    fn resolve_field(&self, rule: &FieldRule, span_text: &str, extraction: &mut SpanExtraction) {
        for (index, matcher) in rule.matchers.iter().enumerate() {
            let Some(raw) = matcher.capture(span_text, self.rules.terminator()) else {
                continue;
            };
            let value = normalize_whitespace(raw);
            if value.is_empty() {
                continue;
            }

            let provenance = MatchProvenance::Pattern {
                index,
                lang: matcher.lang(),
            };
            match rule.kind {
                FieldKind::Text => {
                    extraction.set(&rule.name, FieldValue::Text(value), provenance);
                }
                FieldKind::Credits => match normalize_credits(&value) {
                    Ok(credits) => {
                        extraction.set(&rule.name, FieldValue::Integer(credits), provenance);
                    }
                    Err(e) => {
                        tracing::warn!(field = %rule.name, value = %value, error = %e, "malformed numeric value");
                        extraction.issues.push(FieldIssue {
                            field: Some(rule.name.clone()),
                            message: format!("malformed numeric value '{value}': {e}"),
                        });
                    }
                },
            }
            // First matching pattern decides, even when its value was malformed
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldRuleConfig, MinerConfig, PatternConfig};

    fn default_rules() -> RuleTable {
        RuleTable::compile(&MinerConfig::default()).unwrap()
    }

    #[test]
    fn resolves_fields_from_span() {
        let rules = default_rules();
        let span = "Modul: Lineare Algebra\nECTS: 9\nSprache: Deutsch\n\
                    Inhalt: Vektorräume,\nlineare Abbildungen\nLernziele: Rechnen\n";
        let extraction = FieldExtractor::new(&rules).extract(span, None);

        assert_eq!(
            extraction.fields["modul_name"],
            Some(FieldValue::Text("Lineare Algebra".into()))
        );
        assert_eq!(extraction.fields["ects"], Some(FieldValue::Integer(9)));
        assert_eq!(extraction.fields["sprache"], Some(FieldValue::Text("Deutsch".into())));
        assert_eq!(
            extraction.fields["inhalte"],
            Some(FieldValue::Text("Vektorräume, lineare Abbildungen".into()))
        );
        assert_eq!(extraction.fields["lernziele"], Some(FieldValue::Text("Rechnen".into())));
        assert_eq!(extraction.fields["voraussetzungen"], None);
        assert!(extraction.issues.is_empty());
    }

    #[test]
    fn higher_priority_pattern_wins() {
        let mut config = MinerConfig::default();
        config.fields.push(FieldRuleConfig::new(
            "dozent",
            FieldKind::Text,
            vec![
                PatternConfig::inline(r"Dozent[:\s]+([^\n]+)", None),
                PatternConfig::inline(r"Lehrende[:\s]+([^\n]+)", None),
            ],
        ));
        let rules = RuleTable::compile(&config).unwrap();
        // The lower-priority label appears first in the text; priority still decides
        let span = "Modul: X\nLehrende: Prof. B\nDozent: Prof. A\n";
        let extraction = FieldExtractor::new(&rules).extract(span, None);
        assert_eq!(extraction.fields["dozent"], Some(FieldValue::Text("Prof. A".into())));
        assert_eq!(
            extraction.provenance["dozent"],
            MatchProvenance::Pattern { index: 0, lang: None }
        );
    }

    #[test]
    fn english_label_is_used_when_german_is_missing() {
        let rules = default_rules();
        let span = "Modul: Databases\nPrerequisites: Programming\nLanguage: English\n";
        let extraction = FieldExtractor::new(&rules).extract(span, None);
        assert_eq!(
            extraction.fields["voraussetzungen"],
            Some(FieldValue::Text("Programming".into()))
        );
        assert_eq!(extraction.fields["sprache"], Some(FieldValue::Text("English".into())));
        assert_eq!(
            extraction.provenance["sprache"],
            MatchProvenance::Pattern {
                index: 1,
                lang: Some(crate::config::Language::En)
            }
        );
    }

    #[test]
    fn decimal_credits_are_truncated() {
        let rules = default_rules();
        let extraction = FieldExtractor::new(&rules).extract("Modul: X\nECTS: 7,5\n", None);
        assert_eq!(extraction.fields["ects"], Some(FieldValue::Integer(7)));
    }

    #[test]
    fn malformed_credits_are_null_with_issue() {
        let mut config = MinerConfig::default();
        config.fields[1].patterns.insert(
            0,
            PatternConfig::inline(r"Kreditpunkte[:\s]+([^\n]+)", None),
        );
        let rules = RuleTable::compile(&config).unwrap();
        let span = "Modul: X\nKreditpunkte: keine Angabe\nECTS: 5\n";
        let extraction = FieldExtractor::new(&rules).extract(span, None);

        assert_eq!(extraction.fields["ects"], None);
        assert_eq!(extraction.issues.len(), 1);
        assert_eq!(extraction.issues[0].field.as_deref(), Some("ects"));
        // Other fields still resolve
        assert!(extraction.is_resolved("modul_name"));
    }

    #[test]
    fn seed_is_fallback_and_span_match_overrides() {
        let rules = default_rules();
        let extractor = FieldExtractor::new(&rules);

        let overridden = extractor.extract("Modulname: Analysis I\nECTS: 6", Some("Ana-\nlysis"));
        assert_eq!(
            overridden.fields["modul_name"],
            Some(FieldValue::Text("Analysis I".into()))
        );

        let seeded = extractor.extract("ECTS: 6\nVorlesung", Some("  Analysis\n I "));
        assert_eq!(seeded.fields["modul_name"], Some(FieldValue::Text("Analysis I".into())));
        assert_eq!(seeded.provenance["modul_name"], MatchProvenance::Seed);
    }

    #[test]
    fn empty_span_ignores_seed() {
        let rules = default_rules();
        let extraction = FieldExtractor::new(&rules).extract(" \n", Some("Analysis"));
        assert!(extraction.fields.values().all(Option::is_none));
        assert!(extraction.provenance.is_empty());
    }

    #[test]
    fn exhausted_budget_leaves_fields_absent() {
        let rules = default_rules();
        let extraction = FieldExtractor::new(&rules)
            .with_budget(Some(Duration::ZERO))
            .extract("Modul: X\nECTS: 5", None);
        assert!(!extraction.is_resolved("ects"));
        assert_eq!(extraction.issues.len(), 1);
        assert_eq!(extraction.issues[0].field, None);
    }
}
