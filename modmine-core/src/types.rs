use crate::config::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type RecordId = Uuid;

/// The schema version stamped on every report.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

// ===== DETECTION TYPES =====

/// Which detection strategy proposed a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundaryStrategy {
    DirectMarker,
    ProximityMarker,
}

/// A proposed record start. Only the ordering by `position` matters downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBoundary {
    /// Byte offset into the document text
    pub position: usize,
    pub strategy: BoundaryStrategy,
    pub seed_value: Option<String>,
}

/// `[start, end)` byte range into the document buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpan {
    pub start: usize,
    pub end: usize,
}

impl RecordSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow this span out of the document it was derived from
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

// ===== EXTRACTION TYPES =====

/// A normalized field value; serializes as a bare JSON string or number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(u32),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

/// Where a field value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MatchProvenance {
    /// Pre-filled from the boundary marker's capture
    Seed,
    /// Index into the field's pattern list
    Pattern {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        lang: Option<Language>,
    },
}

/// One module description recovered from a span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub id: RecordId,
    /// Graph pseudo-key, e.g. `PDF_LineareAlgebra`
    pub key: String,
    /// Field name -> normalized value (null when absent)
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<FieldValue>>,
    /// First `excerpt_limit` characters of the span, for auditing
    pub raw_excerpt: String,
    pub span: RecordSpan,
    pub strategy: BoundaryStrategy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<String, MatchProvenance>,
}

impl ExtractedRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|v| v.as_ref())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    pub fn integer(&self, name: &str) -> Option<u32> {
        self.field(name).and_then(FieldValue::as_integer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

/// A non-fatal problem noticed while mining one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Byte offset of the span the problem belongs to
    pub span_start: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(span_start: usize, field: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            span_start,
            field: field.map(str::to_string),
            message,
        }
    }
}

/// Aggregate counts for reporting; never used for control flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStatistics {
    pub total_modules_found: usize,
    pub modules_with_name: usize,
    pub modules_with_ects: usize,
    pub direct_candidates: usize,
    pub proximity_candidates: usize,
    pub spans_examined: usize,
    pub spans_rejected: usize,
}

/// Records mined from one document, in document order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub modules: Vec<ExtractedRecord>,
    pub statistics: ExtractionStatistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Either the document's records or the reason it could not be read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Extracted(DocumentResult),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source_file: String,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn result(&self) -> Option<&DocumentResult> {
        match &self.outcome {
            DocumentOutcome::Extracted(result) => Some(result),
            DocumentOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            DocumentOutcome::Extracted(_) => None,
            DocumentOutcome::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchTotals {
    pub documents: usize,
    pub failed_documents: usize,
    pub total_modules_found: usize,
    pub modules_with_name: usize,
    pub modules_with_ects: usize,
}

/// Every input document, in input order, with records or an error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema_version: String,
    pub extracted_at: DateTime<Utc>,
    pub config_hash: String,
    pub documents: Vec<DocumentReport>,
    pub totals: BatchTotals,
}

impl BatchReport {
    pub fn new(config_hash: String, documents: Vec<DocumentReport>) -> Self {
        let mut totals = BatchTotals {
            documents: documents.len(),
            ..BatchTotals::default()
        };
        for report in &documents {
            match report.result() {
                Some(result) => {
                    totals.total_modules_found += result.statistics.total_modules_found;
                    totals.modules_with_name += result.statistics.modules_with_name;
                    totals.modules_with_ects += result.statistics.modules_with_ects;
                }
                None => totals.failed_documents += 1,
            }
        }

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            extracted_at: Utc::now(),
            config_hash,
            documents,
            totals,
        }
    }
}
