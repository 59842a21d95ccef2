use crate::types::*;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// One record in the flat `records` output format
#[derive(Debug, Clone, Serialize)]
pub struct RecordRow<'a> {
    pub source_file: &'a str,
    pub key: &'a str,
    #[serde(flatten)]
    pub fields: &'a BTreeMap<String, Option<FieldValue>>,
    pub raw_excerpt: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlatRecords<'a> {
    pub format: &'static str,
    pub records: Vec<RecordRow<'a>>,
}

impl BatchReport {
    /// Every accepted record of every readable document, in document order
    pub fn to_flat_records(&self) -> FlatRecords<'_> {
        let records = self
            .documents
            .iter()
            .filter_map(|document| {
                document
                    .result()
                    .map(|result| (document.source_file.as_str(), result))
            })
            .flat_map(|(source_file, result)| {
                result.modules.iter().map(move |record| RecordRow {
                    source_file,
                    key: &record.key,
                    fields: &record.fields,
                    raw_excerpt: &record.raw_excerpt,
                })
            })
            .collect();

        FlatRecords {
            format: "records",
            records,
        }
    }

    pub fn to_json_with_format(&self, format: &str) -> Result<String> {
        let json = match format {
            "records" => serde_json::to_string_pretty(&self.to_flat_records())?,
            _ => serde_json::to_string_pretty(self)?,
        };
        Ok(json)
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> Result<()> {
        let json = self.to_json_with_format(format)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report to {path}"))?;
        Ok(())
    }
}
