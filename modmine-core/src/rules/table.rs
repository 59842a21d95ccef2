use super::block::{terminator_from_config, BlockTerminator};
use super::matcher::Matcher;
use crate::config::{FieldKind, MinerConfig};
use crate::error::{MinerError, MinerResult};

/// One output field with its matchers in priority order
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    pub matchers: Vec<Matcher>,
}

/// The compiled rule table: built once from configuration, then shared
/// read-only by every span and every document.
pub struct RuleTable {
    fields: Vec<FieldRule>,
    identity_field: String,
    credit_field: String,
    terminator: Box<dyn BlockTerminator + Send + Sync>,
}

impl RuleTable {
    pub fn compile(config: &MinerConfig) -> MinerResult<Self> {
        config.validate()?;
        let size_limit = config.limits.regex_size_limit;

        let mut fields = Vec::with_capacity(config.fields.len());
        for field in &config.fields {
            let mut matchers = Vec::with_capacity(field.patterns.len());
            for pattern in &field.patterns {
                let matcher = Matcher::compile(pattern, size_limit).map_err(|source| {
                    MinerError::InvalidPattern {
                        field: field.name.clone(),
                        pattern: pattern.pattern.clone(),
                        source,
                    }
                })?;
                matchers.push(matcher);
            }
            fields.push(FieldRule {
                name: field.name.clone(),
                kind: field.kind,
                matchers,
            });
        }

        let terminator =
            terminator_from_config(&config.extraction.block_terminator, size_limit)?;

        tracing::debug!(
            fields = fields.len(),
            terminator = terminator.name(),
            "compiled rule table"
        );

        Ok(Self {
            fields,
            identity_field: config.identity_field.clone(),
            credit_field: config.credit_field.clone(),
            terminator,
        })
    }

    /// Swap the block-field boundary heuristic without touching the rules
    pub fn with_terminator(mut self, terminator: Box<dyn BlockTerminator + Send + Sync>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    pub fn credit_field(&self) -> &str {
        &self.credit_field
    }

    pub fn terminator(&self) -> &dyn BlockTerminator {
        self.terminator.as_ref()
    }
}
