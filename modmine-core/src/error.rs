//! Error types for the miner

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by configuration, rule compilation and text sources.
///
/// Field-level problems (absent values, malformed numbers) are never errors;
/// they surface as nulls and [`crate::types::Diagnostic`] entries instead.
#[derive(Error, Debug)]
pub enum MinerError {
    /// A pattern in the rule table failed to compile
    #[error("invalid pattern for field '{field}': {pattern}: {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rule table or detector settings are inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input document does not exist
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Input document exists but could not be decoded as text
    #[error("unreadable input {}: {reason}", .path.display())]
    UnreadableInput { path: PathBuf, reason: String },

    /// No registered text source handles this file type
    #[error("no text source supports {}", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type MinerResult<T> = std::result::Result<T, MinerError>;
