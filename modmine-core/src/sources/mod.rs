//! Text sources
//!
//! Adapters that turn an input file into the single text buffer the engine
//! mines. PDF text extraction happens upstream; what arrives here is either
//! plain text or the XHTML dump a Tika-style extractor writes.
//!
//! ```text
//! file (.txt / .html / .xhtml)
//!     ↓
//! [TextSource]  read bytes, decode UTF-8, flatten markup
//!     ↓
//! document text
//!     ↓
//! [MiningEngine]
//! ```

pub mod plain;
pub mod xhtml;

pub use plain::PlainTextSource;
pub use xhtml::XhtmlTextSource;

use crate::error::{MinerError, MinerResult};
use std::path::Path;

pub trait TextSource {
    /// Turn decoded file content into document text
    fn markup_to_text(&self, markup: &str) -> String;

    /// Read a file and convert it. Missing files and bytes that are not
    /// UTF-8 are errors for this document only.
    fn read_text(&self, path: &Path) -> MinerResult<String> {
        if !path.exists() {
            return Err(MinerError::SourceNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|e| MinerError::UnreadableInput {
            path: path.to_path_buf(),
            reason: e.utf8_error().to_string(),
        })?;
        Ok(self.markup_to_text(&content))
    }

    fn name(&self) -> &str;

    fn supports_file_type(&self, path: &Path) -> bool;
}

/// Lowercased file extension, if any
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Picks the first registered source that supports a file
pub struct SourceRegistry {
    sources: Vec<Box<dyn TextSource + Send + Sync>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(vec![Box::new(XhtmlTextSource), Box::new(PlainTextSource)])
    }
}

impl SourceRegistry {
    pub fn new(sources: Vec<Box<dyn TextSource + Send + Sync>>) -> Self {
        Self { sources }
    }

    pub fn source_for(&self, path: &Path) -> MinerResult<&(dyn TextSource + Send + Sync)> {
        self.sources
            .iter()
            .find(|source| source.supports_file_type(path))
            .map(|source| source.as_ref())
            .ok_or_else(|| MinerError::UnsupportedSource(path.to_path_buf()))
    }

    pub fn read_text(&self, path: &Path) -> MinerResult<String> {
        let source = self.source_for(path)?;
        tracing::debug!(path = %path.display(), source = source.name(), "reading document text");
        source.read_text(path)
    }
}
