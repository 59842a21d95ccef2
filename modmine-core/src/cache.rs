use crate::types::DocumentResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const MODMINE_VERSION: &str = "0.1.0";
    /// Bump when detection, extraction or normalization behavior changes
    pub const EXTRACTION_VERSION: &str = "1.0.0";
}

/// Result cache key (document text + config → records)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResultCacheKey {
    pub text_hash: String,
    pub config_hash: String,
    /// Record ids are derived from it, so it is part of the key
    pub source_name: String,
    pub modmine_version: String,
    pub extraction_version: String,
}

impl ResultCacheKey {
    pub fn new(text_hash: String, config_hash: String, source_name: &str) -> Self {
        Self {
            text_hash,
            config_hash,
            source_name: source_name.to_string(),
            modmine_version: versions::MODMINE_VERSION.to_string(),
            extraction_version: versions::EXTRACTION_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.text_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.source_name);
        hasher.update(&self.modmine_version);
        hasher.update(&self.extraction_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached document result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCacheValue {
    pub result: DocumentResult,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl ResultCacheValue {
    pub fn new(result: DocumentResult, processing_time_ms: u64) -> Self {
        Self {
            result,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::MODMINE_VERSION.to_string(),
        }
    }
}
