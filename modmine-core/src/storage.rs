use crate::cache::{ResultCacheKey, ResultCacheValue};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Storage abstraction for caching mining results
pub trait ResultStorage {
    fn get_result(&self, cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>>;
    fn store_result(&self, cache_key: &ResultCacheKey, cache_value: &ResultCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        fs::create_dir_all(format!("{cache_dir}/results"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn result_path(&self, cache_key: &ResultCacheKey) -> String {
        format!("{}/results/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl ResultStorage for FileStorage {
    fn get_result(&self, cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>> {
        let path = self.result_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: ResultCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached ResultCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_result(&self, cache_key: &ResultCacheKey, cache_value: &ResultCacheValue) -> Result<()> {
        let path = self.result_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize ResultCacheValue: {}", e))?;
        // Write then rename so concurrent writers of one key never interleave
        let temp_path = format!(
            "{path}.{}.{}.tmp",
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        fs::write(&temp_path, json_str)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            fs::remove_file(&temp_path).ok();
            return Err(e.into());
        }
        Ok(())
    }
}

/// Hash of the full document text
pub fn calculate_text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (part of the result cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage implementation that disables all caching
#[derive(Default)]
pub struct NoOpStorage;

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ResultStorage for NoOpStorage {
    fn get_result(&self, _cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_result(&self, _cache_key: &ResultCacheKey, _cache_value: &ResultCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinerConfig;
    use crate::types::{DocumentResult, ExtractionStatistics};

    #[test]
    fn test_text_hash_consistency() {
        let text = "Modul: Analysis\nECTS: 6";
        assert_eq!(calculate_text_hash(text), calculate_text_hash(text));
        assert_ne!(calculate_text_hash(text), calculate_text_hash("Modul: Analysis\nECTS: 7"));
    }

    #[test]
    fn test_config_hash_tracks_changes() {
        let config = MinerConfig::default();
        let mut changed = MinerConfig::default();
        changed.detection.proximity_window = 300;
        assert_eq!(
            calculate_config_hash(&config).unwrap(),
            calculate_config_hash(&MinerConfig::default()).unwrap()
        );
        assert_ne!(
            calculate_config_hash(&config).unwrap(),
            calculate_config_hash(&changed).unwrap()
        );
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = std::env::temp_dir().join("modmine_test_cache_storage");
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();

        let key = ResultCacheKey::new(calculate_text_hash("x"), "cfg".into(), "x.txt");
        assert!(storage.get_result(&key).unwrap().is_none());

        let result = DocumentResult {
            modules: Vec::new(),
            statistics: ExtractionStatistics {
                spans_examined: 2,
                spans_rejected: 2,
                ..Default::default()
            },
            diagnostics: Vec::new(),
        };
        storage.store_result(&key, &ResultCacheValue::new(result, 12)).unwrap();
        let cached = storage.get_result(&key).unwrap().unwrap();
        assert_eq!(cached.result.statistics.spans_rejected, 2);
        assert_eq!(cached.processing_time_ms, 12);

        // Clean up
        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_concurrent_stores_of_one_key_stay_readable() {
        let temp_dir = std::env::temp_dir().join("modmine_test_cache_concurrent");
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();
        let key = ResultCacheKey::new(calculate_text_hash("dup"), "cfg".into(), "dup.txt");

        std::thread::scope(|scope| {
            for ms in 0..8 {
                let (storage, key) = (&storage, &key);
                scope.spawn(move || {
                    let result = DocumentResult {
                        modules: Vec::new(),
                        statistics: ExtractionStatistics::default(),
                        diagnostics: Vec::new(),
                    };
                    storage.store_result(key, &ResultCacheValue::new(result, ms)).unwrap();
                });
            }
        });

        let cached = storage.get_result(&key).unwrap().unwrap();
        assert!(cached.processing_time_ms < 8);
        let leftovers = std::fs::read_dir(temp_dir.join("results"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_noop_storage_always_misses() {
        let storage = NoOpStorage::new();
        let key = ResultCacheKey::new("t".into(), "c".into(), "s");
        let value = ResultCacheValue::new(
            DocumentResult {
                modules: Vec::new(),
                statistics: ExtractionStatistics::default(),
                diagnostics: Vec::new(),
            },
            0,
        );
        storage.store_result(&key, &value).unwrap();
        assert!(storage.get_result(&key).unwrap().is_none());
    }
}
