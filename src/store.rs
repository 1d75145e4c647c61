//! Opaque key-value persistence for the profile and recipe cache records

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

pub const PROFILE_KEY: &str = "user_profile";
pub const RECIPE_CACHE_KEY: &str = "recipe_cache";

/// Storage seam. Values are serialized blobs; the store does not interpret them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: String) -> Result<()>;
}

/// One pretty-printed JSON file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &'static str {
        "json_file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("Failed to read {}", path.display())),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(format!("Failed to create data dir {}", self.dir.display()))?;

        // Temp file + rename: readers see either the old or the new record
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .context(format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .context(format!("Failed to replace {}", path.display()))?;

        debug!("Persisted record '{}' to {}", key, path.display());
        Ok(())
    }
}

/// Process-local store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(records.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        records.insert(key.to_string(), value);
        Ok(())
    }
}

/// Read and decode a record. `Ok(None)` when the key was never written.
pub async fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    let record = serde_json::from_str(&raw).context(format!("Corrupt '{}' record", key))?;
    Ok(Some(record))
}

pub async fn save_record<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, record: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(record).context(format!("Failed to encode '{}' record", key))?;
    store.put(key, raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProfileRecord, UserProfile};
    use chrono::{TimeZone, Utc};

    fn record() -> ProfileRecord {
        let mut record = ProfileRecord {
            user_profile: UserProfile {
                dietary_restrictions: vec!["vegan".to_string()],
                ..Default::default()
            },
            learned_preferences: Default::default(),
            last_updated: Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap(),
            interaction_count: 7,
        };
        record.learned_preferences.insert("time_quick".to_string(), 3.0);
        record
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryStore::new();
        assert!(load_record::<ProfileRecord>(&store, PROFILE_KEY).await.unwrap().is_none());

        save_record(&store, PROFILE_KEY, &record()).await.unwrap();
        let loaded: ProfileRecord = load_record(&store, PROFILE_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, record());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));

        assert!(store.get(PROFILE_KEY).await.unwrap().is_none());
        save_record(&store, PROFILE_KEY, &record()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("nested/user_profile.json")).unwrap();
        assert!(raw.contains("\"dietaryRestrictions\""));
        assert!(raw.contains("\"interactionCount\": 7"));

        let loaded: ProfileRecord = load_record(&store, PROFILE_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, record());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_error() {
        let store = MemoryStore::new();
        store.put(PROFILE_KEY, "{not json".to_string()).await.unwrap();
        assert!(load_record::<ProfileRecord>(&store, PROFILE_KEY).await.is_err());
    }
}
