//! Persistent key-value store.
//!
//! String-keyed storage that survives process restarts, backed by a
//! single JSON object file. The whole map is held in memory and every
//! mutation writes straight through to disk, key by key; there is no
//! multi-key transaction, so restore logic has to tolerate a partially
//! written credential set (see [`crate::auth`]).

pub mod keys;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// Store file name inside the caller-supplied data directory.
const STORE_FILE: &str = "store.json";

struct Inner {
    /// `None` for an in-memory store (tests, previews).
    path: Option<PathBuf>,
    map: Mutex<HashMap<String, String>>,
}

/// Async string-keyed store. Clone is cheap and shares the same map.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

impl Storage {
    /// Open the store under `dir`, creating the directory if needed.
    /// A missing or corrupt store file starts an empty map; it is never
    /// fatal, since this runs unattended at startup.
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        let path = dir.join(STORE_FILE);

        let map = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                path: Some(path),
                map: Mutex::new(map),
            }),
        })
    }

    /// A store with no backing file. Used by tests and previews.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                path: None,
                map: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.map.lock().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.map.lock().await;
        map.insert(key.to_string(), value.to_string());
        self.persist(&map).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.inner.map.lock().await;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&map).await
    }

    pub async fn clear(&self) -> Result<()> {
        let mut map = self.inner.map.lock().await;
        map.clear();
        self.persist(&map).await
    }

    /// Fetch a structured value. Falls back to treating the stored
    /// string as the value itself when JSON parsing fails, matching how
    /// plain strings are stored unquoted.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(_) => serde_json::from_value(serde_json::Value::String(raw)).ok(),
        }
    }

    /// Store a structured value as its JSON serialization.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).context("failed to serialize value for store")?;
        self.set(key, &raw).await
    }

    async fn persist(&self, map: &HashMap<String, String>) -> Result<()> {
        let Some(ref path) = self.inner.path else {
            return Ok(());
        };
        let contents =
            serde_json::to_string_pretty(map).context("failed to serialize store map")?;
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write store file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = Storage::in_memory();
        store.set("auth.accessToken", "t1").await.unwrap();
        assert_eq!(store.get("auth.accessToken").await.as_deref(), Some("t1"));

        store.remove("auth.accessToken").await.unwrap();
        assert_eq!(store.get("auth.accessToken").await, None);

        // Removing an absent key is a no-op
        store.remove("auth.accessToken").await.unwrap();
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Storage::open(dir.path()).await.unwrap();
            store.set("auth.anonymousId", "anon-1").await.unwrap();
        }
        let store = Storage::open(dir.path()).await.unwrap();
        assert_eq!(store.get("auth.anonymousId").await.as_deref(), Some("anon-1"));
    }

    #[tokio::test]
    async fn corrupt_store_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(STORE_FILE), "{not json")
            .await
            .unwrap();
        let store = Storage::open(dir.path()).await.unwrap();
        assert_eq!(store.get("anything").await, None);
    }

    #[tokio::test]
    async fn get_json_falls_back_to_raw_string() {
        let store = Storage::in_memory();
        // A bare (unquoted) string is not valid JSON but is still a value
        store.set("user.name", "ada").await.unwrap();
        assert_eq!(store.get_json::<String>("user.name").await.as_deref(), Some("ada"));

        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Profile {
            id: String,
        }
        let profile = Profile { id: "u1".into() };
        store.set_json("user.profile", &profile).await.unwrap();
        assert_eq!(store.get_json::<Profile>("user.profile").await, Some(profile));
    }
}
