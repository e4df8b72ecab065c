//! In-memory backend with optional JSON file persistence.
//!
//! The in-memory backend keeps the whole keyspace in a `BTreeMap` guarded by an
//! `RwLock`. It is the default for tests and works for small ephemeral
//! deployments: when opened with a file path, every applied batch rewrites the
//! persistence file atomically (temp file + rename), so a crash leaves either
//! the previous or the new state on disk, never a torn one.

use std::{
    any::Any,
    collections::BTreeMap,
    ops::Bound,
    path::{Path, PathBuf},
    sync::RwLock,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Backend, BatchOp, WriteBatch, errors::StoreError};
use crate::Result;

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Serializable snapshot of the keyspace for persistence.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    /// File format version for compatibility checking
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

/// In-memory storage backend.
pub struct InMemory {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    persist_path: Option<PathBuf>,
}

impl InMemory {
    /// Create a new ephemeral backend with no persistence.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            persist_path: None,
        }
    }

    /// Open a persistent in-memory backend.
    ///
    /// Loads the state from `path` if the file exists; an absent file yields an
    /// empty store. Every subsequent mutation rewrites the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => {
                let snapshot: SerializableStore = serde_json::from_str(&json)
                    .map_err(|e| StoreError::DeserializationFailed { source: e })?;
                if snapshot.version != PERSISTENCE_VERSION {
                    return Err(StoreError::UnsupportedVersion {
                        found: snapshot.version,
                        expected: PERSISTENCE_VERSION,
                    }
                    .into());
                }
                snapshot.entries.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io { source: e }.into()),
        };
        Ok(Self {
            inner: RwLock::new(entries),
            persist_path: Some(path),
        })
    }

    /// Rewrite the persistence file from the current state, if persistence is on.
    ///
    /// The snapshot is cloned under the read lock, then written to a sibling
    /// temp file and renamed over the target.
    fn save(&self) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };

        let snapshot = {
            let inner = self.inner.read().unwrap();
            SerializableStore {
                version: PERSISTENCE_VERSION,
                entries: inner.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            }
        };

        let json = serde_json::to_string(&snapshot)
            .map_err(|e| StoreError::SerializationFailed { source: e })?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io { source: e })?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::Io { source: e })?;
        Ok(())
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InMemory {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            inner.insert(key.to_vec(), value.to_vec());
        }
        self.save()
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            inner.remove(key);
        }
        self.save()
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn scan_range(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.inner.read().unwrap();
        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Ok(inner
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            for op in batch.ops() {
                match op {
                    BatchOp::Put { key, value } => {
                        inner.insert(key.clone(), value.clone());
                    }
                    BatchOp::Delete { key } => {
                        inner.remove(key);
                    }
                }
            }
        }
        self.save()
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            inner.clear();
        }
        self.save()
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
