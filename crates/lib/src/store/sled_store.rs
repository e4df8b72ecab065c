//! Durable backend on top of [`sled`].
//!
//! sled gives us the full store contract natively: a single sorted keyspace,
//! prefix and range iteration, atomic `apply_batch` commits, and automatic
//! log recovery on open. This backend is a thin adapter that maps errors into
//! [`StoreError`] and awaits an async flush after durability-sensitive calls.

use std::{any::Any, path::Path};

use async_trait::async_trait;

use super::{Backend, BatchOp, WriteBatch, errors::StoreError};
use crate::Result;

/// Storage backend persisting to a sled database directory.
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    /// Open or create the sled database at the given directory.
    ///
    /// Recovery from a previous crash happens inside `sled::open`; a batch that
    /// was not fully committed is rolled back by sled's log replay.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(map_sled_err)?;
        Ok(Self { db })
    }
}

fn map_sled_err(err: sled::Error) -> crate::Error {
    match err {
        sled::Error::Io(source) => StoreError::Io { source }.into(),
        sled::Error::Corruption { .. } => StoreError::Corruption {
            reason: "sled detected on-disk corruption".to_string(),
        }
        .into(),
        other => StoreError::Corruption {
            reason: other.to_string(),
        }
        .into(),
    }
}

#[async_trait]
impl Backend for SledBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self.db.get(key).map_err(map_sled_err)?;
        Ok(value.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.insert(key, value).map_err(map_sled_err)?;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        self.db.remove(key).map_err(map_sled_err)?;
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (k, v) = item.map_err(map_sled_err)?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    async fn scan_range(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let iter = match end {
            Some(end) => self.db.range(start..end),
            None => self.db.range(start..),
        };
        let mut out = Vec::new();
        for item in iter {
            let (k, v) = item.map_err(map_sled_err)?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.ops() {
            match op {
                BatchOp::Put { key, value } => sled_batch.insert(key.as_slice(), value.as_slice()),
                BatchOp::Delete { key } => sled_batch.remove(key.as_slice()),
            }
        }
        self.db.apply_batch(sled_batch).map_err(map_sled_err)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.db.clear().map_err(map_sled_err)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(map_sled_err)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
