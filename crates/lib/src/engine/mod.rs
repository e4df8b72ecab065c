//! The database engine.
//!
//! `Engine` is the single entry point the HTTP boundary calls into. It owns the
//! storage backend, the change hub, and the writer lock that serializes
//! mutations. Reads (point gets, scans, queries) run concurrently against the
//! backend's consistent view and never take the writer lock; writes serialize
//! through [`write::commit_locked`], which stages each transaction as one
//! atomic batch across the documents and every derived index.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result,
    events::{ChangeHub, Subscription},
    field::FieldPath,
    query::{self, Expr, Query},
    store::{Backend, InMemory, keys},
};

pub mod errors;
pub mod write;

// Re-export main types for easier access
pub use errors::EngineError;
pub use write::Mutation;

/// A keyed document, the unit of `batch_set`, `import`, and `export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: Value,
}

/// Database engine over a storage backend.
pub struct Engine {
    backend: Arc<dyn Backend>,
    hub: ChangeHub,
    writer: tokio::sync::Mutex<()>,
}

impl Engine {
    /// Create an engine over the given backend.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend: Arc::from(backend),
            hub: ChangeHub::new(),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Create an engine over an ephemeral in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemory::new()))
    }

    /// Open an engine over a sled database directory.
    #[cfg(feature = "sled-backend")]
    pub fn open_sled(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Box::new(crate::store::SledBackend::open(path)?)))
    }

    /// Get a reference to the backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    // === Reads ===

    /// Fetch the document at `key`.
    pub async fn get(&self, key: &str) -> Result<Value> {
        match self.backend.get(&keys::doc_key(key)).await? {
            Some(bytes) => write::decode_doc(&bytes),
            None => Err(EngineError::KeyNotFound {
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// Fetch the document at `key`, projected down to `fields`.
    ///
    /// An empty field list returns the full document.
    pub async fn get_partial(&self, key: &str, fields: &[FieldPath]) -> Result<Value> {
        let doc = self.get(key).await?;
        Ok(crate::field::project(&doc, fields))
    }

    /// Snapshot the entire mapping as a key-ordered list.
    pub async fn export(&self) -> Result<Vec<Record>> {
        let entries = self.backend.scan_prefix(keys::DOC_PREFIX).await?;
        let mut out = Vec::with_capacity(entries.len());
        for (storage_key, bytes) in entries {
            let Some(key) = keys::doc_key_user(&storage_key) else {
                continue;
            };
            out.push(Record {
                key,
                value: write::decode_doc(&bytes)?,
            });
        }
        Ok(out)
    }

    // === Queries ===

    /// Execute a structured query.
    pub async fn query(&self, query: &Query) -> Result<Vec<Value>> {
        query::execute(self.backend.as_ref(), query).await
    }

    /// Documents whose geo point at `field` lies within `radius` metres.
    pub async fn query_radius(
        &self,
        field: FieldPath,
        lat: f64,
        lon: f64,
        radius: f64,
    ) -> Result<Vec<Value>> {
        self.query(&Query::filter(Expr::GeoWithinRadius {
            field,
            lat,
            lon,
            radius,
        }))
        .await
    }

    /// Documents whose geo point at `field` lies inside the box.
    pub async fn query_box(
        &self,
        field: FieldPath,
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Vec<Value>> {
        self.query(&Query::filter(Expr::GeoInBox {
            field,
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }))
        .await
    }

    // === Writes ===

    /// Replace-or-insert one document.
    pub async fn set(&self, key: impl Into<String>, value: Value) -> Result<()> {
        self.transaction(vec![Mutation::Set {
            key: key.into(),
            value,
        }])
        .await
    }

    /// Remove one document. Removing an absent key succeeds.
    pub async fn delete(&self, key: impl Into<String>) -> Result<()> {
        self.transaction(vec![Mutation::Delete { key: key.into() }])
            .await
    }

    /// Apply many replace-or-inserts atomically.
    pub async fn batch_set(&self, items: Vec<Record>) -> Result<()> {
        self.transaction(
            items
                .into_iter()
                .map(|item| Mutation::Set {
                    key: item.key,
                    value: item.value,
                })
                .collect(),
        )
        .await
    }

    /// Bulk-upsert a list of documents atomically.
    pub async fn import(&self, items: Vec<Record>) -> Result<()> {
        self.batch_set(items).await
    }

    /// Apply a heterogeneous sequence of mutations atomically, in listed order.
    pub async fn transaction(&self, ops: Vec<Mutation>) -> Result<()> {
        let _guard = self.writer.lock().await;
        write::commit_locked(self.backend.as_ref(), &self.hub, ops).await?;
        Ok(())
    }

    /// Atomically delete every document whose key starts with `prefix`.
    ///
    /// Returns the number of documents deleted.
    pub async fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let entries = self.backend.scan_prefix(&keys::doc_key(prefix)).await?;
        let ops: Vec<Mutation> = entries
            .iter()
            .filter_map(|(storage_key, _)| keys::doc_key_user(storage_key))
            .map(|key| Mutation::Delete { key })
            .collect();

        let count = ops.len();
        write::commit_locked(self.backend.as_ref(), &self.hub, ops).await?;
        tracing::debug!(prefix, count, "prefix cleared");
        Ok(count)
    }

    /// Atomically clear the entire keyspace.
    ///
    /// Returns the number of documents that existed beforehand.
    pub async fn drop_database(&self) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let entries = self.backend.scan_prefix(keys::DOC_PREFIX).await?;
        let affected: Vec<String> = entries
            .iter()
            .filter_map(|(storage_key, _)| keys::doc_key_user(storage_key))
            .collect();
        let count = affected.len();

        self.backend.clear().await?;
        self.backend.flush().await?;

        tracing::debug!(count, "database dropped");
        self.hub.publish(&affected);
        Ok(count)
    }

    // === Change notifications ===

    /// Subscribe to changes of a single key.
    pub fn subscribe(&self, key: impl Into<String>) -> Subscription {
        self.hub.subscribe(key)
    }

    /// Subscribe to changes of every key.
    pub fn subscribe_all(&self) -> Subscription {
        self.hub.subscribe_all()
    }
}
