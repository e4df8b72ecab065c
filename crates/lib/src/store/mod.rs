//! Storage backends for Silt.
//!
//! This module provides the core `Backend` trait and the backend implementations
//! that ship with Silt (in-memory and sled).
//!
//! The `Backend` trait defines a single sorted byte keyspace with point access,
//! prefix and range iteration, and atomic multi-key batch commits. The engine
//! partitions the keyspace with reserved prefixes (see [`keys`]): documents under
//! `d/`, field-index entries under `i/`, and geo-index entries under `g/`. Because
//! every derived index lives in the same keyspace as the documents, committing one
//! [`WriteBatch`] per transaction is all that is needed to keep them consistent.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;

pub mod errors;
pub mod keys;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled_store;

// Re-export main types for easier access
pub use errors::StoreError;
pub use memory::InMemory;
#[cfg(feature = "sled-backend")]
pub use sled_store::SledBackend;

/// A single staged operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or replace the value at a key.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove the key if present.
    Delete { key: Vec<u8> },
}

/// An ordered set of writes committed as one atomic unit.
///
/// Operations are applied in insertion order, so a later operation on the same
/// key overrides an earlier one within the same batch. A batch is either fully
/// visible after [`Backend::apply`] returns, or not at all; no partial batch
/// survives a crash.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create a new empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert-or-replace.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    /// The staged operations, in application order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the batch has no staged operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Backend trait abstracting the byte-keyspace storage underneath Silt.
///
/// The keyspace is a single lexicographically sorted map from byte keys to byte
/// values. Implementations must recover automatically on open: after a crash the
/// visible state equals the state after some prefix of applied batches.
///
/// All backend implementations must be `Send` and `Sync` to allow sharing across
/// threads, and implement `Any` to allow for downcasting if needed.
#[async_trait]
pub trait Backend: Send + Sync + Any {
    /// Retrieve the value stored at `key`, or `None` if absent.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or replace a single key outside of any batch.
    ///
    /// Engine writes always go through [`Backend::apply`]; this is used by
    /// maintenance paths and tests.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a single key outside of any batch. Removing an absent key succeeds.
    async fn delete(&self, key: &[u8]) -> Result<()>;

    /// Scan all entries whose key starts with `prefix`, in ascending key order.
    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Scan entries with `start <= key < end`, in ascending key order.
    ///
    /// An `end` of `None` scans to the end of the keyspace.
    async fn scan_range(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Atomically apply a batch of writes.
    ///
    /// Either every staged operation becomes visible or none does, both to
    /// concurrent readers and across restarts.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;

    /// Remove every entry in the keyspace.
    async fn clear(&self) -> Result<()>;

    /// Ensure previously applied writes are durable on disk.
    async fn flush(&self) -> Result<()>;

    /// Returns a reference to the backend instance as a dynamic `Any` type.
    ///
    /// This allows for downcasting to a concrete backend implementation if
    /// necessary. Use with caution.
    fn as_any(&self) -> &dyn Any;
}
