//! The transactional write path.
//!
//! Every mutation funnels through [`commit_locked`], which the engine calls
//! with the writer lock held. A commit folds its operations per key in listed
//! order, reads the prior documents, diffs the derived index entries, and
//! stages everything — document writes and index maintenance — into a single
//! atomic batch. Change events are published only after the batch is durable;
//! a failure anywhere before that leaves zero visible effect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result,
    index::stage_index_diff,
    store::{Backend, StoreError, WriteBatch, keys},
};

/// One operation inside a transaction.
///
/// The serde shape is the wire format of the `/transaction` endpoint:
/// `{"type": "set", "key": ..., "value": ...}` or
/// `{"type": "delete", "key": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mutation {
    /// Replace-or-insert a document.
    Set { key: String, value: Value },
    /// Remove a document; removing an absent key succeeds.
    Delete { key: String },
}

impl Mutation {
    /// The key this mutation addresses.
    pub fn key(&self) -> &str {
        match self {
            Mutation::Set { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// Decode a stored document body.
pub(crate) fn decode_doc(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::DeserializationFailed { source: e }.into())
}

/// Encode a document body for storage.
pub(crate) fn encode_doc(doc: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(doc).map_err(|e| StoreError::SerializationFailed { source: e }.into())
}

/// Apply a transaction. The caller must hold the writer lock.
///
/// Returns the affected keys in key order, already published to `hub`.
pub(crate) async fn commit_locked(
    backend: &dyn Backend,
    hub: &crate::events::ChangeHub,
    ops: Vec<Mutation>,
) -> Result<Vec<String>> {
    if ops.is_empty() {
        return Ok(Vec::new());
    }

    // Fold per key: the last operation on a key inside one transaction wins.
    // BTreeMap keeps the affected set in key order for event publication.
    let mut outcomes: BTreeMap<String, Option<Value>> = BTreeMap::new();
    for op in ops {
        match op {
            Mutation::Set { key, value } => {
                outcomes.insert(key, Some(value));
            }
            Mutation::Delete { key } => {
                outcomes.insert(key, None);
            }
        }
    }

    let mut batch = WriteBatch::new();
    for (key, new_doc) in &outcomes {
        let storage_key = keys::doc_key(key);
        let old_doc = match backend.get(&storage_key).await? {
            Some(bytes) => Some(decode_doc(&bytes)?),
            None => None,
        };

        match new_doc {
            Some(doc) => batch.put(storage_key, encode_doc(doc)?),
            None => {
                if old_doc.is_none() {
                    // Delete of an absent key: nothing to stage for this key.
                    continue;
                }
                batch.delete(storage_key);
            }
        }

        stage_index_diff(&mut batch, key, old_doc.as_ref(), new_doc.as_ref());
    }

    if !batch.is_empty() {
        backend.apply(batch).await?;
        backend.flush().await?;
    }

    let affected: Vec<String> = outcomes.into_keys().collect();
    tracing::debug!(keys = affected.len(), "transaction committed");
    hub.publish(&affected);
    Ok(affected)
}
