//! Query planning and execution.
//!
//! A [`Query`] couples a filter expression with projection and pagination.
//! Execution runs in three phases: plan candidate keys through the indexes,
//! re-verify each candidate document against the full expression, then apply
//! offset/limit over the key-ordered matches and project the survivors.

use serde_json::Value;

use crate::{
    Result,
    field::{self, FieldPath},
    index::IndexReader,
    store::{Backend, StoreError, keys},
};

pub mod ast;
pub mod errors;
pub mod eval;
pub mod plan;

// Re-export main types for easier access
pub use ast::{Expr, Literal};
pub use errors::QueryError;
pub use eval::matches;

/// A complete query: filter, projection, and pagination.
#[derive(Debug, Clone)]
pub struct Query {
    /// The filter expression.
    pub filter: Expr,
    /// Paths to project; empty means the full document.
    pub projection: Vec<FieldPath>,
    /// Maximum number of results, applied after `offset`.
    pub limit: Option<usize>,
    /// Number of verified matches to skip.
    pub offset: usize,
}

impl Query {
    /// A query returning full documents with no pagination.
    pub fn filter(filter: Expr) -> Self {
        Self {
            filter,
            projection: Vec::new(),
            limit: None,
            offset: 0,
        }
    }
}

/// Execute a query against a backend.
///
/// Results are ordered by document key. The expression is validated before any
/// probe runs, so a malformed query reads nothing.
pub async fn execute(backend: &dyn Backend, query: &Query) -> Result<Vec<Value>> {
    query.filter.validate()?;

    let reader = IndexReader::new(backend);
    let candidate_keys = plan::candidates(&reader, &query.filter).await?;
    tracing::debug!(candidates = candidate_keys.len(), "query planned");

    let mut verified = Vec::new();
    for key in candidate_keys {
        let Some(bytes) = backend.get(&keys::doc_key(&key)).await? else {
            // Candidate vanished between the probe and the fetch; skip it.
            continue;
        };
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::DeserializationFailed { source: e })?;
        if eval::matches(&doc, &query.filter) {
            verified.push(doc);
        }
    }

    let page: Vec<Value> = match query.limit {
        Some(limit) => verified.into_iter().skip(query.offset).take(limit).collect(),
        None => verified.into_iter().skip(query.offset).collect(),
    };

    Ok(page
        .into_iter()
        .map(|doc| field::project(&doc, &query.projection))
        .collect())
}
