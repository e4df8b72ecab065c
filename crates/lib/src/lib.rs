//!
//! Silt: an embedded JSON document database with live queries.
//! This library provides the storage engine, query engine, and HTTP boundary
//! for running a single-node Silt server.
//!
//! ## Core Concepts
//!
//! Silt is built around several key components:
//!
//! * **Backend (`store::Backend`)**: A pluggable byte-keyspace storage layer with
//!   prefix iteration and atomic batch commits. Documents and every derived index
//!   live in the same keyspace, so index consistency is inherited from batch atomicity.
//! * **Documents**: Arbitrary JSON values addressed by a UTF-8 key. Object field
//!   order is preserved on retrieval.
//! * **Field paths (`field::FieldPath`)**: Dotted paths (`a.b.c`) resolved against a
//!   document, descending objects by name and fanning out over arrays.
//! * **Indexes (`index`)**: A field index mapping (path, typed leaf) pairs back to
//!   document keys, and a geo index mapping (path, grid cell) pairs back to keys.
//!   Both are maintained in lock-step with every committed write.
//! * **Queries (`query::Expr`)**: A boolean AST of comparison, membership, and geo
//!   predicates, planned against the indexes and verified against the documents.
//! * **Engine (`engine::Engine`)**: The single entry point owning the backend, the
//!   writer lock, and the change hub. All HTTP handlers call into it.
//! * **Change hub (`events::ChangeHub`)**: Per-key subscriber registry delivering
//!   commit-ordered change events to long-lived streams.

pub mod engine;
pub mod events;
pub mod field;
pub mod index;
pub mod query;
pub mod server;
pub mod store;

/// Re-export fundamental types for easier access.
pub use engine::Engine;
pub use events::ChangeHub;
pub use field::FieldPath;
pub use query::Expr;
pub use store::Backend;

/// Result type used throughout the Silt library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Common error type for the Silt library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured query errors from the query module
    #[error(transparent)]
    Query(query::QueryError),

    /// Structured engine errors from the engine module
    #[error(transparent)]
    Engine(engine::EngineError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::Query(_) => "query",
            Error::Engine(_) => "engine",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a malformed request (bad AST, bad literal,
    /// out-of-range coordinates).
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Query(query_err) => query_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is a transient storage fault that is safe to retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Store(store_err) => store_err.is_transient(),
            _ => false,
        }
    }

    /// Check if this error indicates unrecoverable storage corruption.
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_corruption(),
            _ => false,
        }
    }

    /// Check if this error is storage-related.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
