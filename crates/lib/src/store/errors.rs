//! Error types for storage backends.
//!
//! This module defines structured error types for backend operations,
//! providing better error context and type safety compared to string-based errors.

use thiserror::Error;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient I/O failure. The operation had no effect and is safe to retry.
    #[error("Storage I/O error")]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Unrecoverable corruption detected in the underlying store.
    #[error("Storage corruption: {reason}")]
    Corruption {
        /// Description of the corruption detected
        reason: String,
    },

    /// Document serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Document deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// Persistence file was written by an incompatible version.
    #[error("Unsupported persistence version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u8,
        /// Version this build supports
        expected: u8,
    },
}

impl StoreError {
    /// Check if this error is a transient fault that is safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }

    /// Check if this error indicates unrecoverable corruption.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::Corruption { .. } | StoreError::UnsupportedVersion { .. }
        )
    }

    /// Check if this error is related to document encoding.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            StoreError::SerializationFailed { .. } | StoreError::DeserializationFailed { .. }
        )
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
