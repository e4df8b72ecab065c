//! Engine-specific errors.

use thiserror::Error;

/// Errors raised by engine operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// Point lookup on an absent key.
    #[error("Key not found: {key}")]
    KeyNotFound {
        /// The key that was not found
        key: String,
    },
}

impl EngineError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::KeyNotFound { .. })
    }
}

// Conversion from EngineError to the main Error type
impl From<EngineError> for crate::Error {
    fn from(err: EngineError) -> Self {
        crate::Error::Engine(err)
    }
}
