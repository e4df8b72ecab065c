//! Query-specific errors.
//!
//! Everything in here classifies as a malformed request at the boundary: the
//! query never ran, and nothing was read or written.

use thiserror::Error;

/// Errors raised while admitting a query.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum QueryError {
    /// A literal's JSON value does not match its declared comparison type.
    #[error("Literal tagged {expected} but carries a {found} value")]
    LiteralMismatch {
        /// The declared type tag
        expected: String,
        /// The JSON type actually found
        found: String,
    },

    /// Order comparisons are only defined for numbers and strings.
    #[error("Range comparison is not defined for {kind} literals")]
    UnorderableKind {
        /// The offending type tag
        kind: String,
    },

    /// A latitude or longitude is outside its valid range.
    #[error("Coordinate {field}={value} is out of range")]
    CoordinateOutOfRange {
        /// Which coordinate was rejected
        field: String,
        /// The rejected value
        value: f64,
    },

    /// A radius must be a finite, non-negative number of metres.
    #[error("Invalid radius: {value}")]
    InvalidRadius {
        /// The rejected value
        value: f64,
    },
}

impl QueryError {
    /// Check if this error should map to a malformed-request response.
    pub fn is_validation_error(&self) -> bool {
        true
    }
}

// Conversion from QueryError to the main Error type
impl From<QueryError> for crate::Error {
    fn from(err: QueryError) -> Self {
        crate::Error::Query(err)
    }
}
