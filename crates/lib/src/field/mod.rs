//! Field paths, typed leaf extraction, and projection.
//!
//! Documents in Silt are plain JSON values. This module provides the pieces the
//! index and query layers need to look inside them: [`FieldPath`] for dotted
//! traversal specifications, [`extract_leaves`]/[`resolve_values`] for walking a
//! document along a path, and [`project`] for building a partial document from a
//! set of paths.

pub mod extract;
pub mod path;
pub mod project;

pub use extract::{Leaf, LeafKind, extract_leaves, resolve_values};
pub use path::FieldPath;
pub use project::project;
