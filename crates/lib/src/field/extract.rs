//! Leaf extraction from JSON documents.
//!
//! Given a document and a [`FieldPath`], extraction returns the multiset of
//! typed scalar leaves reached: objects are descended by name, arrays traverse
//! element-wise with the remaining path, scalars terminate. An absent segment
//! yields an empty result, never an error. A leaf is tagged with its concrete
//! type at extraction time; the query layer compares leaves only against
//! literals of the matching type.

use std::cmp::Ordering;

use serde_json::Value;

use super::path::FieldPath;

/// The comparison type of an extracted leaf or query literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum LeafKind {
    /// Boolean leaves.
    Bool,
    /// Numeric leaves. Integer and floating JSON numbers unify here.
    Number,
    /// UTF-8 string leaves.
    String,
}

impl LeafKind {
    /// Single-byte tag used in field-index keys.
    pub fn tag(&self) -> u8 {
        match self {
            LeafKind::Bool => b'b',
            LeafKind::Number => b'n',
            LeafKind::String => b's',
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            LeafKind::Bool => "Bool",
            LeafKind::Number => "Number",
            LeafKind::String => "String",
        }
    }
}

/// A typed scalar extracted at a field path.
///
/// Only booleans, numbers, and strings participate in indexing and comparison;
/// nulls and nested containers terminate extraction without producing a leaf.
#[derive(Debug, Clone)]
pub enum Leaf {
    /// Boolean leaf.
    Bool(bool),
    /// Numeric leaf. JSON integers and doubles unify as `f64`.
    Number(f64),
    /// String leaf.
    Text(String),
}

impl Leaf {
    /// The comparison type of this leaf.
    pub fn kind(&self) -> LeafKind {
        match self {
            Leaf::Bool(_) => LeafKind::Bool,
            Leaf::Number(_) => LeafKind::Number,
            Leaf::Text(_) => LeafKind::String,
        }
    }

    /// Index-key encoding of the leaf value (order-preserving per kind).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Leaf::Bool(b) => vec![u8::from(*b)],
            Leaf::Number(n) => crate::store::keys::encode_f64(*n).to_vec(),
            Leaf::Text(s) => s.as_bytes().to_vec(),
        }
    }

    /// Build a leaf from a scalar JSON value. Nulls and containers return `None`.
    pub fn from_value(value: &Value) -> Option<Leaf> {
        match value {
            Value::Bool(b) => Some(Leaf::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Leaf::Number),
            Value::String(s) => Some(Leaf::Text(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for Leaf {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Leaf {}

impl PartialOrd for Leaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Leaf {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Leaf::Bool(a), Leaf::Bool(b)) => a.cmp(b),
            (Leaf::Number(a), Leaf::Number(b)) => a.total_cmp(b),
            (Leaf::Text(a), Leaf::Text(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

/// Extract every typed leaf reachable from `doc` along `path`.
///
/// Arrays encountered before the path is exhausted map the remaining path over
/// each element; a terminal array contributes each of its scalar elements.
pub fn extract_leaves(doc: &Value, path: &FieldPath) -> Vec<Leaf> {
    let segments: Vec<&str> = path.components().collect();
    let mut out = Vec::new();
    walk(doc, &segments, &mut |value| collect_scalars(value, &mut out));
    out
}

/// Resolve `path` against `doc`, returning references to every value reached.
///
/// Unlike [`extract_leaves`], terminal containers are returned as-is. This is
/// the entry point for membership tests, geo extraction, and projection.
pub fn resolve_values<'doc>(doc: &'doc Value, path: &FieldPath) -> Vec<&'doc Value> {
    let segments: Vec<&str> = path.components().collect();
    let mut out = Vec::new();
    walk(doc, &segments, &mut |value| out.push(value));
    out
}

/// Recursive descent shared by extraction and resolution.
///
/// Array fan-out keeps the full remaining segment list, so numeric segments
/// never index into arrays; they only ever select object fields.
fn walk<'doc>(value: &'doc Value, segments: &[&str], visit: &mut impl FnMut(&'doc Value)) {
    match segments.split_first() {
        None => visit(value),
        Some((segment, rest)) => match value {
            Value::Object(map) => {
                if let Some(child) = map.get(*segment) {
                    walk(child, rest, visit);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, segments, visit);
                }
            }
            _ => {}
        },
    }
}

/// Collect the scalar leaves of a terminal value, flattening arrays.
fn collect_scalars(value: &Value, out: &mut Vec<Leaf>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_scalars(item, out);
            }
        }
        other => {
            if let Some(leaf) = Leaf::from_value(other) {
                out.push(leaf);
            }
        }
    }
}
