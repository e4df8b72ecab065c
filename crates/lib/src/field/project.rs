//! Partial-document projection.
//!
//! Projection rebuilds a document containing only the requested field paths,
//! with their nested structure preserved. Absent paths contribute nothing; an
//! empty path list means the full document.

use serde_json::{Map, Value};

use super::path::FieldPath;

/// Project `doc` down to the given paths.
pub fn project(doc: &Value, paths: &[FieldPath]) -> Value {
    if paths.is_empty() {
        return doc.clone();
    }

    let mut out = Value::Object(Map::new());
    for path in paths {
        let segments: Vec<&str> = path.components().collect();
        if let Some(fragment) = project_path(doc, &segments) {
            merge(&mut out, fragment);
        }
    }
    out
}

/// Build the nested fragment a single path selects, or `None` if absent.
///
/// Arrays mid-path project element-wise; elements where the remainder of the
/// path is absent are dropped from the projected array.
fn project_path(value: &Value, segments: &[&str]) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Object(map) => {
            let child = map.get(*segment)?;
            let inner = project_path(child, rest)?;
            let mut wrapper = Map::new();
            wrapper.insert((*segment).to_string(), inner);
            Some(Value::Object(wrapper))
        }
        Value::Array(items) => {
            let projected: Vec<Value> = items
                .iter()
                .filter_map(|item| project_path(item, segments))
                .collect();
            if projected.is_empty() {
                None
            } else {
                Some(Value::Array(projected))
            }
        }
        _ => None,
    }
}

/// Deep-merge `addition` into `target`.
///
/// Objects merge recursively, arrays merge element-wise by index, and any other
/// collision is resolved in favor of the addition.
fn merge(target: &mut Value, addition: Value) {
    match (target, addition) {
        (Value::Object(target_map), Value::Object(addition_map)) => {
            for (key, value) in addition_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target_items), Value::Array(addition_items)) => {
            for (i, value) in addition_items.into_iter().enumerate() {
                match target_items.get_mut(i) {
                    Some(existing) => merge(existing, value),
                    None => target_items.push(value),
                }
            }
        }
        (target, addition) => *target = addition,
    }
}
