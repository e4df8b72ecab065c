//! Full AST evaluation against a single document.
//!
//! This is the verification half of query execution: after the planner reduces
//! the candidate set through the indexes, each candidate document is re-checked
//! here against the complete expression. Evaluation is total — a type mismatch
//! or an absent path makes the predicate false for this document, never an
//! error. The expression must already have passed [`Expr::validate`].

use std::cmp::Ordering;

use serde_json::Value;

use super::ast::{Expr, Literal};
use crate::{
    field::{FieldPath, Leaf, LeafKind, extract_leaves, resolve_values},
    index::geo::{self, GeoPoint},
};

/// Evaluate `expr` against one document.
pub fn matches(doc: &Value, expr: &Expr) -> bool {
    match expr {
        Expr::Eq(path, value, kind) => {
            with_literal(value, *kind, |lit| any_leaf(doc, path, |l| l == lit.leaf()))
        }
        Expr::Ne(path, value, kind) => with_literal(value, *kind, |lit| {
            let leaves = extract_leaves(doc, path);
            !leaves.is_empty() && !leaves.iter().any(|l| l == lit.leaf())
        }),
        Expr::Gt(path, value, kind) => ordered(doc, path, value, *kind, Ordering::is_gt),
        Expr::Lt(path, value, kind) => ordered(doc, path, value, *kind, Ordering::is_lt),
        Expr::Gte(path, value, kind) => ordered(doc, path, value, *kind, Ordering::is_ge),
        Expr::Lte(path, value, kind) => ordered(doc, path, value, *kind, Ordering::is_le),
        Expr::Includes(path, value, kind) => with_literal(value, *kind, |lit| {
            resolve_values(doc, path).iter().any(|v| match v {
                Value::Array(items) => items
                    .iter()
                    .any(|item| Leaf::from_value(item).as_ref() == Some(lit.leaf())),
                _ => false,
            })
        }),
        Expr::And(a, b) => matches(doc, a) && matches(doc, b),
        Expr::Or(a, b) => matches(doc, a) || matches(doc, b),
        Expr::Not(inner) => !matches(doc, inner),
        Expr::GeoWithinRadius {
            field,
            lat,
            lon,
            radius,
        } => {
            let Some(centre) = GeoPoint::new(*lat, *lon) else {
                return false;
            };
            points_at(doc, field)
                .into_iter()
                .any(|p| geo::haversine_m(centre, p) <= *radius)
        }
        Expr::GeoInBox {
            field,
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        } => points_at(doc, field)
            .into_iter()
            .any(|p| geo::box_contains(*min_lat, *min_lon, *max_lat, *max_lon, p)),
    }
}

/// Admit the literal and run the predicate; an inadmissible literal is false.
///
/// Validation happens before execution, so this path is unreachable for
/// admitted queries; evaluation stays total regardless.
fn with_literal(value: &Value, kind: LeafKind, pred: impl FnOnce(&Literal) -> bool) -> bool {
    match Literal::from_parts(value, kind) {
        Ok(lit) => pred(&lit),
        Err(_) => false,
    }
}

fn any_leaf(doc: &Value, path: &FieldPath, pred: impl Fn(&Leaf) -> bool) -> bool {
    extract_leaves(doc, path).iter().any(pred)
}

fn ordered(
    doc: &Value,
    path: &FieldPath,
    value: &Value,
    kind: LeafKind,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    with_literal(value, kind, |lit| {
        any_leaf(doc, path, |leaf| {
            leaf.kind() == lit.leaf().kind() && accept(leaf.cmp(lit.leaf()))
        })
    })
}

fn points_at(doc: &Value, field: &FieldPath) -> Vec<GeoPoint> {
    resolve_values(doc, field)
        .into_iter()
        .filter_map(GeoPoint::from_value)
        .collect()
}
