//! Index-backed candidate planning.
//!
//! The planner turns an expression into a sorted set of candidate keys using
//! only index probes and set algebra; it never scans document bodies. The
//! candidate set may over-approximate (geo cell covers admit near-misses), so
//! execution re-verifies every candidate against the full expression.
//!
//! Complements need the opposite guarantee: subtracting an over-approximation
//! could drop true matches that verification cannot resurrect. Leaf and range
//! probes are exact (the field index mirrors the documents), so `Not` over an
//! exact sub-plan complements it directly; `Not` over a geo-bearing sub-plan
//! widens to the full key universe and lets verification do the work.

use std::collections::BTreeSet;

use futures::future::BoxFuture;

use crate::{
    Result,
    index::{
        IndexReader,
        geo::{self, GeoPoint},
    },
    query::ast::{Expr, Literal},
};

/// Compute the candidate key set for an expression.
pub fn candidates<'a>(
    reader: &'a IndexReader<'a>,
    expr: &'a Expr,
) -> BoxFuture<'a, Result<BTreeSet<String>>> {
    Box::pin(async move {
        match expr {
            Expr::Eq(path, value, kind) | Expr::Includes(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                reader.keys_with_leaf(path, lit.leaf()).await
            }
            Expr::Ne(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                let universe = reader.keys_with_path(path).await?;
                let equal = reader.keys_with_leaf(path, lit.leaf()).await?;
                Ok(universe.difference(&equal).cloned().collect())
            }
            Expr::Gt(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                reader
                    .keys_in_range(path, Some((lit.leaf(), false)), None, kind.tag())
                    .await
            }
            Expr::Gte(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                reader
                    .keys_in_range(path, Some((lit.leaf(), true)), None, kind.tag())
                    .await
            }
            Expr::Lt(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                reader
                    .keys_in_range(path, None, Some((lit.leaf(), false)), kind.tag())
                    .await
            }
            Expr::Lte(path, value, kind) => {
                let lit = Literal::from_parts(value, *kind)?;
                reader
                    .keys_in_range(path, None, Some((lit.leaf(), true)), kind.tag())
                    .await
            }
            Expr::And(a, b) => {
                let left = candidates(reader, a).await?;
                let right = candidates(reader, b).await?;
                // Intersect by probing the smaller side into the larger.
                let (small, large) = if left.len() <= right.len() {
                    (left, right)
                } else {
                    (right, left)
                };
                Ok(small.into_iter().filter(|k| large.contains(k)).collect())
            }
            Expr::Or(a, b) => {
                let mut left = candidates(reader, a).await?;
                let right = candidates(reader, b).await?;
                left.extend(right);
                Ok(left)
            }
            Expr::Not(inner) => {
                let universe = reader.all_doc_keys().await?;
                if is_exact(inner) {
                    let excluded = candidates(reader, inner).await?;
                    Ok(universe.difference(&excluded).cloned().collect())
                } else {
                    Ok(universe)
                }
            }
            Expr::GeoWithinRadius {
                field,
                lat,
                lon,
                radius,
            } => {
                let Some(centre) = GeoPoint::new(*lat, *lon) else {
                    return Ok(BTreeSet::new());
                };
                let cover = geo::cover_radius(centre, *radius);
                reader.keys_in_cover(field, &cover).await
            }
            Expr::GeoInBox {
                field,
                min_lat,
                min_lon,
                max_lat,
                max_lon,
            } => {
                let cover = geo::cover_box(*min_lat, *min_lon, *max_lat, *max_lon);
                reader.keys_in_cover(field, &cover).await
            }
        }
    })
}

/// True when the sub-plan's candidate set equals its exact match set.
fn is_exact(expr: &Expr) -> bool {
    match expr {
        Expr::Eq(..)
        | Expr::Ne(..)
        | Expr::Gt(..)
        | Expr::Lt(..)
        | Expr::Gte(..)
        | Expr::Lte(..)
        | Expr::Includes(..) => true,
        Expr::And(a, b) | Expr::Or(a, b) => is_exact(a) && is_exact(b),
        Expr::Not(inner) => is_exact(inner),
        Expr::GeoWithinRadius { .. } | Expr::GeoInBox { .. } => false,
    }
}
