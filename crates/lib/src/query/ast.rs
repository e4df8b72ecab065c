//! The query AST and typed literals.
//!
//! `Expr` is the wire format: an externally tagged enum whose comparison
//! variants are `(path, literal, type)` tuples, so `{"Eq": ["a.b", true,
//! "Bool"]}` round-trips directly through serde. Literals stay as raw JSON
//! values until [`Expr::validate`] admits the query; validation is the only
//! place a type mismatch is an error. During evaluation a mismatched *document*
//! type is silently false, never a fault.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::QueryError;
use crate::field::{FieldPath, Leaf, LeafKind};

/// A boolean combination of comparison, membership, and geo predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Any leaf at the path equals the literal.
    Eq(FieldPath, Value, LeafKind),
    /// The path is present and no leaf equals the literal.
    Ne(FieldPath, Value, LeafKind),
    /// Any leaf at the path is strictly greater than the literal.
    Gt(FieldPath, Value, LeafKind),
    /// Any leaf at the path is strictly less than the literal.
    Lt(FieldPath, Value, LeafKind),
    /// Any leaf at the path is greater than or equal to the literal.
    Gte(FieldPath, Value, LeafKind),
    /// Any leaf at the path is less than or equal to the literal.
    Lte(FieldPath, Value, LeafKind),
    /// The value at the path is an array containing the literal.
    Includes(FieldPath, Value, LeafKind),
    /// Both sub-expressions hold.
    And(Box<Expr>, Box<Expr>),
    /// Either sub-expression holds.
    Or(Box<Expr>, Box<Expr>),
    /// The sub-expression does not hold.
    Not(Box<Expr>),
    /// A geo point at the field lies within `radius` metres of the centre.
    GeoWithinRadius {
        field: FieldPath,
        lat: f64,
        lon: f64,
        radius: f64,
    },
    /// A geo point at the field lies inside the axis-aligned box.
    GeoInBox {
        field: FieldPath,
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },
}

/// A validated, typed query literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    leaf: Leaf,
}

impl Literal {
    /// Admit a raw JSON literal under a declared comparison type.
    pub fn from_parts(value: &Value, kind: LeafKind) -> Result<Self, QueryError> {
        let leaf = match kind {
            LeafKind::Bool => value.as_bool().map(Leaf::Bool),
            LeafKind::Number => value.as_f64().map(Leaf::Number),
            LeafKind::String => value.as_str().map(|s| Leaf::Text(s.to_string())),
        };
        match leaf {
            Some(leaf) => Ok(Self { leaf }),
            None => Err(QueryError::LiteralMismatch {
                expected: kind.name().to_string(),
                found: json_type_name(value).to_string(),
            }),
        }
    }

    /// The typed leaf this literal compares against.
    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_lat(field: &str, value: f64) -> Result<(), QueryError> {
    if (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(QueryError::CoordinateOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

fn check_lon(field: &str, value: f64) -> Result<(), QueryError> {
    if (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(QueryError::CoordinateOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

impl Expr {
    /// Validate literals and coordinates throughout the expression.
    ///
    /// Called once at query admission so evaluation never faults.
    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Expr::Eq(_, value, kind) | Expr::Ne(_, value, kind) | Expr::Includes(_, value, kind) => {
                Literal::from_parts(value, *kind)?;
                Ok(())
            }
            Expr::Gt(_, value, kind)
            | Expr::Lt(_, value, kind)
            | Expr::Gte(_, value, kind)
            | Expr::Lte(_, value, kind) => {
                if *kind == LeafKind::Bool {
                    return Err(QueryError::UnorderableKind {
                        kind: kind.name().to_string(),
                    });
                }
                Literal::from_parts(value, *kind)?;
                Ok(())
            }
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.validate()?;
                b.validate()
            }
            Expr::Not(inner) => inner.validate(),
            Expr::GeoWithinRadius {
                lat, lon, radius, ..
            } => {
                check_lat("lat", *lat)?;
                check_lon("lon", *lon)?;
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(QueryError::InvalidRadius { value: *radius });
                }
                Ok(())
            }
            Expr::GeoInBox {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
                ..
            } => {
                check_lat("min_lat", *min_lat)?;
                check_lat("max_lat", *max_lat)?;
                check_lon("min_lon", *min_lon)?;
                check_lon("max_lon", *max_lon)?;
                Ok(())
            }
        }
    }
}
