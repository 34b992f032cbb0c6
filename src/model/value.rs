//! Attribute value type carried by frames and edges.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Value of a node or edge attribute.
///
/// RT edges store their translation and Euler angles as 3-element
/// `FloatVector`s; the scalar variants hold whatever agents attach to frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    FloatVector(Vec<f64>),
}

impl Value {
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Value::FloatVector(v) => Some(v),
            _ => None,
        }
    }

    /// Read a 3-element float vector. Any other length yields `None`.
    pub fn as_dvec3(&self) -> Option<DVec3> {
        match self.as_floats()? {
            [x, y, z] => Some(DVec3::new(*x, *y, *z)),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::FloatVector(v) } }
impl From<DVec3> for Value { fn from(v: DVec3) -> Self { Value::FloatVector(v.to_array().to_vec()) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::FloatVector(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}
