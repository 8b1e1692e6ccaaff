//! Typed values reported by sensors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single typed sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Whether both readings are the same. Unlike `==`, floats compare by
    /// [`f64::total_cmp`], so a NaN reading matches another NaN.
    #[must_use]
    pub fn same_reading(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            _ => self == other,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => v.fmt(f),
            Self::Int(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::String(v) => f.write_str(v),
            Self::Json(v) => v.fmt(f),
        }
    }
}
