//! Shared Value Vocabulary
//!
//! Literal values, parameter domains, and data definitions used by both
//! the workflow and the experiment model trees.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the synthetic entry node in task chains and control flows.
pub const START: &str = "START";

/// Name of the synthetic exit node in task chains and control flows.
pub const END: &str = "END";

/// A literal parameter or data value at the numeric/string/boolean level.
///
/// This is as far as the compiler types values: no richer type-checking is
/// performed on them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The declared shape of a space-level parameter.
///
/// In the serialized model this is untagged: an `enum` listing, a
/// `min`/`max`/`step` range, or a bare literal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParameterDomain {
    Enum(EnumDomain),
    Range(RangeDomain),
    Literal(LiteralValue),
}

/// An explicit enumeration of candidate values, in declaration order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnumDomain {
    #[serde(rename = "enum")]
    pub values: Vec<LiteralValue>,
}

/// An inclusive arithmetic range `min, min+step, ... <= max`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RangeDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterDomain {
    /// Convenience constructor for an enumeration domain.
    pub fn enumeration(values: Vec<LiteralValue>) -> Self {
        Self::Enum(EnumDomain { values })
    }

    /// Convenience constructor for a range domain.
    pub fn range(min: f64, max: f64, step: f64) -> Self {
        Self::Range(RangeDomain { min, max, step })
    }
}

/// A named data declaration, optionally carrying a literal initial value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DataDefinition {
    /// Creates a data declaration without a value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Creates a data declaration with a literal value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}
