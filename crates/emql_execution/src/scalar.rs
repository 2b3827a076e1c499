use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::errors::{ExecutionError, Result};

/// A single runtime value.
///
/// Integers are unbounded; crossing variants in an arithmetic or boolean
/// context is a runtime error raised at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Arbitrary-precision integer.
    Int(BigInt),
    /// Utf-8 encoded string.
    Str(String),
    /// True or false value.
    Bool(bool),
}

impl Value {
    /// Name of the variant, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn try_as_int(&self) -> Result<&BigInt> {
        match self {
            Value::Int(i) => Ok(i),
            other => Err(ExecutionError::TypeMismatch {
                expected: "int",
                value: other.to_string(),
            }),
        }
    }

    pub fn try_as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(ExecutionError::TypeMismatch {
                expected: "string",
                value: other.to_string(),
            }),
        }
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ExecutionError::TypeMismatch {
                expected: "bool",
                value: other.to_string(),
            }),
        }
    }

    pub fn try_into_int(self) -> Result<BigInt> {
        match self {
            Value::Int(i) => Ok(i),
            other => Err(ExecutionError::TypeMismatch {
                expected: "int",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}
