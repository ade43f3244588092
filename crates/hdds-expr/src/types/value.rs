// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::eval::Closure;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A dynamic value that can hold any catalog type.
///
/// Struct values are plain field maps, so a type synthesized on the receiving
/// side needs no generated code: its instances are just `Struct` values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Primitives
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Char(char),
    String(String),

    // Composites
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>), // insertion ordered key/value pairs
    Struct(HashMap<String, Value>),

    // Special
    Function(Closure), // a lambda evaluated as an argument
    Null,
}

impl Value {
    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64 (accepts i32).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64 (accepts any numeric value).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I32(v) => Some(f64::from(*v)),
            #[allow(clippy::cast_precision_loss)]
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a callable.
    pub fn as_function(&self) -> Option<&Closure> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Try to get struct field.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.loosely_equals(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short name of the value's variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
            Self::Function(_) => "function",
            Self::Null => "null",
        }
    }

    /// Equality with numeric promotion (`I32(1) == I64(1) == F64(1.0)`).
    ///
    /// Doubles compare exactly under IEEE 754: `NaN` equals nothing and
    /// infinities equal themselves.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::F64(_), _) | (_, Self::F64(_)) => match (self.as_f64(), other.as_f64()) {
                #[allow(clippy::float_cmp)]
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (Self::I32(_) | Self::I64(_), Self::I32(_) | Self::I64(_)) => {
                self.as_i64() == other.as_i64()
            }
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            _ => self == other,
        }
    }

    /// Ordering for numbers (with promotion), strings and chars.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Char(a), Self::Char(b)) => Some(a.cmp(b)),
            (Self::I32(_) | Self::I64(_), Self::I32(_) | Self::I64(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}
