// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use std::collections::HashMap;
use thiserror::Error;

/// A dynamic value that can hold any encodable shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Scalars
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(i64),
    F32(f32),
    F64(f64),

    // Variable size
    String(String),
    /// Bulk list<u8>, produced by byte-string codecs.
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Entries in write order.
    Map(Vec<(Value, Value)>),
    Optional(Option<Box<Value>>),

    /// Record or inline composite, keyed by field name.
    Record(HashMap<String, Value>),
}

/// Conversion errors between [`Value`] and typed Rust values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("{value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    #[error("record `{record}` has no field `{field}`")]
    MissingField { record: String, field: String },
}

impl ValueError {
    pub fn mismatch(expected: impl Into<String>, got: &Value) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.kind().to_string(),
        }
    }
}

impl Value {
    /// Short name of this value's shape, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::Usize(_) => "usize",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::Isize(_) => "isize",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Optional(_) => "optional",
            Self::Record(_) => "record",
        }
    }

    /// Build a record from `(name, value)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn some(value: Value) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Self::Optional(None)
    }

    /// Get a record field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Consume into the field map of a record.
    pub fn into_record(self) -> Result<HashMap<String, Value>, ValueError> {
        match self {
            Self::Record(fields) => Ok(fields),
            other => Err(ValueError::mismatch("record", &other)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) | Self::Isize(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_access() {
        let value = Value::record([("id", Value::U32(7)), ("name", Value::from("x"))]);
        assert_eq!(value.field("id").and_then(Value::as_u32), Some(7));
        assert_eq!(value.field("name").and_then(Value::as_str), Some("x"));
        assert!(value.field("missing").is_none());
    }

    #[test]
    fn test_into_record_mismatch() {
        let err = Value::U8(1).into_record().expect_err("not a record");
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: "record".into(),
                got: "u8".into()
            }
        );
    }

    #[test]
    fn test_map_lookup() {
        let map = Value::Map(vec![
            (Value::I32(1), Value::from("a")),
            (Value::I32(2), Value::from("b")),
        ]);
        assert_eq!(map.map_get(&Value::I32(2)), Some(&Value::from("b")));
        assert_eq!(map.map_get(&Value::I32(3)), None);
    }
}
