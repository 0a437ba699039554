// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolved per-field codecs.
//!
//! A [`Codec`] is what a strategy hands back once it has accepted a field:
//! a closed set of data shapes plus an escape hatch for custom encoders.
//! The record writer and reader interpret it; nothing here touches a
//! stream.

mod custom;

pub use custom::{ByteStringCodec, CustomCodec};

use std::fmt;
use std::sync::Arc;

use crate::config::REFERENCE_SIZE;
use crate::schema::{SchemaId, SchemaSet};
use crate::types::{ScalarKind, TypeTag};
use crate::value::Value;

/// Field codec chosen at derivation time.
#[derive(Clone)]
pub enum Codec {
    Scalar(ScalarKind),
    String,
    List(Box<Codec>),
    Map(Box<Codec>, Box<Codec>),
    Optional(Box<Codec>),
    /// Nested record, through the schema index + sized block protocol.
    Record(SchemaId),
    /// Fixed-size composite embedded by value.
    Inline(Arc<InlineLayout>),
    Custom(Arc<dyn CustomCodec>),
}

/// Field layout of an inline composite.
///
/// Slots are contiguous and laid out like a record header: fixed-size
/// fields hold their value, the others a 4-byte reference (local to the
/// enclosing record block) to a payload written after the composite.
#[derive(Debug, Clone)]
pub struct InlineLayout {
    pub type_name: String,
    pub fields: Vec<InlineField>,
    pub size: u32,
    /// Whether a record header stores the composite itself or a reference.
    pub by_value: bool,
}

#[derive(Debug, Clone)]
pub struct InlineField {
    pub name: String,
    pub offset: u32,
    pub codec: Codec,
}

impl InlineField {
    /// True if the value sits in the composite's own slot.
    pub fn in_slot(&self) -> bool {
        self.codec.in_header()
    }
}

impl Codec {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Scalar(kind) => kind.tag(),
            Self::String => TypeTag::String,
            Self::List(_) => TypeTag::List,
            Self::Map(..) => TypeTag::Map,
            Self::Optional(_) => TypeTag::Optional,
            Self::Record(_) => TypeTag::Record,
            Self::Inline(_) => TypeTag::Inline,
            Self::Custom(custom) => custom.type_tag(),
        }
    }

    /// Payload size for fixed-size codecs, reference size otherwise.
    pub fn wire_size(&self) -> u32 {
        match self {
            Self::Scalar(kind) => kind.size(),
            Self::Inline(layout) => layout.size,
            Self::Custom(custom) => custom.wire_size(),
            _ => REFERENCE_SIZE,
        }
    }

    pub fn is_variable_size(&self) -> bool {
        match self {
            Self::Scalar(_) | Self::Inline(_) => false,
            Self::Custom(custom) => custom.is_variable_size(),
            _ => true,
        }
    }

    /// False when the header slot must hold a reference even though the
    /// payload could be sized statically.
    pub fn stores_by_value(&self) -> bool {
        match self {
            Self::Record(_) => false,
            Self::Inline(layout) => layout.by_value,
            Self::Custom(custom) => custom.stores_by_value(),
            _ => true,
        }
    }

    /// True if the value sits directly in its header slot.
    pub fn in_header(&self) -> bool {
        !self.is_variable_size() && self.stores_by_value()
    }

    /// Bytes taken in the fixed header.
    pub fn header_footprint(&self) -> u32 {
        if self.in_header() {
            self.wire_size()
        } else {
            REFERENCE_SIZE
        }
    }

    /// Zero value of this codec's shape.
    pub fn zero_value(&self, schemas: &SchemaSet) -> Value {
        self.zero_value_guarded(schemas, &mut Vec::new())
    }

    fn zero_value_guarded(&self, schemas: &SchemaSet, visiting: &mut Vec<SchemaId>) -> Value {
        match self {
            Self::Scalar(kind) => zero_scalar(*kind),
            Self::String => Value::String(String::new()),
            Self::List(_) => Value::List(Vec::new()),
            Self::Map(..) => Value::Map(Vec::new()),
            Self::Optional(_) => Value::none(),
            Self::Record(id) => {
                let Some(schema) = schemas.get(*id) else {
                    return Value::Record(Default::default());
                };
                if visiting.contains(id) {
                    return Value::Record(Default::default());
                }
                visiting.push(*id);
                let fields = schema
                    .fields
                    .iter()
                    .map(|f| {
                        let value = match &f.default {
                            Some(default) => default.clone(),
                            None => f.codec.zero_value_guarded(schemas, visiting),
                        };
                        (f.source_name.clone(), value)
                    })
                    .collect();
                visiting.pop();
                Value::Record(fields)
            }
            Self::Inline(layout) => Value::Record(
                layout
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), f.codec.zero_value_guarded(schemas, visiting)))
                    .collect(),
            ),
            Self::Custom(custom) => custom.zero_value(),
        }
    }

    /// Parse a default literal into a value of this codec's shape.
    pub fn parse_default(&self, literal: &str) -> Option<Value> {
        match self {
            Self::Scalar(kind) => parse_scalar(*kind, literal.trim()),
            Self::String => Some(Value::String(literal.to_string())),
            Self::Optional(inner) => match literal.trim() {
                "none" | "null" => Some(Value::none()),
                _ => inner.parse_default(literal).map(Value::some),
            },
            Self::Custom(custom) => custom.parse_default(literal),
            _ => None,
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "Scalar({:?})", kind),
            Self::String => f.write_str("String"),
            Self::List(elem) => f.debug_tuple("List").field(elem).finish(),
            Self::Map(k, v) => f.debug_tuple("Map").field(k).field(v).finish(),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Record(id) => write!(f, "Record({})", id),
            Self::Inline(layout) => write!(f, "Inline({})", layout.type_name),
            Self::Custom(custom) => write!(f, "Custom({})", custom.name()),
        }
    }
}

fn zero_scalar(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::U8 => Value::U8(0),
        ScalarKind::U16 => Value::U16(0),
        ScalarKind::U32 => Value::U32(0),
        ScalarKind::U64 => Value::U64(0),
        ScalarKind::Usize => Value::Usize(0),
        ScalarKind::I8 => Value::I8(0),
        ScalarKind::I16 => Value::I16(0),
        ScalarKind::I32 => Value::I32(0),
        ScalarKind::I64 => Value::I64(0),
        ScalarKind::Isize => Value::Isize(0),
        ScalarKind::F32 => Value::F32(0.0),
        ScalarKind::F64 => Value::F64(0.0),
        ScalarKind::Bool => Value::Bool(false),
    }
}

fn parse_scalar(kind: ScalarKind, s: &str) -> Option<Value> {
    Some(match kind {
        ScalarKind::U8 => Value::U8(s.parse().ok()?),
        ScalarKind::U16 => Value::U16(s.parse().ok()?),
        ScalarKind::U32 => Value::U32(s.parse().ok()?),
        ScalarKind::U64 => Value::U64(s.parse().ok()?),
        ScalarKind::Usize => Value::Usize(s.parse().ok()?),
        ScalarKind::I8 => Value::I8(s.parse().ok()?),
        ScalarKind::I16 => Value::I16(s.parse().ok()?),
        ScalarKind::I32 => Value::I32(s.parse().ok()?),
        ScalarKind::I64 => Value::I64(s.parse().ok()?),
        ScalarKind::Isize => Value::Isize(s.parse().ok()?),
        ScalarKind::F32 => Value::F32(s.parse().ok()?),
        ScalarKind::F64 => Value::F64(s.parse().ok()?),
        ScalarKind::Bool => Value::Bool(s.parse().ok()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(size: u32, by_value: bool) -> Codec {
        Codec::Inline(Arc::new(InlineLayout {
            type_name: "geo.Vec2".into(),
            fields: Vec::new(),
            size,
            by_value,
        }))
    }

    #[test]
    fn test_header_footprints() {
        assert_eq!(Codec::Scalar(ScalarKind::F64).header_footprint(), 8);
        assert_eq!(Codec::Scalar(ScalarKind::Bool).header_footprint(), 1);
        assert_eq!(Codec::String.header_footprint(), REFERENCE_SIZE);
        assert_eq!(Codec::List(Box::new(Codec::String)).header_footprint(), REFERENCE_SIZE);
        assert_eq!(Codec::Record(SchemaId(0)).header_footprint(), REFERENCE_SIZE);
        assert_eq!(inline(8, true).header_footprint(), 8);
        assert_eq!(inline(16, false).header_footprint(), REFERENCE_SIZE);
    }

    #[test]
    fn test_placement_flags() {
        let record = Codec::Record(SchemaId(3));
        assert!(!record.stores_by_value());
        assert!(!record.in_header());
        assert!(Codec::Scalar(ScalarKind::U32).in_header());
        assert!(!Codec::String.in_header());
        assert_eq!(record.type_tag(), TypeTag::Record);
        assert_eq!(inline(4, true).type_tag(), TypeTag::Inline);
    }

    #[test]
    fn test_parse_default() {
        let u32_codec = Codec::Scalar(ScalarKind::U32);
        assert_eq!(u32_codec.parse_default(" 7 "), Some(Value::U32(7)));
        assert_eq!(u32_codec.parse_default("-1"), None);
        assert_eq!(
            Codec::Scalar(ScalarKind::Bool).parse_default("true"),
            Some(Value::Bool(true))
        );
        assert_eq!(Codec::String.parse_default("anon"), Some(Value::from("anon")));

        let opt = Codec::Optional(Box::new(Codec::Scalar(ScalarKind::I16)));
        assert_eq!(opt.parse_default("null"), Some(Value::none()));
        assert_eq!(opt.parse_default("-4"), Some(Value::some(Value::I16(-4))));
        assert_eq!(Codec::List(Box::new(Codec::String)).parse_default("[]"), None);
    }

    #[test]
    fn test_zero_values() {
        let set = SchemaSet::new();
        assert_eq!(Codec::Scalar(ScalarKind::I64).zero_value(&set), Value::I64(0));
        assert_eq!(Codec::String.zero_value(&set), Value::from(""));
        assert_eq!(
            Codec::Optional(Box::new(Codec::String)).zero_value(&set),
            Value::none()
        );
        // Unknown record ids degrade to an empty record.
        assert_eq!(
            Codec::Record(SchemaId(9)).zero_value(&set),
            Value::Record(Default::default())
        );
    }
}
