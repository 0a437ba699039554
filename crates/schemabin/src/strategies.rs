// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in codec strategies.
//!
//! Installed by default: [`RecordStrategy`], one [`ScalarStrategy`] per
//! scalar kind, [`StringStrategy`], [`ListStrategy`], [`MapStrategy`],
//! [`OptionalStrategy`]. Opt-in: [`InlineStrategy`] (per composite type)
//! and [`ByteStringStrategy`].

use std::sync::Arc;

use crate::binding::Schematic;
use crate::codec::{ByteStringCodec, Codec};
use crate::derive::SchemaDeriver;
use crate::error::DeriveError;
use crate::resolver::CodecStrategy;
use crate::types::{FieldTags, ScalarKind, TypeRef};

fn element_resolves(ty: &TypeRef, deriver: &SchemaDeriver) -> bool {
    deriver.resolve_field(ty, &FieldTags::default()).is_some()
}

/// Nested records, through the record protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordStrategy;

impl CodecStrategy for RecordStrategy {
    fn name(&self) -> &str {
        "record"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, deriver: &SchemaDeriver) -> bool {
        matches!(ty, TypeRef::Struct(name) if deriver.catalog().contains(name))
    }

    fn resolve(
        &self,
        ty: &TypeRef,
        _tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        match ty {
            TypeRef::Struct(name) => deriver.record_schema(name).map(Codec::Record),
            other => Err(DeriveError::Unsupported(other.to_string())),
        }
    }
}

/// One fixed-width scalar kind.
#[derive(Debug, Clone, Copy)]
pub struct ScalarStrategy {
    kind: ScalarKind,
}

impl ScalarStrategy {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl CodecStrategy for ScalarStrategy {
    fn name(&self) -> &str {
        self.kind.tag().name()
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, _deriver: &SchemaDeriver) -> bool {
        *ty == TypeRef::Scalar(self.kind)
    }

    fn resolve(
        &self,
        _ty: &TypeRef,
        _tags: &FieldTags,
        _deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        Ok(Codec::Scalar(self.kind))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StringStrategy;

impl CodecStrategy for StringStrategy {
    fn name(&self) -> &str {
        "string"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, _deriver: &SchemaDeriver) -> bool {
        *ty == TypeRef::String
    }

    fn resolve(
        &self,
        _ty: &TypeRef,
        _tags: &FieldTags,
        _deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        Ok(Codec::String)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ListStrategy;

impl CodecStrategy for ListStrategy {
    fn name(&self) -> &str {
        "list"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, deriver: &SchemaDeriver) -> bool {
        matches!(ty, TypeRef::List(elem) if element_resolves(elem, deriver))
    }

    fn resolve(
        &self,
        ty: &TypeRef,
        _tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        match ty {
            TypeRef::List(elem) => Ok(Codec::List(Box::new(deriver.resolve_codec(elem)?))),
            other => Err(DeriveError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MapStrategy;

impl CodecStrategy for MapStrategy {
    fn name(&self) -> &str {
        "map"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, deriver: &SchemaDeriver) -> bool {
        matches!(ty, TypeRef::Map(k, v)
            if element_resolves(k, deriver) && element_resolves(v, deriver))
    }

    fn resolve(
        &self,
        ty: &TypeRef,
        _tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        match ty {
            TypeRef::Map(k, v) => {
                let key = deriver.resolve_codec(k)?;
                let value = deriver.resolve_codec(v)?;
                Ok(Codec::Map(Box::new(key), Box::new(value)))
            }
            other => Err(DeriveError::Unsupported(other.to_string())),
        }
    }
}

/// Values that may be absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionalStrategy;

impl CodecStrategy for OptionalStrategy {
    fn name(&self) -> &str {
        "optional"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, deriver: &SchemaDeriver) -> bool {
        matches!(ty, TypeRef::Optional(inner) if element_resolves(inner, deriver))
    }

    fn resolve(
        &self,
        ty: &TypeRef,
        _tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        match ty {
            TypeRef::Optional(inner) => {
                Ok(Codec::Optional(Box::new(deriver.resolve_codec(inner)?)))
            }
            other => Err(DeriveError::Unsupported(other.to_string())),
        }
    }
}

/// Embeds one record type by value instead of through the record protocol.
///
/// Registered per type. The composite must not contain itself by value;
/// a back-reference has to go through a record field.
#[derive(Debug, Clone)]
pub struct InlineStrategy {
    type_name: String,
}

impl InlineStrategy {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    pub fn for_type<T: Schematic>() -> Arc<Self> {
        Arc::new(Self::new(T::TYPE_NAME))
    }
}

impl CodecStrategy for InlineStrategy {
    fn name(&self) -> &str {
        "inline"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, deriver: &SchemaDeriver) -> bool {
        matches!(ty, TypeRef::Struct(name)
            if *name == self.type_name && deriver.catalog().contains(name))
    }

    fn resolve(
        &self,
        _ty: &TypeRef,
        _tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        deriver.inline_layout(&self.type_name).map(Codec::Inline)
    }
}

/// Routes `list<u8>` to [`ByteStringCodec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteStringStrategy;

impl CodecStrategy for ByteStringStrategy {
    fn name(&self) -> &str {
        "byte-string"
    }

    fn can_handle(&self, ty: &TypeRef, _tags: &FieldTags, _deriver: &SchemaDeriver) -> bool {
        *ty == TypeRef::list(TypeRef::Scalar(ScalarKind::U8))
    }

    fn resolve(
        &self,
        _ty: &TypeRef,
        _tags: &FieldTags,
        _deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError> {
        Ok(Codec::Custom(Arc::new(ByteStringCodec)))
    }
}
