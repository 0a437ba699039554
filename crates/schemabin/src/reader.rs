// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record reader.
//!
//! Two decoding paths share the record protocol:
//!
//! - **bound**: a reader schema is matched against the stream's field table
//!   ([`MaterializedSchema`]); fields are read by offset, fields the stream
//!   lacks take their default, and trailing bytes are skipped via the block
//!   size.
//! - **raw**: no reader type; every field is decoded from its wire tag
//!   alone into a [`Value`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::any::Any;
use std::collections::HashMap;
use std::io::{self, Read, SeekFrom};
use std::sync::Arc;

use crate::binding::Schematic;
use crate::codec::{Codec, InlineLayout};
use crate::config::{CodecConfig, MISSING_FIELD_OFFSET, PREALLOC_LIMIT, REFERENCE_SIZE};
use crate::error::{WireError, WireResult};
use crate::registry::{MaterializedSchema, SchemaRegistryReader};
use crate::schema::{FieldDescriptor, SchemaField, SchemaId, SchemaSet};
use crate::stream::{ReadSeek, StreamView};
use crate::types::{ScalarKind, TypeTag};
use crate::value::Value;

/// Generate little-endian reads that report truncation with an offset.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $method:ident) => {
        fn $name(&mut self) -> WireResult<$type> {
            match self.stream.$method::<LittleEndian>() {
                Ok(v) => Ok(v),
                Err(e) => Err(self.io_error(e)),
            }
        }
    };
}

/// Reads records through the record protocol. One reader per session.
pub struct SchemaReader<'a> {
    stream: &'a mut dyn ReadSeek,
    schemas: &'a SchemaSet,
    registry: &'a mut SchemaRegistryReader,
    config: CodecConfig,
    view: StreamView,
    /// Size of each open block, parallel to `view`.
    extents: Vec<u32>,
    nesting: usize,
}

impl<'a> SchemaReader<'a> {
    pub fn new(
        stream: &'a mut dyn ReadSeek,
        schemas: &'a SchemaSet,
        registry: &'a mut SchemaRegistryReader,
    ) -> Self {
        Self::with_config(stream, schemas, registry, CodecConfig::default())
    }

    pub fn with_config(
        stream: &'a mut dyn ReadSeek,
        schemas: &'a SchemaSet,
        registry: &'a mut SchemaRegistryReader,
        config: CodecConfig,
    ) -> Self {
        Self {
            stream,
            schemas,
            registry,
            config,
            view: StreamView::new(),
            extents: Vec::new(),
            nesting: 0,
        }
    }

    /// Read the next record into `target`.
    pub fn read_into<T: Schematic>(
        &mut self,
        target: &mut T,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        *target = self.read_as(context)?;
        Ok(())
    }

    /// Read the next record as `T`.
    pub fn read_as<T: Schematic>(&mut self, context: &mut dyn Any) -> WireResult<T> {
        let (id, _) = self
            .schemas
            .lookup(T::TYPE_NAME)
            .ok_or_else(|| WireError::NotDerived(T::TYPE_NAME.to_string()))?;
        let value = self.read_record(id, context)?;
        Ok(T::from_value(value)?)
    }

    /// Read the next record against reader schema `id`.
    pub fn read_record(&mut self, id: SchemaId, context: &mut dyn Any) -> WireResult<Value> {
        let frame = (self.view.depth(), self.nesting);
        let result = self.read_value(&Codec::Record(id), context);
        if result.is_err() {
            self.restore(frame);
        }
        result
    }

    /// Read the next record using only the stream's schema table.
    pub fn read_dynamic(&mut self) -> WireResult<Value> {
        let frame = (self.view.depth(), self.nesting);
        let result = self.read_u32().and_then(|index| self.read_raw_record(index));
        if result.is_err() {
            self.restore(frame);
        }
        result
    }

    pub fn view(&self) -> &StreamView {
        &self.view
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn position(&mut self) -> WireResult<u64> {
        Ok(self.stream.stream_position()?)
    }

    // ------------------------------------------------------------------
    // Primitives (also used by custom codecs)
    // ------------------------------------------------------------------

    pub fn read_u8(&mut self) -> WireResult<u8> {
        match self.stream.read_u8() {
            Ok(v) => Ok(v),
            Err(e) => Err(self.io_error(e)),
        }
    }

    pub fn read_u32(&mut self) -> WireResult<u32> {
        match self.stream.read_u32::<LittleEndian>() {
            Ok(v) => Ok(v),
            Err(e) => Err(self.io_error(e)),
        }
    }

    impl_read_le!(read_u16, u16, read_u16);
    impl_read_le!(read_u64, u64, read_u64);
    impl_read_le!(read_i16, i16, read_i16);
    impl_read_le!(read_i32, i32, read_i32);
    impl_read_le!(read_i64, i64, read_i64);
    impl_read_le!(read_f32, f32, read_f32);
    impl_read_le!(read_f64, f64, read_f64);

    /// Read a tag byte, rejecting values outside the closed set.
    pub fn read_tag(&mut self) -> WireResult<TypeTag> {
        let offset = self.position()?;
        let byte = self.read_u8()?;
        TypeTag::from_u8(byte).ok_or(WireError::UnknownTag { tag: byte, offset })
    }

    /// Read a tag byte and check it against `expected`.
    pub fn expect_tag(&mut self, expected: TypeTag) -> WireResult<()> {
        let offset = self.position()?;
        let found = self.read_tag()?;
        if found != expected {
            return Err(WireError::TagMismatch {
                expected,
                found,
                offset,
            });
        }
        Ok(())
    }

    /// Read a 4-byte element count, bounded by `max_collection_len`.
    pub fn read_count(&mut self, what: &'static str) -> WireResult<usize> {
        let count = self.read_u32()?;
        if count > self.config.max_collection_len {
            return Err(WireError::TooLarge {
                what,
                len: u64::from(count),
                limit: u64::from(self.config.max_collection_len),
            });
        }
        Ok(count as usize)
    }

    /// Read exactly `len` bytes without trusting `len` for allocation.
    pub fn read_bytes(&mut self, len: usize) -> WireResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT * 16));
        (&mut *self.stream).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            let offset = self.position()?;
            return Err(WireError::Truncated { offset });
        }
        Ok(buf)
    }

    /// Read a value of `codec` at the cursor.
    pub fn read_value(&mut self, codec: &Codec, context: &mut dyn Any) -> WireResult<Value> {
        match codec {
            Codec::Scalar(kind) => self.read_scalar(*kind),
            Codec::String => self.read_string(),
            Codec::List(elem) => {
                let hoisted = self.read_prolog(elem)?;
                let count = self.read_count("list count")?;
                let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    items.push(self.read_element(elem, hoisted.as_ref(), context)?);
                }
                Ok(Value::List(items))
            }
            Codec::Map(key, val) => {
                let key_schema = self.read_prolog(key)?;
                let val_schema = self.read_prolog(val)?;
                let count = self.read_count("map count")?;
                let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let k = self.read_element(key, key_schema.as_ref(), context)?;
                    let v = self.read_element(val, val_schema.as_ref(), context)?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            Codec::Optional(inner) => {
                let hoisted = self.read_prolog(inner)?;
                match self.read_flag()? {
                    false => Ok(Value::none()),
                    true => Ok(Value::some(self.read_element(inner, hoisted.as_ref(), context)?)),
                }
            }
            Codec::Record(id) => {
                let index = self.read_u32()?;
                let binding = self.bind(index, *id)?;
                self.read_block(&binding, context)
            }
            Codec::Inline(layout) => {
                let slot = self.position()?;
                let end = slot + u64::from(layout.size);
                let (value, end) = self.read_inline(layout, slot, end, context)?;
                self.seek(end)?;
                Ok(value)
            }
            Codec::Custom(custom) => custom.read(self, context),
        }
    }

    // ------------------------------------------------------------------
    // Bound decoding
    // ------------------------------------------------------------------

    /// Binding of reader schema `id` to stream schema `index`, cached in the
    /// registry on first use.
    fn bind(&mut self, index: u32, id: SchemaId) -> WireResult<Arc<MaterializedSchema>> {
        let schema = self
            .schemas
            .get(id)
            .cloned()
            .ok_or(WireError::UnknownSchema(id))?;
        let (cached, raw) = self
            .registry
            .find(index)
            .ok_or(WireError::UnknownSchemaIndex(index))?;

        if let Some(bound) = cached {
            if bound.schema.identity == schema.identity {
                return Ok(bound);
            }
        }

        let bound = Arc::new(MaterializedSchema::bind(index, schema, &raw));
        self.registry.register(index, Arc::clone(&bound));
        Ok(bound)
    }

    fn read_block(
        &mut self,
        binding: &MaterializedSchema,
        context: &mut dyn Any,
    ) -> WireResult<Value> {
        self.enter()?;
        let size = self.read_u32()?;
        let start = self.position()?;
        self.view.push(start);
        self.extents.push(size);

        let mut fields = HashMap::with_capacity(binding.schema.fields.len());
        for (field, &offset) in binding.schema.fields.iter().zip(&binding.offsets) {
            let value = if offset == MISSING_FIELD_OFFSET {
                self.default_for(field)
            } else {
                self.read_field(field, offset, size, context)?
            };
            fields.insert(field.source_name.clone(), value);
        }

        self.view.pop()?;
        self.extents.pop();
        // Skip whatever this reader did not consume.
        self.seek(start + u64::from(size))?;
        self.leave();
        Ok(Value::Record(fields))
    }

    fn read_field(
        &mut self,
        field: &SchemaField,
        offset: u32,
        size: u32,
        context: &mut dyn Any,
    ) -> WireResult<Value> {
        let footprint = if field.in_header() {
            field.codec.wire_size()
        } else {
            REFERENCE_SIZE
        };
        self.check_bounds(field.wire_name(), offset, footprint, size)?;
        self.seek(self.view.to_global(offset))?;

        if !field.in_header() {
            let target = self.read_u32()?;
            self.check_bounds(field.wire_name(), target, 0, size)?;
            self.seek(self.view.to_global(target))?;
        }

        let frame = (self.view.depth(), self.nesting);
        match self.read_value(&field.codec, context) {
            Ok(value) => Ok(value),
            Err(err) if err.is_schema_mismatch() => {
                self.restore(frame);
                log::warn!(
                    "[reader] {}: {}; default used",
                    field.wire_name(),
                    err
                );
                Ok(self.default_for(field))
            }
            Err(err) => Err(err),
        }
    }

    /// Read an inline composite whose slots start at `slot`. `end` is the
    /// furthest byte consumed so far; returns the value and the new end.
    fn read_inline(
        &mut self,
        layout: &InlineLayout,
        slot: u64,
        mut end: u64,
        context: &mut dyn Any,
    ) -> WireResult<(Value, u64)> {
        let mut fields = HashMap::with_capacity(layout.fields.len());
        for field in &layout.fields {
            let at = slot + u64::from(field.offset);
            let value = match &field.codec {
                Codec::Inline(inner) if field.in_slot() => {
                    let (value, inner_end) = self.read_inline(inner, at, end, context)?;
                    end = inner_end;
                    value
                }
                codec if field.in_slot() => {
                    self.seek(at)?;
                    self.read_value(codec, context)?
                }
                codec => {
                    self.seek(at)?;
                    let target = self.read_u32()?;
                    let extent = self.extents.last().copied().unwrap_or(u32::MAX);
                    self.check_bounds(&field.name, target, 0, extent)?;
                    self.seek(self.view.to_global(target))?;
                    let value = self.read_value(codec, context)?;
                    end = end.max(self.position()?);
                    value
                }
            };
            fields.insert(field.name.clone(), value);
        }
        Ok((Value::Record(fields), end))
    }

    /// Container prolog: element tag, plus the schema index for records.
    fn read_prolog(&mut self, codec: &Codec) -> WireResult<Option<Arc<MaterializedSchema>>> {
        self.expect_tag(codec.type_tag())?;
        if let Codec::Record(id) = codec {
            let index = self.read_u32()?;
            return self.bind(index, *id).map(Some);
        }
        Ok(None)
    }

    fn read_element(
        &mut self,
        codec: &Codec,
        hoisted: Option<&Arc<MaterializedSchema>>,
        context: &mut dyn Any,
    ) -> WireResult<Value> {
        match hoisted {
            Some(binding) => self.read_block(binding, context),
            None => self.read_value(codec, context),
        }
    }

    fn default_for(&self, field: &SchemaField) -> Value {
        match &field.default {
            Some(default) => default.clone(),
            None => field.codec.zero_value(self.schemas),
        }
    }

    // ------------------------------------------------------------------
    // Raw decoding
    // ------------------------------------------------------------------

    fn read_raw_record(&mut self, index: u32) -> WireResult<Value> {
        let raw = self
            .registry
            .raw_table(index)
            .ok_or(WireError::UnknownSchemaIndex(index))?;
        self.read_raw_block(&raw)
    }

    fn read_raw_block(&mut self, raw: &[FieldDescriptor]) -> WireResult<Value> {
        self.enter()?;
        let size = self.read_u32()?;
        let start = self.position()?;
        self.view.push(start);
        self.extents.push(size);

        let mut fields = HashMap::with_capacity(raw.len());
        for descriptor in raw {
            if descriptor.offset == MISSING_FIELD_OFFSET {
                continue;
            }
            let frame = (self.view.depth(), self.nesting);
            match self.read_raw_field(descriptor, size) {
                Ok(value) => {
                    fields.insert(descriptor.name.clone(), value);
                }
                Err(err) if err.is_schema_mismatch() => {
                    self.restore(frame);
                    log::debug!("[reader] raw field {} skipped: {}", descriptor.name, err);
                }
                Err(err) => return Err(err),
            }
        }

        self.view.pop()?;
        self.extents.pop();
        self.seek(start + u64::from(size))?;
        self.leave();
        Ok(Value::Record(fields))
    }

    fn read_raw_field(&mut self, descriptor: &FieldDescriptor, size: u32) -> WireResult<Value> {
        let tag = descriptor.type_tag;
        if tag == TypeTag::Inline {
            let offset = self.view.to_global(descriptor.offset);
            return Err(WireError::Opaque { offset });
        }

        let width = tag.scalar_width().unwrap_or(REFERENCE_SIZE);
        self.check_bounds(&descriptor.name, descriptor.offset, width, size)?;
        self.seek(self.view.to_global(descriptor.offset))?;

        if !tag.is_scalar() {
            let target = self.read_u32()?;
            self.check_bounds(&descriptor.name, target, 0, size)?;
            self.seek(self.view.to_global(target))?;
        }
        self.read_tagged(tag)
    }

    /// Decode a value from its tag alone.
    fn read_tagged(&mut self, tag: TypeTag) -> WireResult<Value> {
        match tag {
            TypeTag::String => self.read_string(),
            TypeTag::List => {
                let (elem, hoisted) = self.read_raw_prolog()?;
                let count = self.read_count("list count")?;
                let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    items.push(self.read_tagged_element(elem, hoisted.as_deref())?);
                }
                Ok(Value::List(items))
            }
            TypeTag::Map => {
                let (key, key_raw) = self.read_raw_prolog()?;
                let (val, val_raw) = self.read_raw_prolog()?;
                let count = self.read_count("map count")?;
                let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let k = self.read_tagged_element(key, key_raw.as_deref())?;
                    let v = self.read_tagged_element(val, val_raw.as_deref())?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            TypeTag::Optional => {
                let (inner, hoisted) = self.read_raw_prolog()?;
                match self.read_flag()? {
                    false => Ok(Value::none()),
                    true => Ok(Value::some(
                        self.read_tagged_element(inner, hoisted.as_deref())?,
                    )),
                }
            }
            TypeTag::Record => {
                let index = self.read_u32()?;
                self.read_raw_record(index)
            }
            TypeTag::Inline => {
                let offset = self.position()?;
                Err(WireError::Opaque { offset })
            }
            scalar => match ScalarKind::from_tag(scalar) {
                Some(kind) => self.read_scalar(kind),
                None => {
                    let offset = self.position()?;
                    Err(WireError::UnknownTag {
                        tag: scalar.to_u8(),
                        offset,
                    })
                }
            },
        }
    }

    fn read_raw_prolog(&mut self) -> WireResult<(TypeTag, Option<Arc<[FieldDescriptor]>>)> {
        let tag = self.read_tag()?;
        if tag == TypeTag::Record {
            let index = self.read_u32()?;
            let raw = self
                .registry
                .raw_table(index)
                .ok_or(WireError::UnknownSchemaIndex(index))?;
            return Ok((tag, Some(raw)));
        }
        Ok((tag, None))
    }

    fn read_tagged_element(
        &mut self,
        tag: TypeTag,
        hoisted: Option<&[FieldDescriptor]>,
    ) -> WireResult<Value> {
        match hoisted {
            Some(raw) => self.read_raw_block(raw),
            None => self.read_tagged(tag),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn read_scalar(&mut self, kind: ScalarKind) -> WireResult<Value> {
        Ok(match kind {
            ScalarKind::U8 => Value::U8(self.read_u8()?),
            ScalarKind::U16 => Value::U16(self.read_u16()?),
            ScalarKind::U32 => Value::U32(self.read_u32()?),
            ScalarKind::U64 => Value::U64(self.read_u64()?),
            ScalarKind::Usize => Value::Usize(self.read_u64()?),
            ScalarKind::I8 => Value::I8(self.read_u8()? as i8),
            ScalarKind::I16 => Value::I16(self.read_i16()?),
            ScalarKind::I32 => Value::I32(self.read_i32()?),
            ScalarKind::I64 => Value::I64(self.read_i64()?),
            ScalarKind::Isize => Value::Isize(self.read_i64()?),
            ScalarKind::F32 => Value::F32(self.read_f32()?),
            ScalarKind::F64 => Value::F64(self.read_f64()?),
            ScalarKind::Bool => Value::Bool(self.read_flag()?),
        })
    }

    fn read_string(&mut self) -> WireResult<Value> {
        let len = self.read_u32()?;
        if len > self.config.max_string_len {
            return Err(WireError::TooLarge {
                what: "string length",
                len: u64::from(len),
                limit: u64::from(self.config.max_string_len),
            });
        }
        let offset = self.position()?;
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| WireError::InvalidUtf8 { offset })
    }

    fn read_flag(&mut self) -> WireResult<bool> {
        let offset = self.position()?;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            flag => Err(WireError::InvalidFlag { flag, offset }),
        }
    }

    fn check_bounds(&self, field: &str, offset: u32, width: u32, size: u32) -> WireResult<()> {
        if u64::from(offset) + u64::from(width) > u64::from(size) {
            return Err(WireError::OffsetOutOfBounds {
                field: field.to_string(),
                offset,
                size,
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> WireResult<()> {
        if self.nesting >= self.config.max_depth {
            return Err(WireError::TooDeep(self.config.max_depth));
        }
        self.nesting += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    fn restore(&mut self, (depth, nesting): (usize, usize)) {
        self.view.truncate(depth);
        self.extents.truncate(depth);
        self.nesting = nesting;
    }

    fn seek(&mut self, global: u64) -> WireResult<()> {
        self.stream.seek(SeekFrom::Start(global))?;
        Ok(())
    }

    fn io_error(&mut self, err: io::Error) -> WireError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            let offset = self.stream.stream_position().unwrap_or(0);
            return WireError::Truncated { offset };
        }
        WireError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::SchemaDeriver;
    use crate::registry::SchemaRegistryWriter;
    use crate::types::{StructBuilder, TypeRef};
    use crate::writer::SchemaWriter;
    use std::io::Cursor;

    struct Encoded {
        records: Vec<u8>,
        registry: SchemaRegistryReader,
    }

    fn encode(set: &SchemaSet, id: SchemaId, values: &[Value]) -> Encoded {
        let mut registry = SchemaRegistryWriter::new();
        let mut out = Cursor::new(Vec::new());
        {
            let mut writer = SchemaWriter::new(&mut out, set, &mut registry);
            for value in values {
                writer.write_record(id, value, &mut ()).expect("write");
            }
        }
        let mut table = Vec::new();
        registry.finalize(&mut table).expect("finalize");
        let registry =
            SchemaRegistryReader::read_from(&mut Cursor::new(table), &CodecConfig::default())
                .expect("table");
        Encoded {
            records: out.into_inner(),
            registry,
        }
    }

    fn scalar_set() -> (SchemaSet, SchemaId) {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("test.Scalars")
                    .field("a", ScalarKind::U8)
                    .field("b", ScalarKind::I16)
                    .field("c", ScalarKind::F64)
                    .field("d", ScalarKind::Bool)
                    .field("e", ScalarKind::Isize)
                    .optional_field("f", TypeRef::String)
                    .build(),
            )
            .expect("derive");
        (deriver.into_schemas(), id)
    }

    fn scalars() -> Value {
        Value::record([
            ("a", Value::U8(200)),
            ("b", Value::I16(-2)),
            ("c", Value::F64(1.5)),
            ("d", Value::Bool(true)),
            ("e", Value::Isize(-9)),
            ("f", Value::some(Value::from("opt"))),
        ])
    }

    #[test]
    fn test_bound_roundtrip() {
        let (set, id) = scalar_set();
        let mut encoded = encode(&set, id, &[scalars()]);
        let mut source = Cursor::new(encoded.records);
        let mut reader = SchemaReader::new(&mut source, &set, &mut encoded.registry);
        let value = reader.read_record(id, &mut ()).expect("read");
        assert_eq!(value, scalars());
        assert_eq!(reader.view().depth(), 0);
    }

    #[test]
    fn test_raw_roundtrip() {
        let (set, id) = scalar_set();
        let mut encoded = encode(&set, id, &[scalars()]);
        let empty = SchemaSet::new();
        let mut source = Cursor::new(encoded.records);
        let mut reader = SchemaReader::new(&mut source, &empty, &mut encoded.registry);
        let value = reader.read_dynamic().expect("raw read");
        assert_eq!(value, scalars());
    }

    #[test]
    fn test_truncated_stream() {
        let (set, id) = scalar_set();
        let mut encoded = encode(&set, id, &[scalars()]);
        encoded.records.truncate(10);
        let mut source = Cursor::new(encoded.records);
        let mut reader = SchemaReader::new(&mut source, &set, &mut encoded.registry);
        let err = reader.read_record(id, &mut ()).expect_err("truncated");
        assert!(matches!(err, WireError::Truncated { .. }), "got {}", err);
        assert_eq!(reader.view().depth(), 0);
    }

    #[test]
    fn test_unknown_schema_index() {
        let (set, id) = scalar_set();
        let mut encoded = encode(&set, id, &[scalars()]);
        encoded.records[0] = 9;
        let mut source = Cursor::new(encoded.records);
        let mut reader = SchemaReader::new(&mut source, &set, &mut encoded.registry);
        assert!(matches!(
            reader.read_record(id, &mut ()),
            Err(WireError::UnknownSchemaIndex(9))
        ));
    }

    #[test]
    fn test_header_offset_outside_block() {
        let (set, id) = scalar_set();
        let mut encoded = encode(&set, id, &[scalars()]);
        // Shrink the block size below the fixed header.
        encoded.records[4..8].copy_from_slice(&2u32.to_le_bytes());
        let mut source = Cursor::new(encoded.records);
        let mut reader = SchemaReader::new(&mut source, &set, &mut encoded.registry);
        assert!(matches!(
            reader.read_record(id, &mut ()),
            Err(WireError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_collection_limit() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("test.Bag")
                    .list_field("items", TypeRef::Scalar(ScalarKind::U16))
                    .build(),
            )
            .expect("derive");
        let set = deriver.into_schemas();
        let bag = Value::record([(
            "items",
            Value::List((0..100u16).map(Value::U16).collect()),
        )]);
        let mut encoded = encode(&set, id, &[bag]);

        let limits = CodecConfig {
            max_collection_len: 10,
            ..CodecConfig::default()
        };
        let mut source = Cursor::new(encoded.records);
        let mut reader =
            SchemaReader::with_config(&mut source, &set, &mut encoded.registry, limits);
        assert!(matches!(
            reader.read_record(id, &mut ()),
            Err(WireError::TooLarge { what: "list count", .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("test.Chain")
                    .optional_field("next", TypeRef::record("test.Chain"))
                    .build(),
            )
            .expect("derive");
        let set = deriver.into_schemas();

        let mut chain = Value::record([("next", Value::none())]);
        for _ in 0..5 {
            chain = Value::record([("next", Value::some(chain))]);
        }
        let mut encoded = encode(&set, id, &[chain]);

        let limits = CodecConfig {
            max_depth: 3,
            ..CodecConfig::default()
        };
        let mut source = Cursor::new(encoded.records);
        let mut reader =
            SchemaReader::with_config(&mut source, &set, &mut encoded.registry, limits);
        assert!(matches!(
            reader.read_record(id, &mut ()),
            Err(WireError::TooDeep(3))
        ));
    }
}
