// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record writer.
//!
//! # Record layout
//!
//! ```text
//! +------------------------------------------------------------+
//! | schema index (4) | block size (4) |                         |
//! +------------------------------------------------------------+
//! | fixed header: one slot per field, at its derived offset     |
//! |   fixed-size value, or block-local offset of its payload    |
//! +------------------------------------------------------------+
//! | out-of-line payloads, in field order                        |
//! +------------------------------------------------------------+
//! ```
//!
//! The block size is reserved, the block is written in one forward pass,
//! and the size is patched last; the sink must be seekable.

use byteorder::{LittleEndian, WriteBytesExt};
use std::any::Any;
use std::io::SeekFrom;
use std::sync::Arc;

use crate::binding::Schematic;
use crate::codec::{Codec, InlineLayout};
use crate::error::{WireError, WireResult};
use crate::registry::SchemaRegistryWriter;
use crate::schema::{RecordSchema, SchemaField, SchemaId, SchemaSet};
use crate::stream::{StreamView, WriteSeek};
use crate::types::{ScalarKind, TypeTag};
use crate::value::Value;

const ZEROS: [u8; 64] = [0; 64];

/// Writes records through the record protocol. One writer per session.
pub struct SchemaWriter<'a> {
    stream: &'a mut dyn WriteSeek,
    schemas: &'a SchemaSet,
    registry: &'a mut SchemaRegistryWriter,
    view: StreamView,
}

impl<'a> SchemaWriter<'a> {
    pub fn new(
        stream: &'a mut dyn WriteSeek,
        schemas: &'a SchemaSet,
        registry: &'a mut SchemaRegistryWriter,
    ) -> Self {
        Self {
            stream,
            schemas,
            registry,
            view: StreamView::new(),
        }
    }

    /// Write a typed record.
    pub fn write_from<T: Schematic>(&mut self, value: &T, context: &mut dyn Any) -> WireResult<()> {
        let (id, _) = self
            .schemas
            .lookup(T::TYPE_NAME)
            .ok_or_else(|| WireError::NotDerived(T::TYPE_NAME.to_string()))?;
        self.write_record(id, &value.to_value(), context)
    }

    /// Write `value` as a record of schema `id`: index, size, block.
    pub fn write_record(
        &mut self,
        id: SchemaId,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        let depth = self.view.depth();
        let result = self.write_value(&Codec::Record(id), value, context);
        if result.is_err() {
            self.view.truncate(depth);
        }
        result
    }

    pub fn view(&self) -> &StreamView {
        &self.view
    }

    pub fn position(&mut self) -> WireResult<u64> {
        Ok(self.stream.stream_position()?)
    }

    // ------------------------------------------------------------------
    // Primitives (also used by custom codecs)
    // ------------------------------------------------------------------

    pub fn write_u8(&mut self, value: u8) -> WireResult<()> {
        Ok(self.stream.write_u8(value)?)
    }

    pub fn write_u32(&mut self, value: u32) -> WireResult<()> {
        Ok(self.stream.write_u32::<LittleEndian>(value)?)
    }

    pub fn write_tag(&mut self, tag: TypeTag) -> WireResult<()> {
        self.write_u8(tag.to_u8())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> WireResult<()> {
        Ok(self.stream.write_all(bytes)?)
    }

    /// Write `value` at the cursor with `codec`.
    pub fn write_value(
        &mut self,
        codec: &Codec,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        match codec {
            Codec::Scalar(kind) => self.write_scalar(*kind, value),
            Codec::String => match value {
                Value::String(s) => {
                    self.write_len(s.len())?;
                    self.write_bytes(s.as_bytes())
                }
                other => Err(mismatch("string", other)),
            },
            Codec::List(elem) => {
                if let (Value::Bytes(bytes), Codec::Scalar(ScalarKind::U8)) = (value, &**elem) {
                    self.write_tag(TypeTag::U8)?;
                    self.write_len(bytes.len())?;
                    return self.write_bytes(bytes);
                }
                let Value::List(items) = value else {
                    return Err(mismatch("list", value));
                };
                let hoisted = self.write_prolog(elem)?;
                self.write_len(items.len())?;
                for item in items {
                    self.write_element(elem, hoisted.as_ref(), item, context)?;
                }
                Ok(())
            }
            Codec::Map(key, val) => {
                let Value::Map(entries) = value else {
                    return Err(mismatch("map", value));
                };
                let key_schema = self.write_prolog(key)?;
                let val_schema = self.write_prolog(val)?;
                self.write_len(entries.len())?;
                for (k, v) in entries {
                    self.write_element(key, key_schema.as_ref(), k, context)?;
                    self.write_element(val, val_schema.as_ref(), v, context)?;
                }
                Ok(())
            }
            Codec::Optional(inner) => {
                let Value::Optional(slot) = value else {
                    return Err(mismatch("optional", value));
                };
                let hoisted = self.write_prolog(inner)?;
                match slot {
                    None => self.write_u8(0),
                    Some(v) => {
                        self.write_u8(1)?;
                        self.write_element(inner, hoisted.as_ref(), v, context)
                    }
                }
            }
            Codec::Record(id) => {
                let schema = self.schema(*id)?;
                let index = self.registry.register(&schema)?;
                self.write_u32(index)?;
                self.write_block(&schema, value, context)
            }
            Codec::Inline(layout) => {
                let slot = self.position()?;
                self.write_zeros(layout.size)?;
                let tail = slot + u64::from(layout.size);
                self.write_inline(layout, value, slot, tail, context)?;
                Ok(())
            }
            Codec::Custom(custom) => custom.write(self, value, context),
        }
    }

    // ------------------------------------------------------------------
    // Record protocol
    // ------------------------------------------------------------------

    fn schema(&self, id: SchemaId) -> WireResult<Arc<RecordSchema>> {
        self.schemas
            .get(id)
            .cloned()
            .ok_or(WireError::UnknownSchema(id))
    }

    /// Size placeholder, zeroed header, fields, then the size patch.
    fn write_block(
        &mut self,
        schema: &RecordSchema,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        let Value::Record(fields) = value else {
            return Err(mismatch("record", value));
        };

        let size_slot = self.position()?;
        self.write_u32(0)?;
        let start = self.position()?;
        self.view.push(start);
        self.write_zeros(schema.fixed_header_size)?;

        for field in &schema.fields {
            match fields.get(&field.source_name) {
                Some(v) => self.write_field(field, v, context)?,
                None => {
                    log::debug!(
                        "[writer] {}.{} not provided, writing default",
                        schema.type_name,
                        field.source_name
                    );
                    let fallback = match &field.default {
                        Some(default) => default.clone(),
                        None => field.codec.zero_value(self.schemas),
                    };
                    self.write_field(field, &fallback, context)?;
                }
            }
        }

        let end = self.position()?;
        self.view.pop()?;
        let size = u32::try_from(end - start).map_err(|_| WireError::AddressOverflow(end - start))?;
        self.seek(size_slot)?;
        self.write_u32(size)?;
        self.seek(end)
    }

    fn write_field(
        &mut self,
        field: &SchemaField,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        let slot = self.view.to_global(field.offset());
        let here = self.position()?;

        if let Codec::Inline(layout) = &field.codec {
            if field.in_header() {
                self.write_inline(layout, value, slot, here, context)?;
                return Ok(());
            }
        }
        if field.in_header() {
            self.seek(slot)?;
            self.write_value(&field.codec, value, context)?;
            return self.seek(here);
        }

        let local = self.view.to_local(here)?;
        self.seek(slot)?;
        self.write_u32(local)?;
        self.seek(here)?;
        self.write_value(&field.codec, value, context)
    }

    /// Fill an inline composite whose zeroed slots start at `slot`.
    /// Out-of-line payloads are appended from `tail`; returns the new tail
    /// with the cursor left there.
    fn write_inline(
        &mut self,
        layout: &InlineLayout,
        value: &Value,
        slot: u64,
        mut tail: u64,
        context: &mut dyn Any,
    ) -> WireResult<u64> {
        let Value::Record(fields) = value else {
            return Err(mismatch("record", value));
        };

        for field in &layout.fields {
            let zero;
            let v = match fields.get(&field.name) {
                Some(v) => v,
                None => {
                    zero = field.codec.zero_value(self.schemas);
                    &zero
                }
            };
            let at = slot + u64::from(field.offset);

            match &field.codec {
                Codec::Inline(inner) if field.in_slot() => {
                    tail = self.write_inline(inner, v, at, tail, context)?;
                }
                codec if field.in_slot() => {
                    self.seek(at)?;
                    self.write_value(codec, v, context)?;
                }
                codec => {
                    let local = self.view.to_local(tail)?;
                    self.seek(at)?;
                    self.write_u32(local)?;
                    self.seek(tail)?;
                    self.write_value(codec, v, context)?;
                    tail = self.position()?;
                }
            }
        }

        self.seek(tail)?;
        Ok(tail)
    }

    /// Container prolog: the element tag, plus the schema index when the
    /// element is a record. Record elements then carry only size + block.
    fn write_prolog(&mut self, codec: &Codec) -> WireResult<Option<Arc<RecordSchema>>> {
        self.write_tag(codec.type_tag())?;
        if let Codec::Record(id) = codec {
            let schema = self.schema(*id)?;
            let index = self.registry.register(&schema)?;
            self.write_u32(index)?;
            return Ok(Some(schema));
        }
        Ok(None)
    }

    fn write_element(
        &mut self,
        codec: &Codec,
        hoisted: Option<&Arc<RecordSchema>>,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()> {
        match hoisted {
            Some(schema) => self.write_block(schema, value, context),
            None => self.write_value(codec, value, context),
        }
    }

    fn write_scalar(&mut self, kind: ScalarKind, value: &Value) -> WireResult<()> {
        let s = &mut *self.stream;
        match (kind, value) {
            (ScalarKind::U8, Value::U8(v)) => s.write_u8(*v),
            (ScalarKind::U16, Value::U16(v)) => s.write_u16::<LittleEndian>(*v),
            (ScalarKind::U32, Value::U32(v)) => s.write_u32::<LittleEndian>(*v),
            (ScalarKind::U64, Value::U64(v)) => s.write_u64::<LittleEndian>(*v),
            (ScalarKind::Usize, Value::Usize(v)) => s.write_u64::<LittleEndian>(*v),
            (ScalarKind::I8, Value::I8(v)) => s.write_i8(*v),
            (ScalarKind::I16, Value::I16(v)) => s.write_i16::<LittleEndian>(*v),
            (ScalarKind::I32, Value::I32(v)) => s.write_i32::<LittleEndian>(*v),
            (ScalarKind::I64, Value::I64(v)) => s.write_i64::<LittleEndian>(*v),
            (ScalarKind::Isize, Value::Isize(v)) => s.write_i64::<LittleEndian>(*v),
            (ScalarKind::F32, Value::F32(v)) => s.write_f32::<LittleEndian>(*v),
            (ScalarKind::F64, Value::F64(v)) => s.write_f64::<LittleEndian>(*v),
            (ScalarKind::Bool, Value::Bool(v)) => s.write_u8(u8::from(*v)),
            (kind, other) => return Err(mismatch(kind.tag().name(), other)),
        }?;
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> WireResult<()> {
        let len = u32::try_from(len).map_err(|_| WireError::AddressOverflow(len as u64))?;
        self.write_u32(len)
    }

    fn write_zeros(&mut self, mut count: u32) -> WireResult<()> {
        while count > 0 {
            let chunk = count.min(ZEROS.len() as u32);
            self.write_bytes(&ZEROS[..chunk as usize])?;
            count -= chunk;
        }
        Ok(())
    }

    fn seek(&mut self, global: u64) -> WireResult<()> {
        self.stream.seek(SeekFrom::Start(global))?;
        Ok(())
    }
}

fn mismatch(expected: &str, got: &Value) -> WireError {
    WireError::ValueMismatch {
        expected: expected.to_string(),
        got: got.kind().to_string(),
    }
}
