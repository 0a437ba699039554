// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-session schema registries.
//!
//! # Schema table
//!
//! ```text
//! +----------------------------------------------------------+
//! | schema count (4)                                          |
//! +----------------------------------------------------------+
//! | per schema:  field count (2)                              |
//! |   per field: name len (2) | name (var) | tag (1) | off (4)|
//! +----------------------------------------------------------+
//! ```
//!
//! The writer assigns compact indices in first-use order and keeps the
//! table in memory until [`SchemaRegistryWriter::finalize`]. The reader
//! keeps every raw table it loaded; bindings to concrete reader schemas
//! are a cache layered on top.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::config::{CodecConfig, MISSING_FIELD_OFFSET};
use crate::error::{WireError, WireResult};
use crate::schema::{FieldDescriptor, RecordSchema, SchemaIdentity};
use crate::types::TypeTag;

// ---------------------------------------------------------------------------
// SchemaRegistryWriter
// ---------------------------------------------------------------------------

/// Write-side registry: schema identity -> compact index.
#[derive(Debug)]
pub struct SchemaRegistryWriter {
    indices: HashMap<SchemaIdentity, u32>,
    /// Schema table under construction; starts with the reserved count.
    table: Vec<u8>,
    count: u32,
}

impl Default for SchemaRegistryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistryWriter {
    pub fn new() -> Self {
        Self {
            indices: HashMap::new(),
            table: vec![0; 4],
            count: 0,
        }
    }

    /// Compact index of `schema`, appending its field table on first use.
    pub fn register(&mut self, schema: &RecordSchema) -> WireResult<u32> {
        if let Some(&index) = self.indices.get(&schema.identity) {
            return Ok(index);
        }

        let entry = encode_entry(schema)?;
        let index = self.count;
        self.table.extend_from_slice(&entry);
        self.count += 1;
        self.indices.insert(schema.identity, index);
        log::debug!(
            "[registry] {} registered as index {}",
            schema.type_name,
            index
        );
        Ok(index)
    }

    pub fn find(&self, identity: SchemaIdentity) -> Option<u32> {
        self.indices.get(&identity).copied()
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Patch the schema count and write the table to `sink`.
    ///
    /// Returns the number of bytes written.
    pub fn finalize<W: Write + ?Sized>(mut self, sink: &mut W) -> WireResult<usize> {
        LittleEndian::write_u32(&mut self.table[..4], self.count);
        sink.write_all(&self.table)?;
        sink.flush()?;
        log::debug!(
            "[registry] schema table flushed: {} schemas, {} bytes",
            self.count,
            self.table.len()
        );
        Ok(self.table.len())
    }
}

fn encode_entry(schema: &RecordSchema) -> WireResult<Vec<u8>> {
    let field_count = u16::try_from(schema.fields.len()).map_err(|_| WireError::TooLarge {
        what: "field count",
        len: schema.fields.len() as u64,
        limit: u64::from(u16::MAX),
    })?;

    let mut entry = Vec::with_capacity(2 + schema.fields.len() * 16);
    entry.write_u16::<LittleEndian>(field_count)?;
    for descriptor in schema.descriptors() {
        let name = descriptor.name.as_bytes();
        let len = u16::try_from(name.len()).map_err(|_| WireError::TooLarge {
            what: "field name length",
            len: name.len() as u64,
            limit: u64::from(u16::MAX),
        })?;
        entry.write_u16::<LittleEndian>(len)?;
        entry.write_all(name)?;
        entry.write_u8(descriptor.type_tag.to_u8())?;
        entry.write_u32::<LittleEndian>(descriptor.offset)?;
    }
    Ok(entry)
}

// ---------------------------------------------------------------------------
// MaterializedSchema
// ---------------------------------------------------------------------------

/// A reader schema bound to one wire field table.
#[derive(Debug, Clone)]
pub struct MaterializedSchema {
    pub index: u32,
    pub schema: Arc<RecordSchema>,
    /// Wire offset per reader field, [`MISSING_FIELD_OFFSET`] when the
    /// wire carries no compatible data for it.
    pub offsets: Vec<u32>,
}

impl MaterializedSchema {
    /// Match reader fields to wire fields by name and tag.
    pub fn bind(index: u32, schema: Arc<RecordSchema>, raw: &[FieldDescriptor]) -> Self {
        let offsets = schema
            .fields
            .iter()
            .map(|field| match raw.iter().find(|d| d.name == field.wire_name()) {
                Some(wire) if wire.type_tag == field.descriptor.type_tag => wire.offset,
                Some(wire) => {
                    log::warn!(
                        "[registry] {}.{}: stream holds {}, reader expects {}; default used",
                        schema.type_name,
                        field.wire_name(),
                        wire.type_tag,
                        field.descriptor.type_tag
                    );
                    MISSING_FIELD_OFFSET
                }
                None => {
                    log::debug!(
                        "[registry] {}.{} absent from stream schema {}",
                        schema.type_name,
                        field.wire_name(),
                        index
                    );
                    MISSING_FIELD_OFFSET
                }
            })
            .collect();

        Self {
            index,
            schema,
            offsets,
        }
    }

    /// Reader fields the wire has no data for.
    pub fn missing_fields(&self) -> impl Iterator<Item = &str> {
        self.schema
            .fields
            .iter()
            .zip(&self.offsets)
            .filter(|(_, &offset)| offset == MISSING_FIELD_OFFSET)
            .map(|(field, _)| field.source_name.as_str())
    }
}

// ---------------------------------------------------------------------------
// SchemaRegistryReader
// ---------------------------------------------------------------------------

/// Read-side registry: compact index -> raw table (+ optional binding).
#[derive(Debug, Default)]
pub struct SchemaRegistryReader {
    raw: Vec<Arc<[FieldDescriptor]>>,
    materialized: HashMap<u32, Arc<MaterializedSchema>>,
}

impl SchemaRegistryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry over already-decoded field tables.
    pub fn from_tables(tables: Vec<Vec<FieldDescriptor>>) -> Self {
        Self {
            raw: tables.into_iter().map(Arc::from).collect(),
            materialized: HashMap::new(),
        }
    }

    /// Load a schema table.
    pub fn read_from<R: Read + ?Sized>(source: &mut R, limits: &CodecConfig) -> WireResult<Self> {
        let count = source.read_u32::<LittleEndian>()?;
        if count > limits.max_collection_len {
            return Err(WireError::TooLarge {
                what: "schema count",
                len: u64::from(count),
                limit: u64::from(limits.max_collection_len),
            });
        }

        let mut raw = Vec::with_capacity((count as usize).min(crate::config::PREALLOC_LIMIT));
        let mut consumed = 4u64;
        for _ in 0..count {
            let field_count = source.read_u16::<LittleEndian>()?;
            consumed += 2;
            let mut fields = Vec::with_capacity(usize::from(field_count));
            for _ in 0..field_count {
                let len = source.read_u16::<LittleEndian>()?;
                let mut name = vec![0u8; usize::from(len)];
                source.read_exact(&mut name)?;
                let name = String::from_utf8(name).map_err(|_| WireError::InvalidUtf8 {
                    offset: consumed + 2,
                })?;
                consumed += 2 + u64::from(len);

                let tag_byte = source.read_u8()?;
                let type_tag = TypeTag::from_u8(tag_byte).ok_or(WireError::UnknownTag {
                    tag: tag_byte,
                    offset: consumed,
                })?;
                let offset = source.read_u32::<LittleEndian>()?;
                consumed += 5;

                fields.push(FieldDescriptor {
                    name,
                    offset,
                    type_tag,
                });
            }
            raw.push(Arc::from(fields));
        }

        log::debug!("[registry] loaded {} schemas ({} bytes)", count, consumed);
        Ok(Self {
            raw,
            materialized: HashMap::new(),
        })
    }

    /// Binding (if any) and raw table for `index`.
    pub fn find(
        &self,
        index: u32,
    ) -> Option<(Option<Arc<MaterializedSchema>>, Arc<[FieldDescriptor]>)> {
        let raw = self.raw.get(index as usize)?;
        Some((self.materialized.get(&index).cloned(), Arc::clone(raw)))
    }

    pub fn raw_table(&self, index: u32) -> Option<Arc<[FieldDescriptor]>> {
        self.raw.get(index as usize).cloned()
    }

    /// Attach a binding to a known index. Never overwrites; returns whether
    /// the binding was stored.
    pub fn register(&mut self, index: u32, schema: Arc<MaterializedSchema>) -> bool {
        if index as usize >= self.raw.len() || self.materialized.contains_key(&index) {
            return false;
        }
        self.materialized.insert(index, schema);
        true
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
