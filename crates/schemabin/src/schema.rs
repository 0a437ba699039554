// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Derived record schemas and the arena that owns them.
//!
//! Schemas reference each other through [`SchemaId`] indices into a
//! [`SchemaSet`], never by pointer, so recursive records need no cycles of
//! ownership. A schema is immutable once it is ready and is shared as an
//! `Arc` by every session that reads or writes it.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::types::TypeTag;
use crate::value::Value;

/// Arena index of a derived schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SchemaId(pub u32);

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-stable identity of a record schema, derived from its type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SchemaIdentity(pub u64);

impl SchemaIdentity {
    /// FNV-1a over the qualified type name.
    pub fn from_type_name(name: &str) -> Self {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = FNV_OFFSET;
        for byte in name.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        Self(hash)
    }
}

impl fmt::Display for SchemaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Wire-level description of one field, as carried in the schema table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Offset from the start of the record's fixed header.
    pub offset: u32,
    pub type_tag: TypeTag,
}

/// A resolved field: wire descriptor plus the behavior behind it.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub descriptor: FieldDescriptor,
    /// Name of the field in the source type (key in [`Value::Record`]).
    pub source_name: String,
    pub codec: Codec,
    /// Bytes this field occupies in the fixed header.
    pub footprint: u32,
    /// Parsed default, used when the wire carries no data.
    pub default: Option<Value>,
    pub default_literal: Option<String>,
}

impl SchemaField {
    pub fn wire_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn offset(&self) -> u32 {
        self.descriptor.offset
    }

    /// True if the value itself sits in the header slot.
    pub fn in_header(&self) -> bool {
        self.codec.in_header()
    }
}

/// A ready record schema.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub identity: SchemaIdentity,
    pub type_name: String,
    pub fixed_header_size: u32,
    pub fields: Vec<SchemaField>,
}

impl RecordSchema {
    /// The field table written to the schema table.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(|f| &f.descriptor)
    }

    pub fn field(&self, source_name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.source_name == source_name)
    }
}

/// Lifecycle of a record type during derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationState {
    Unresolved,
    InPreparation,
    Ready,
}

#[derive(Debug, Clone)]
enum Slot {
    InPreparation,
    Ready(Arc<RecordSchema>),
}

/// Arena of derived schemas, indexed by [`SchemaId`] and by type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    slots: Vec<Slot>,
    by_name: HashMap<String, SchemaId>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready schema at `id`.
    pub fn get(&self, id: SchemaId) -> Option<&Arc<RecordSchema>> {
        match self.slots.get(id.0 as usize)? {
            Slot::Ready(schema) => Some(schema),
            Slot::InPreparation => None,
        }
    }

    pub fn id_of(&self, type_name: &str) -> Option<SchemaId> {
        self.by_name.get(type_name).copied()
    }

    /// Ready schema for `type_name`.
    pub fn lookup(&self, type_name: &str) -> Option<(SchemaId, &Arc<RecordSchema>)> {
        let id = self.id_of(type_name)?;
        self.get(id).map(|schema| (id, schema))
    }

    pub fn state(&self, type_name: &str) -> DerivationState {
        match self.id_of(type_name).map(|id| &self.slots[id.0 as usize]) {
            None => DerivationState::Unresolved,
            Some(Slot::InPreparation) => DerivationState::InPreparation,
            Some(Slot::Ready(_)) => DerivationState::Ready,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ready schemas in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &Arc<RecordSchema>)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Ready(schema) => Some((SchemaId(i as u32), schema)),
            Slot::InPreparation => None,
        })
    }

    pub(crate) fn reserve(&mut self, type_name: &str) -> SchemaId {
        let id = SchemaId(self.slots.len() as u32);
        self.slots.push(Slot::InPreparation);
        self.by_name.insert(type_name.to_string(), id);
        id
    }

    pub(crate) fn complete(&mut self, id: SchemaId, schema: RecordSchema) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = Slot::Ready(Arc::new(schema));
        }
    }

    /// Drop every slot at or above `len`.
    pub(crate) fn rollback(&mut self, len: usize) {
        self.slots.truncate(len);
        self.by_name.retain(|_, id| (id.0 as usize) < len);
    }
}
