// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema derivation.
//!
//! Walks a record's declared fields in order, asks the resolver for a
//! strategy per field, and lays the resulting codecs out back to back in
//! the fixed header. Referenced records are derived on demand; a record
//! seen again while still in preparation resolves to its reserved id, which
//! is what lets self-referential records terminate.
//!
//! Inline composites have no such escape: a composite that reaches itself
//! by value is rejected with [`DeriveError::Recursion`].
//!
//! # Example
//!
//! ```
//! use schemabin::{ScalarKind, SchemaDeriver, StructBuilder, TypeRef};
//!
//! let mut deriver = SchemaDeriver::new();
//! deriver.declare(
//!     StructBuilder::new("app.User")
//!         .field("id", ScalarKind::U32)
//!         .string_field("name")
//!         .list_field("tags", TypeRef::String)
//!         .build(),
//! );
//! let id = deriver.derive_schema("app.User").unwrap();
//! let schema = deriver.schema(id).unwrap();
//! assert_eq!(schema.fixed_header_size, 12);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::binding::{SchemaType, Schematic};
use crate::codec::{Codec, InlineField, InlineLayout};
use crate::config::DeriveConfig;
use crate::error::{DerivationWarning, DeriveError};
use crate::resolver::{CodecStrategy, StrategyResolver};
use crate::schema::{
    DerivationState, FieldDescriptor, RecordSchema, SchemaField, SchemaId, SchemaIdentity,
    SchemaSet,
};
use crate::types::{FieldTags, StructDescriptor, TypeCatalog, TypeRef};

/// Owns the type catalog, the strategy table and the schema arena.
#[derive(Debug)]
pub struct SchemaDeriver {
    catalog: TypeCatalog,
    resolver: StrategyResolver,
    config: DeriveConfig,
    schemas: SchemaSet,
    inline_layouts: HashMap<String, Arc<InlineLayout>>,
    /// Insertion order of `inline_layouts`, for rollback.
    inline_log: Vec<String>,
    /// Inline composites currently being laid out.
    inline_visiting: Vec<String>,
    warnings: Vec<DerivationWarning>,
}

impl Default for SchemaDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDeriver {
    /// Deriver with the default strategy table.
    pub fn new() -> Self {
        Self::with_config(DeriveConfig::default())
    }

    pub fn with_config(config: DeriveConfig) -> Self {
        Self::with_resolver(config, StrategyResolver::with_defaults())
    }

    pub fn with_resolver(config: DeriveConfig, resolver: StrategyResolver) -> Self {
        Self {
            catalog: TypeCatalog::new(),
            resolver,
            config,
            schemas: SchemaSet::new(),
            inline_layouts: HashMap::new(),
            inline_log: Vec::new(),
            inline_visiting: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // ----------------------------------------------------------------
    // Inputs
    // ----------------------------------------------------------------

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TypeCatalog {
        &mut self.catalog
    }

    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// Add (or replace) a record descriptor.
    pub fn declare(&mut self, descriptor: StructDescriptor) {
        self.catalog.insert(descriptor);
    }

    /// Declare a Rust type and every record type it reaches.
    pub fn declare_type<T: SchemaType>(&mut self) {
        T::declare(&mut self.catalog);
    }

    /// Append a strategy; it shadows every earlier one for the types it
    /// accepts.
    pub fn register_strategy(&mut self, strategy: Arc<dyn CodecStrategy>) {
        self.resolver.register(strategy);
    }

    pub fn resolver(&self) -> &StrategyResolver {
        &self.resolver
    }

    pub fn resolve_field(
        &self,
        ty: &TypeRef,
        tags: &FieldTags,
    ) -> Option<Arc<dyn CodecStrategy>> {
        self.resolver.resolve(ty, tags, self)
    }

    // ----------------------------------------------------------------
    // Derivation
    // ----------------------------------------------------------------

    /// Derive the schema of a declared record type.
    ///
    /// On error every schema reserved by this call is rolled back; schemas
    /// that were ready before the call stay untouched.
    pub fn derive_schema(&mut self, type_name: &str) -> Result<SchemaId, DeriveError> {
        let mark = self.schemas.len();
        let inline_mark = self.inline_log.len();

        match self.record_schema(type_name) {
            Ok(id) => Ok(id),
            Err(err) => {
                log::warn!("[derive] {} failed: {}", type_name, err);
                self.schemas.rollback(mark);
                for name in self.inline_log.drain(inline_mark..) {
                    self.inline_layouts.remove(&name);
                }
                self.inline_visiting.clear();
                Err(err)
            }
        }
    }

    /// Declare and derive a descriptor in one step.
    pub fn derive_descriptor(
        &mut self,
        descriptor: StructDescriptor,
    ) -> Result<SchemaId, DeriveError> {
        let name = descriptor.name.clone();
        self.declare(descriptor);
        self.derive_schema(&name)
    }

    /// Declare and derive a Rust record type.
    pub fn derive<T: Schematic>(&mut self) -> Result<SchemaId, DeriveError> {
        self.declare_type::<T>();
        self.derive_schema(T::TYPE_NAME)
    }

    pub fn schema(&self, id: SchemaId) -> Option<&Arc<RecordSchema>> {
        self.schemas.get(id)
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    pub fn into_schemas(self) -> SchemaSet {
        self.schemas
    }

    pub fn state(&self, type_name: &str) -> DerivationState {
        self.schemas.state(type_name)
    }

    pub fn warnings(&self) -> &[DerivationWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DerivationWarning> {
        std::mem::take(&mut self.warnings)
    }

    // ----------------------------------------------------------------
    // Strategy callbacks
    // ----------------------------------------------------------------

    /// Schema id of a record type, deriving it if needed. A type that is
    /// still in preparation resolves to its reserved id.
    pub fn record_schema(&mut self, type_name: &str) -> Result<SchemaId, DeriveError> {
        if let Some(id) = self.schemas.id_of(type_name) {
            return Ok(id);
        }

        let descriptor = self
            .catalog
            .get(type_name)
            .cloned()
            .ok_or_else(|| DeriveError::UnknownType(type_name.to_string()))?;

        let id = self.schemas.reserve(type_name);
        log::debug!("[derive] preparing {} as {}", type_name, id);

        let schema = self.build_schema(&descriptor)?;
        log::debug!(
            "[derive] {} ready: {} fields, {}-byte header",
            type_name,
            schema.fields.len(),
            schema.fixed_header_size
        );
        self.schemas.complete(id, schema);
        Ok(id)
    }

    /// Codec for a container element or optional payload.
    pub fn resolve_codec(&mut self, ty: &TypeRef) -> Result<Codec, DeriveError> {
        let tags = FieldTags::default();
        let strategy = self
            .resolve_field(ty, &tags)
            .ok_or_else(|| DeriveError::Unsupported(ty.to_string()))?;
        strategy.resolve(ty, &tags, self)
    }

    /// Layout of an inline composite, guarded against by-value cycles.
    pub fn inline_layout(&mut self, type_name: &str) -> Result<Arc<InlineLayout>, DeriveError> {
        if let Some(layout) = self.inline_layouts.get(type_name) {
            return Ok(Arc::clone(layout));
        }

        if let Some(start) = self.inline_visiting.iter().position(|n| n == type_name) {
            let mut path = self.inline_visiting[start..].join(" -> ");
            path.push_str(" -> ");
            path.push_str(type_name);
            return Err(DeriveError::Recursion {
                type_name: type_name.to_string(),
                path,
            });
        }

        let descriptor = self
            .catalog
            .get(type_name)
            .cloned()
            .ok_or_else(|| DeriveError::UnknownType(type_name.to_string()))?;

        self.inline_visiting.push(type_name.to_string());
        let built = self.build_inline(&descriptor);
        self.inline_visiting.pop();

        let layout = Arc::new(built?);
        self.inline_layouts
            .insert(type_name.to_string(), Arc::clone(&layout));
        self.inline_log.push(type_name.to_string());
        Ok(layout)
    }

    // ----------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------

    fn build_schema(&mut self, descriptor: &StructDescriptor) -> Result<RecordSchema, DeriveError> {
        let mut fields = Vec::with_capacity(descriptor.fields.len());
        let mut wire_names = HashSet::new();
        let mut offset = 0u32;

        for def in &descriptor.fields {
            if def.tags.ignore {
                log::debug!("[derive] {}.{} ignored", descriptor.name, def.name);
                continue;
            }

            let Some(strategy) = self.resolve_field(&def.ty, &def.tags) else {
                self.warn(DerivationWarning::NoStrategy {
                    record: descriptor.name.clone(),
                    field: def.name.clone(),
                    ty: def.ty.to_string(),
                });
                continue;
            };
            let codec = strategy.resolve(&def.ty, &def.tags, self)?;

            let wire_name = def.wire_name().to_string();
            if !wire_names.insert(wire_name.clone()) {
                self.warn(DerivationWarning::DuplicateWireName {
                    record: descriptor.name.clone(),
                    field: def.name.clone(),
                    wire_name,
                });
                continue;
            }

            let (default, default_literal) = match &def.tags.default {
                Some(literal) => match codec.parse_default(literal) {
                    Some(value) => (Some(value), Some(literal.clone())),
                    None => {
                        self.warn(DerivationWarning::InvalidDefault {
                            record: descriptor.name.clone(),
                            field: def.name.clone(),
                            literal: literal.clone(),
                        });
                        (None, None)
                    }
                },
                None => (None, None),
            };

            let footprint = codec.header_footprint();
            fields.push(SchemaField {
                descriptor: FieldDescriptor {
                    name: wire_name,
                    offset,
                    type_tag: codec.type_tag(),
                },
                source_name: def.name.clone(),
                codec,
                footprint,
                default,
                default_literal,
            });
            offset += footprint;
        }

        Ok(RecordSchema {
            identity: SchemaIdentity::from_type_name(&descriptor.name),
            type_name: descriptor.name.clone(),
            fixed_header_size: offset,
            fields,
        })
    }

    fn build_inline(&mut self, descriptor: &StructDescriptor) -> Result<InlineLayout, DeriveError> {
        let mut fields = Vec::with_capacity(descriptor.fields.len());
        let mut offset = 0u32;

        for def in &descriptor.fields {
            if def.tags.ignore {
                continue;
            }

            let Some(strategy) = self.resolve_field(&def.ty, &def.tags) else {
                self.warn(DerivationWarning::NoStrategy {
                    record: descriptor.name.clone(),
                    field: def.name.clone(),
                    ty: def.ty.to_string(),
                });
                continue;
            };
            let codec = strategy.resolve(&def.ty, &def.tags, self)?;

            let size = codec.header_footprint();
            fields.push(InlineField {
                name: def.name.clone(),
                offset,
                codec,
            });
            offset += size;
        }

        Ok(InlineLayout {
            type_name: descriptor.name.clone(),
            fields,
            size: offset,
            by_value: offset <= self.config.inline_by_value_threshold,
        })
    }

    fn warn(&mut self, warning: DerivationWarning) {
        log::warn!("[derive] {}", warning);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REFERENCE_SIZE;
    use crate::strategies::InlineStrategy;
    use crate::types::{ScalarKind, StructBuilder, TypeTag};

    fn user() -> StructDescriptor {
        StructBuilder::new("app.User")
            .field("id", ScalarKind::U32)
            .string_field("name")
            .list_field("tags", TypeRef::String)
            .build()
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver.derive_descriptor(user()).expect("derive");
        let schema = deriver.schema(id).expect("ready");

        let offsets: Vec<u32> = schema.descriptors().map(|d| d.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(schema.fixed_header_size, 12);

        let tags: Vec<TypeTag> = schema.descriptors().map(|d| d.type_tag).collect();
        assert_eq!(tags, vec![TypeTag::U32, TypeTag::String, TypeTag::List]);
    }

    #[test]
    fn test_unsupported_field_is_skipped() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("app.Handle")
                    .field("id", ScalarKind::U16)
                    .field_with_type("fd", TypeRef::Opaque("RawFd".into()))
                    .field("flags", ScalarKind::U8)
                    .build(),
            )
            .expect("partial schema");
        let schema = deriver.schema(id).expect("ready");

        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[1].wire_name(), "flags");
        assert_eq!(schema.fields[1].offset(), 2);
        assert_eq!(schema.fixed_header_size, 3);
        assert!(matches!(
            deriver.warnings(),
            [DerivationWarning::NoStrategy { field, .. }] if field == "fd"
        ));
    }

    #[test]
    fn test_tags_rename_ignore_default() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("app.Account")
                    .field_with_tags(
                        "uid",
                        TypeRef::Scalar(ScalarKind::U64),
                        FieldTags::new().rename("id").default_value("42"),
                    )
                    .field_with_tags("cache", TypeRef::String, FieldTags::new().ignore())
                    .field_with_tags(
                        "active",
                        TypeRef::Scalar(ScalarKind::Bool),
                        FieldTags::new().default_value("maybe"),
                    )
                    .build(),
            )
            .expect("derive");
        let schema = deriver.schema(id).expect("ready");

        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].wire_name(), "id");
        assert_eq!(schema.fields[0].source_name, "uid");
        assert_eq!(schema.fields[0].default, Some(crate::Value::U64(42)));
        assert_eq!(schema.fields[1].default, None);
        assert!(matches!(
            deriver.warnings(),
            [DerivationWarning::InvalidDefault { literal, .. }] if literal == "maybe"
        ));
    }

    #[test]
    fn test_duplicate_wire_name_is_dropped() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("app.Dup")
                    .field("id", ScalarKind::U32)
                    .field_with_tags(
                        "legacy_id",
                        TypeRef::Scalar(ScalarKind::U32),
                        FieldTags::new().rename("id"),
                    )
                    .build(),
            )
            .expect("derive");
        assert_eq!(deriver.schema(id).map(|s| s.fields.len()), Some(1));
        assert_eq!(deriver.warnings().len(), 1);
    }

    #[test]
    fn test_self_reference_through_record_field() {
        let mut deriver = SchemaDeriver::new();
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("app.Node")
                    .field("value", ScalarKind::I32)
                    .optional_field("next", TypeRef::record("app.Node"))
                    .list_field("children", TypeRef::record("app.Node"))
                    .build(),
            )
            .expect("self-reference resolves");
        let schema = deriver.schema(id).expect("ready");

        assert_eq!(deriver.state("app.Node"), DerivationState::Ready);
        assert_eq!(deriver.schemas().len(), 1);
        match &schema.fields[1].codec {
            Codec::Optional(inner) => assert!(matches!(**inner, Codec::Record(i) if i == id)),
            other => panic!("expected optional record, got {:?}", other),
        }
    }

    #[test]
    fn test_record_fields_take_a_reference() {
        let mut deriver = SchemaDeriver::new();
        deriver.declare(
            StructBuilder::new("geo.Point")
                .field("x", ScalarKind::I8)
                .build(),
        );
        let id = deriver
            .derive_descriptor(
                StructBuilder::new("geo.Shape")
                    .record_field("origin", "geo.Point")
                    .field("sides", ScalarKind::U8)
                    .build(),
            )
            .expect("derive");
        let schema = deriver.schema(id).expect("ready");
        assert_eq!(schema.fields[0].footprint, REFERENCE_SIZE);
        assert!(!schema.fields[0].in_header());
        assert_eq!(schema.fields[1].offset(), 4);
    }

    #[test]
    fn test_inline_threshold() {
        let mut deriver = SchemaDeriver::new();
        deriver.declare(
            StructBuilder::new("geo.Vec2")
                .field("x", ScalarKind::F32)
                .field("y", ScalarKind::F32)
                .build(),
        );
        deriver.declare(
            StructBuilder::new("geo.Vec3")
                .field("x", ScalarKind::F32)
                .field("y", ScalarKind::F32)
                .field("z", ScalarKind::F32)
                .string_field("label")
                .build(),
        );
        deriver.register_strategy(Arc::new(InlineStrategy::new("geo.Vec2")));
        deriver.register_strategy(Arc::new(InlineStrategy::new("geo.Vec3")));

        let id = deriver
            .derive_descriptor(
                StructBuilder::new("geo.Body")
                    .record_field("pos", "geo.Vec2")
                    .record_field("vel", "geo.Vec3")
                    .build(),
            )
            .expect("derive");
        let schema = deriver.schema(id).expect("ready");

        // 8-byte composite sits in the header.
        assert_eq!(schema.fields[0].footprint, 8);
        assert_eq!(schema.fields[0].descriptor.type_tag, TypeTag::Inline);
        // 12 bytes of floats plus the label reference: out of line.
        assert_eq!(schema.fields[1].footprint, REFERENCE_SIZE);
        assert_eq!(schema.fixed_header_size, 12);
        assert!(deriver.warnings().is_empty());

        let Codec::Inline(vel) = &schema.fields[1].codec else {
            panic!("vel is not inline: {:?}", schema.fields[1].codec);
        };
        assert_eq!(vel.size, 16);
        assert!(!vel.by_value);
        let label = vel.fields.iter().find(|f| f.name == "label").expect("label kept");
        assert_eq!(label.offset, 12);
        assert!(!label.in_slot());
    }

    #[test]
    fn test_inline_cycle_is_rejected_and_rolled_back() {
        let mut deriver = SchemaDeriver::new();
        deriver.declare(
            StructBuilder::new("cyc.A")
                .field("n", ScalarKind::U8)
                .record_field("b", "cyc.B")
                .build(),
        );
        deriver.declare(
            StructBuilder::new("cyc.B")
                .field("m", ScalarKind::U8)
                .record_field("a", "cyc.A")
                .build(),
        );
        deriver.register_strategy(Arc::new(InlineStrategy::new("cyc.A")));
        deriver.register_strategy(Arc::new(InlineStrategy::new("cyc.B")));

        let err = deriver.derive_schema("cyc.A").expect_err("cycle");
        match err {
            DeriveError::Recursion { path, .. } => assert!(path.contains("cyc.B")),
            other => panic!("expected recursion, got {}", other),
        }
        assert_eq!(deriver.state("cyc.A"), DerivationState::Unresolved);
        assert!(deriver.schemas().is_empty());
    }

    #[test]
    fn test_unknown_type() {
        let mut deriver = SchemaDeriver::new();
        assert!(matches!(
            deriver.derive_schema("app.Nope"),
            Err(DeriveError::UnknownType(name)) if name == "app.Nope"
        ));
    }
}
