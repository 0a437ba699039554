// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for StructDescriptor.

use crate::types::{FieldDef, FieldTags, ScalarKind, StructDescriptor, TypeRef};

/// Builder for creating StructDescriptor instances.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl StructBuilder {
    /// Create a new builder for a record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a scalar field.
    pub fn field(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.field_with_type(name, TypeRef::Scalar(kind))
    }

    /// Add a field with an arbitrary type.
    pub fn field_with_type(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Add a field carrying directives.
    pub fn field_with_tags(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        tags: FieldTags,
    ) -> Self {
        self.fields.push(FieldDef::new(name, ty).with_tags(tags));
        self
    }

    /// Add a prebuilt field definition.
    pub fn field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field_with_type(name, TypeRef::String)
    }

    /// Add a list field.
    pub fn list_field(self, name: impl Into<String>, element: TypeRef) -> Self {
        self.field_with_type(name, TypeRef::list(element))
    }

    /// Add a map field.
    pub fn map_field(self, name: impl Into<String>, key: TypeRef, value: TypeRef) -> Self {
        self.field_with_type(name, TypeRef::map(key, value))
    }

    /// Add an optional field.
    pub fn optional_field(self, name: impl Into<String>, inner: TypeRef) -> Self {
        self.field_with_type(name, TypeRef::optional(inner))
    }

    /// Add a nested record field.
    pub fn record_field(self, name: impl Into<String>, record: impl Into<String>) -> Self {
        self.field_with_type(name, TypeRef::record(record))
    }

    /// Build the descriptor.
    pub fn build(self) -> StructDescriptor {
        StructDescriptor::new(self.name, self.fields)
    }
}
