// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type descriptors.
//!
//! A descriptor is the only input schema derivation looks at: an ordered
//! field list per record type, with field types expressed as [`TypeRef`].
//! Records reference each other by name through the [`TypeCatalog`], which
//! is what makes self-referential and mutually recursive records
//! expressible without runtime type inspection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeTag;

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    Isize,
    F32,
    F64,
    Bool,
}

impl ScalarKind {
    /// Every scalar kind, in default strategy installation order.
    pub const ALL: [ScalarKind; 13] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::Usize,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Isize,
        Self::F32,
        Self::F64,
        Self::Bool,
    ];

    /// Size in bytes on the wire.
    pub fn size(self) -> u32 {
        match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 | Self::Usize | Self::Isize => 8,
        }
    }

    /// Wire tag for this kind.
    pub fn tag(self) -> TypeTag {
        match self {
            Self::U8 => TypeTag::U8,
            Self::U16 => TypeTag::U16,
            Self::U32 => TypeTag::U32,
            Self::U64 => TypeTag::U64,
            Self::Usize => TypeTag::Usize,
            Self::I8 => TypeTag::I8,
            Self::I16 => TypeTag::I16,
            Self::I32 => TypeTag::I32,
            Self::I64 => TypeTag::I64,
            Self::Isize => TypeTag::Isize,
            Self::F32 => TypeTag::F32,
            Self::F64 => TypeTag::F64,
            Self::Bool => TypeTag::Bool,
        }
    }

    /// Inverse of [`ScalarKind::tag`].
    pub fn from_tag(tag: TypeTag) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Scalar(ScalarKind),
    String,
    List(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Optional(Box<TypeRef>),
    /// Record type, by catalog name.
    Struct(String),
    /// A type no default strategy understands.
    Opaque(String),
}

impl TypeRef {
    pub fn list(element: TypeRef) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn optional(inner: TypeRef) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind.tag()),
            Self::String => f.write_str("string"),
            Self::List(elem) => write!(f, "list<{}>", elem),
            Self::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            Self::Optional(inner) => write!(f, "optional<{}>", inner),
            Self::Struct(name) => f.write_str(name),
            Self::Opaque(name) => write!(f, "opaque<{}>", name),
        }
    }
}

/// Per-field directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldTags {
    /// Drop the field from the schema.
    pub ignore: bool,
    /// Wire name override.
    pub rename: Option<String>,
    /// Literal used when the wire carries no data for this field.
    pub default: Option<String>,
}

impl FieldTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Parse a directive string such as `"rename=user_id,default=7"`.
    ///
    /// `-` alone means ignore. Unknown keys are reported as `Err(key)`.
    pub fn parse(directives: &str) -> Result<Self, String> {
        let mut tags = Self::default();
        for part in directives.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some(("rename", value)) => tags.rename = Some(value.trim().to_string()),
                Some(("default", value)) => tags.default = Some(value.trim().to_string()),
                None if part == "ignore" || part == "-" => tags.ignore = true,
                Some((key, _)) => return Err(key.to_string()),
                None => return Err(part.to_string()),
            }
        }
        Ok(tags)
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub tags: FieldTags,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tags: FieldTags::default(),
        }
    }

    pub fn with_tags(mut self, tags: FieldTags) -> Self {
        self.tags = tags;
        self
    }

    /// Name this field travels under.
    pub fn wire_name(&self) -> &str {
        self.tags.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered field list of one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDescriptor {
    /// Qualified type name; the stable identity of the derived schema.
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Name-indexed set of record descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    structs: HashMap<String, Arc<StructDescriptor>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor.
    pub fn insert(&mut self, descriptor: StructDescriptor) {
        self.structs
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<StructDescriptor>> {
        self.structs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<StructDescriptor>> {
        self.structs.values()
    }

    /// Load descriptors from a JSON array.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let list: Vec<StructDescriptor> = serde_json::from_str(json)?;
        Ok(list.into_iter().collect())
    }

    /// Load descriptors from a YAML sequence.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let list: Vec<StructDescriptor> = serde_yaml::from_str(yaml)?;
        Ok(list.into_iter().collect())
    }
}

impl FromIterator<StructDescriptor> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = StructDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tags_are_consistent() {
        for kind in ScalarKind::ALL {
            assert_eq!(kind.tag().scalar_width(), Some(kind.size()));
            assert_eq!(ScalarKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ScalarKind::from_tag(TypeTag::String), None);
    }

    #[test]
    fn test_tags_parse() {
        let tags = FieldTags::parse("rename=user_id, default=7").expect("valid directives");
        assert_eq!(tags.rename.as_deref(), Some("user_id"));
        assert_eq!(tags.default.as_deref(), Some("7"));
        assert!(!tags.ignore);

        assert!(FieldTags::parse("-").expect("dash").ignore);
        assert!(FieldTags::parse("ignore").expect("ignore").ignore);
        assert_eq!(FieldTags::parse("colour=red"), Err("colour".to_string()));
    }

    #[test]
    fn test_wire_name() {
        let field = FieldDef::new("id", TypeRef::Scalar(ScalarKind::U32));
        assert_eq!(field.wire_name(), "id");
        let renamed = field.with_tags(FieldTags::new().rename("key"));
        assert_eq!(renamed.wire_name(), "key");
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::map(
            TypeRef::Scalar(ScalarKind::I32),
            TypeRef::list(TypeRef::optional(TypeRef::String)),
        );
        assert_eq!(ty.to_string(), "map<i32, list<optional<string>>>");
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {"name": "app.Node", "fields": [
                {"name": "value", "ty": {"scalar": "u32"}},
                {"name": "label", "ty": "string", "tags": {"rename": "name"}},
                {"name": "next", "ty": {"optional": {"struct": "app.Node"}}}
            ]}
        ]"#;
        let catalog = TypeCatalog::from_json_str(json).expect("valid catalog");
        assert_eq!(catalog.len(), 1);
        let node = catalog.get("app.Node").expect("node declared");
        assert_eq!(node.fields.len(), 3);
        assert_eq!(node.fields[1].wire_name(), "name");
        assert_eq!(
            node.fields[2].ty,
            TypeRef::optional(TypeRef::record("app.Node"))
        );
    }
}
