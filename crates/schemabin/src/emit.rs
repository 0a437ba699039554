// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema description export.
//!
//! Flattens derived schemas into a serializable tree for external code
//! emitters: header layout, wire tags, and the codec tree of every field.
//! Each codec node carries a binding name (`v0`, `v1`, ...) that is unique
//! within one [`describe_schema`] call, so an emitter can declare one local
//! per node without tracking scopes itself.

use serde::Serialize;

use crate::codec::Codec;
use crate::error::{WireError, WireResult};
use crate::schema::{SchemaField, SchemaId, SchemaSet};
use crate::types::{ScalarKind, TypeTag};

/// Hands out binding names for one describe call.
#[derive(Debug, Default)]
pub struct TokenCounter {
    next: usize,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&mut self) -> String {
        let token = format!("v{}", self.next);
        self.next += 1;
        token
    }

    /// Number of tokens issued so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescription {
    pub id: u32,
    pub type_name: String,
    /// Identity hash, hex.
    pub identity: String,
    pub fixed_header_size: u32,
    pub fields: Vec<FieldDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescription {
    pub name: String,
    pub source_name: String,
    pub offset: u32,
    pub tag: TypeTag,
    pub footprint: u32,
    pub in_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub codec: CodecDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecDescription {
    Scalar {
        binding: String,
        scalar: ScalarKind,
    },
    String {
        binding: String,
    },
    List {
        binding: String,
        element: Box<CodecDescription>,
    },
    Map {
        binding: String,
        key: Box<CodecDescription>,
        value: Box<CodecDescription>,
    },
    Optional {
        binding: String,
        inner: Box<CodecDescription>,
    },
    Record {
        binding: String,
        schema: u32,
        type_name: String,
    },
    Inline {
        binding: String,
        type_name: String,
        size: u32,
        by_value: bool,
        fields: Vec<InlineFieldDescription>,
    },
    Custom {
        binding: String,
        name: String,
        tag: TypeTag,
    },
}

impl CodecDescription {
    pub fn binding(&self) -> &str {
        match self {
            Self::Scalar { binding, .. }
            | Self::String { binding }
            | Self::List { binding, .. }
            | Self::Map { binding, .. }
            | Self::Optional { binding, .. }
            | Self::Record { binding, .. }
            | Self::Inline { binding, .. }
            | Self::Custom { binding, .. } => binding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineFieldDescription {
    pub name: String,
    pub offset: u32,
    /// False when the slot holds a reference to an out-of-line payload.
    pub in_slot: bool,
    pub codec: CodecDescription,
}

/// Describe schema `id` of `set`.
pub fn describe_schema(set: &SchemaSet, id: SchemaId) -> WireResult<SchemaDescription> {
    let schema = set.get(id).ok_or(WireError::UnknownSchema(id))?;
    let mut tokens = TokenCounter::new();

    let fields = schema
        .fields
        .iter()
        .map(|field| describe_field(set, field, &mut tokens))
        .collect();

    Ok(SchemaDescription {
        id: id.0,
        type_name: schema.type_name.clone(),
        identity: format!("{:016x}", schema.identity.0),
        fixed_header_size: schema.fixed_header_size,
        fields,
    })
}

/// Describe every completed schema of `set`, in id order.
pub fn describe_all(set: &SchemaSet) -> Vec<SchemaDescription> {
    set.iter()
        .filter_map(|(id, _)| describe_schema(set, id).ok())
        .collect()
}

pub fn to_json(descriptions: &[SchemaDescription]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(descriptions)
}

fn describe_field(set: &SchemaSet, field: &SchemaField, tokens: &mut TokenCounter) -> FieldDescription {
    FieldDescription {
        name: field.wire_name().to_string(),
        source_name: field.source_name.clone(),
        offset: field.offset(),
        tag: field.descriptor.type_tag,
        footprint: field.footprint,
        in_header: field.in_header(),
        default: field.default_literal.clone(),
        codec: describe_codec(set, &field.codec, tokens),
    }
}

fn describe_codec(set: &SchemaSet, codec: &Codec, tokens: &mut TokenCounter) -> CodecDescription {
    let binding = tokens.next_token();
    match codec {
        Codec::Scalar(kind) => CodecDescription::Scalar {
            binding,
            scalar: *kind,
        },
        Codec::String => CodecDescription::String { binding },
        Codec::List(elem) => CodecDescription::List {
            binding,
            element: Box::new(describe_codec(set, elem, tokens)),
        },
        Codec::Map(key, val) => CodecDescription::Map {
            binding,
            key: Box::new(describe_codec(set, key, tokens)),
            value: Box::new(describe_codec(set, val, tokens)),
        },
        Codec::Optional(inner) => CodecDescription::Optional {
            binding,
            inner: Box::new(describe_codec(set, inner, tokens)),
        },
        // Referenced by id only, so self-references terminate.
        Codec::Record(id) => CodecDescription::Record {
            binding,
            schema: id.0,
            type_name: set
                .get(*id)
                .map(|s| s.type_name.clone())
                .unwrap_or_default(),
        },
        Codec::Inline(layout) => CodecDescription::Inline {
            binding,
            type_name: layout.type_name.clone(),
            size: layout.size,
            by_value: layout.by_value,
            fields: layout
                .fields
                .iter()
                .map(|f| InlineFieldDescription {
                    name: f.name.clone(),
                    offset: f.offset,
                    in_slot: f.in_slot(),
                    codec: describe_codec(set, &f.codec, tokens),
                })
                .collect(),
        },
        Codec::Custom(custom) => CodecDescription::Custom {
            binding,
            name: custom.name().to_string(),
            tag: custom.type_tag(),
        },
    }
}
