// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy.
//!
//! - [`DerivationWarning`]: per-field derivation problem, logged and collected
//! - [`DeriveError`]: derivation cannot produce a schema at all
//! - [`WireError`]: a single encode/decode operation failed; the stream is
//!   not trustworthy past this point

use std::fmt;
use std::io;
use thiserror::Error;

use crate::schema::SchemaId;
use crate::types::TypeTag;
use crate::value::ValueError;

/// Schema derivation failures.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// An inline composite contains itself by value.
    #[error("inline composite `{type_name}` contains itself by value (via {path})")]
    Recursion { type_name: String, path: String },

    #[error("record type `{0}` is not declared in the type catalog")]
    UnknownType(String),

    #[error("no codec strategy accepts `{0}`")]
    Unsupported(String),
}

/// A per-field derivation problem. The field is dropped (or its default
/// ignored) and derivation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationWarning {
    NoStrategy {
        record: String,
        field: String,
        ty: String,
    },
    DuplicateWireName {
        record: String,
        field: String,
        wire_name: String,
    },
    InvalidDefault {
        record: String,
        field: String,
        literal: String,
    },
}

impl fmt::Display for DerivationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStrategy { record, field, ty } => {
                write!(f, "{}.{}: no codec strategy for `{}`, field skipped", record, field, ty)
            }
            Self::DuplicateWireName {
                record,
                field,
                wire_name,
            } => write!(
                f,
                "{}.{}: wire name `{}` already used, field skipped",
                record, field, wire_name
            ),
            Self::InvalidDefault {
                record,
                field,
                literal,
            } => write!(
                f,
                "{}.{}: default `{}` does not parse, zero value used instead",
                record, field, literal
            ),
        }
    }
}

/// Encode/decode failures.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stream truncated at offset {offset}")]
    Truncated { offset: u64 },

    #[error("unknown type tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    #[error("expected {expected} but stream holds {found} at offset {offset}")]
    TagMismatch {
        expected: TypeTag,
        found: TypeTag,
        offset: u64,
    },

    #[error("inline composite at offset {offset} cannot be decoded without its type")]
    Opaque { offset: u64 },

    #[error("schema index {0} is not in the schema table")]
    UnknownSchemaIndex(u32),

    #[error("schema {0} is unknown or still in preparation")]
    UnknownSchema(SchemaId),

    #[error("no schema derived for record type `{0}`")]
    NotDerived(String),

    #[error("field `{field}` at offset {offset} lies outside a {size}-byte block")]
    OffsetOutOfBounds { field: String, offset: u32, size: u32 },

    #[error("{what} of {len} exceeds the limit of {limit}")]
    TooLarge { what: &'static str, len: u64, limit: u64 },

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid presence flag {flag:#04x} at offset {offset}")]
    InvalidFlag { flag: u8, offset: u64 },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: u64 },

    #[error("value does not fit codec: expected {expected}, got {got}")]
    ValueMismatch { expected: String, got: String },

    #[error("block of {0} bytes exceeds the 32-bit addressable range")]
    AddressOverflow(u64),

    #[error("offset {global} precedes the active view base {base}")]
    OutsideView { global: u64, base: u64 },

    #[error("view stack underflow")]
    ViewUnderflow,

    #[error("custom codec `{codec}`: {reason}")]
    Custom { codec: String, reason: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl WireError {
    /// True when the reader's type disagrees with the stream but the stream
    /// itself is intact, so the enclosing field can fall back to its default.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::TagMismatch { .. } | Self::Opaque { .. })
    }
}

pub type WireResult<T> = Result<T, WireError>;
