// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # schemabin - schema-derived binary records
//!
//! Derives a binary layout from a record type's declared fields, then
//! encodes and decodes values of that type against it. Layouts evolve:
//! a reader built from a newer or older version of a type still reads
//! the stream, taking defaults for fields the stream lacks and skipping
//! fields it does not know.
//!
//! ## Quick Start
//!
//! ```rust
//! use schemabin::{SchemaDeriver, SchemaReader, SchemaRegistryReader, SchemaRegistryWriter,
//!                 SchemaWriter, Schematic};
//! use std::io::Cursor;
//!
//! #[derive(Schematic, Debug, PartialEq)]
//! #[schema(name = "app.User")]
//! struct User {
//!     id: u64,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut deriver = SchemaDeriver::new();
//! deriver.derive::<User>()?;
//! let schemas = deriver.into_schemas();
//!
//! let user = User { id: 7, name: "ada".into(), tags: vec!["admin".into()] };
//!
//! let mut registry = SchemaRegistryWriter::new();
//! let mut records = Cursor::new(Vec::new());
//! SchemaWriter::new(&mut records, &schemas, &mut registry).write_from(&user, &mut ())?;
//! let mut table = Vec::new();
//! registry.finalize(&mut table)?;
//!
//! let mut registry = SchemaRegistryReader::read_from(&mut table.as_slice(), &Default::default())?;
//! records.set_position(0);
//! let decoded: User = SchemaReader::new(&mut records, &schemas, &mut registry).read_as(&mut ())?;
//! assert_eq!(decoded, user);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  TypeCatalog (declared types)  ->  SchemaDeriver  ->  SchemaSet      |
//! |                                     | StrategyResolver              |
//! |                                     | (last registered wins)        |
//! +---------------------------------------------------------------------+
//! |  SchemaWriter / SchemaReader  (record protocol, StreamView)         |
//! +---------------------------------------------------------------------+
//! |  SchemaRegistryWriter / SchemaRegistryReader  (schema table)        |
//! +---------------------------------------------------------------------+
//! |  ContainerWriter / ContainerReader  (single-file rendition)         |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - declared type model (descriptors, tags, catalog)
//! - [`derive`] - schema derivation
//! - [`strategies`] / [`resolver`] - codec selection
//! - [`writer`] / [`reader`] - record encoding
//! - [`registry`] - schema table
//! - [`container`] - self-contained files
//! - [`emit`] - schema descriptions for code emitters

// Lets the derive macro's `::schemabin::` paths resolve inside this crate.
extern crate self as schemabin;

pub mod binding;
pub mod codec;
pub mod config;
pub mod container;
pub mod derive;
pub mod emit;
pub mod error;
pub mod reader;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod strategies;
pub mod stream;
pub mod types;
pub mod value;
pub mod writer;

pub use binding::{SchemaType, Schematic};
pub use codec::{ByteStringCodec, Codec, CustomCodec, InlineField, InlineLayout};
pub use config::{CodecConfig, Config, ConfigError, DeriveConfig, MISSING_FIELD_OFFSET};
pub use container::{ContainerError, ContainerReader, ContainerWriter, FileHeader};
pub use derive::SchemaDeriver;
pub use emit::{describe_all, describe_schema, SchemaDescription, TokenCounter};
pub use error::{DerivationWarning, DeriveError, WireError, WireResult};
pub use reader::SchemaReader;
pub use registry::{MaterializedSchema, SchemaRegistryReader, SchemaRegistryWriter};
pub use resolver::{CodecStrategy, StrategyResolver};
pub use schema::{
    DerivationState, FieldDescriptor, RecordSchema, SchemaField, SchemaId, SchemaIdentity,
    SchemaSet,
};
pub use schemabin_derive::Schematic;
pub use strategies::{
    ByteStringStrategy, InlineStrategy, ListStrategy, MapStrategy, OptionalStrategy,
    RecordStrategy, ScalarStrategy, StringStrategy,
};
pub use stream::StreamView;
pub use types::{
    FieldDef, FieldTags, ScalarKind, StructBuilder, StructDescriptor, TypeCatalog, TypeRef,
    TypeTag,
};
pub use value::{Value, ValueError};
pub use writer::SchemaWriter;
