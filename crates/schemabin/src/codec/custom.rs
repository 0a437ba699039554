// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Caller-supplied codecs.

use std::any::Any;
use std::fmt;

use crate::config::REFERENCE_SIZE;
use crate::error::{WireError, WireResult};
use crate::reader::SchemaReader;
use crate::types::TypeTag;
use crate::value::Value;
use crate::writer::SchemaWriter;

/// Encoder/decoder for a field shape the built-in codecs do not cover, or
/// a faster rendition of one they do.
///
/// The tag reported here goes into the schema table, so the bytes written
/// must be decodable by a raw reader that only knows that tag (use
/// [`TypeTag::Inline`] for anything a raw reader should skip).
///
/// `context` is whatever the caller passed to `write_from`/`read_into`.
pub trait CustomCodec: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn type_tag(&self) -> TypeTag;

    fn wire_size(&self) -> u32 {
        REFERENCE_SIZE
    }

    fn is_variable_size(&self) -> bool {
        true
    }

    fn stores_by_value(&self) -> bool {
        true
    }

    fn write(
        &self,
        writer: &mut SchemaWriter<'_>,
        value: &Value,
        context: &mut dyn Any,
    ) -> WireResult<()>;

    fn read(&self, reader: &mut SchemaReader<'_>, context: &mut dyn Any) -> WireResult<Value>;

    fn zero_value(&self) -> Value;

    fn parse_default(&self, _literal: &str) -> Option<Value> {
        None
    }
}

/// Bulk `list<u8>` codec.
///
/// Same bytes as the default list codec (`u8` tag, count, elements) but
/// moved in one `write_all`/`read_exact` and surfaced as [`Value::Bytes`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteStringCodec;

impl CustomCodec for ByteStringCodec {
    fn name(&self) -> &str {
        "byte-string"
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::List
    }

    fn write(
        &self,
        writer: &mut SchemaWriter<'_>,
        value: &Value,
        _context: &mut dyn Any,
    ) -> WireResult<()> {
        let owned;
        let bytes: &[u8] = match value {
            Value::Bytes(bytes) => bytes,
            Value::List(items) => {
                owned = items
                    .iter()
                    .map(|item| match item {
                        Value::U8(b) => Ok(*b),
                        other => Err(WireError::ValueMismatch {
                            expected: "u8".into(),
                            got: other.kind().into(),
                        }),
                    })
                    .collect::<WireResult<Vec<u8>>>()?;
                &owned
            }
            other => {
                return Err(WireError::ValueMismatch {
                    expected: "bytes".into(),
                    got: other.kind().into(),
                })
            }
        };

        let count = u32::try_from(bytes.len())
            .map_err(|_| WireError::AddressOverflow(bytes.len() as u64))?;
        writer.write_tag(TypeTag::U8)?;
        writer.write_u32(count)?;
        writer.write_bytes(bytes)
    }

    fn read(&self, reader: &mut SchemaReader<'_>, _context: &mut dyn Any) -> WireResult<Value> {
        reader.expect_tag(TypeTag::U8)?;
        let count = reader.read_count("byte-string length")?;
        Ok(Value::Bytes(reader.read_bytes(count)?))
    }

    fn zero_value(&self) -> Value {
        Value::Bytes(Vec::new())
    }
}
