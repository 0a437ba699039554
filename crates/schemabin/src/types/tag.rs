// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire type tags
//!
//! Every tag is a single byte. `Record` is 0 so containers can test
//! "is my element a nested record" with a plain comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// TypeTag identifies the wire shape of a field or container element.
///
/// Tags are written:
/// - once per field in the schema table
/// - once per container (list element, map key/value, optional payload)
///
/// Scalars stored in a record header never carry a tag of their own; the
/// schema implies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeTag {
    // --- Composites ---
    /// Nested record (schema index + sized block)
    Record = 0,

    /// Key/value container
    Map = 1,

    /// Homogeneous sequence
    List = 2,

    // --- Unsigned integers ---
    U8 = 3,
    U16 = 4,
    U32 = 5,
    U64 = 6,

    /// Machine-width unsigned integer, always 8 bytes on the wire
    Usize = 7,

    // --- Signed integers ---
    I8 = 8,
    I16 = 9,
    I32 = 10,
    I64 = 11,

    /// Machine-width signed integer, always 8 bytes on the wire
    Isize = 12,

    // --- Floating point ---
    F32 = 13,
    F64 = 14,

    /// Boolean (1 byte, 0 or 1)
    Bool = 15,

    /// Length-prefixed UTF-8 string
    String = 16,

    /// Presence flag + conditional payload
    Optional = 17,

    /// Fixed-size composite embedded by value (opaque to raw readers)
    Inline = 18,
}

impl TypeTag {
    /// Convert to u8 value
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from u8 value
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Record),
            1 => Some(Self::Map),
            2 => Some(Self::List),
            3 => Some(Self::U8),
            4 => Some(Self::U16),
            5 => Some(Self::U32),
            6 => Some(Self::U64),
            7 => Some(Self::Usize),
            8 => Some(Self::I8),
            9 => Some(Self::I16),
            10 => Some(Self::I32),
            11 => Some(Self::I64),
            12 => Some(Self::Isize),
            13 => Some(Self::F32),
            14 => Some(Self::F64),
            15 => Some(Self::Bool),
            16 => Some(Self::String),
            17 => Some(Self::Optional),
            18 => Some(Self::Inline),
            _ => None,
        }
    }

    /// Check if this is a fixed-width scalar tag
    pub const fn is_scalar(self) -> bool {
        (self as u8) >= (Self::U8 as u8) && (self as u8) <= (Self::Bool as u8)
    }

    /// Wire width of a scalar tag, `None` for everything else
    pub const fn scalar_width(self) -> Option<u32> {
        match self {
            Self::U8 | Self::I8 | Self::Bool => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::Usize | Self::Isize | Self::F64 => Some(8),
            _ => None,
        }
    }

    /// Lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Map => "map",
            Self::List => "list",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Optional => "optional",
            Self::Inline => "inline",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for raw in 0u8..=18 {
            let tag = TypeTag::from_u8(raw).expect("tag in closed range");
            assert_eq!(tag.to_u8(), raw);
        }
        assert_eq!(TypeTag::from_u8(19), None);
        assert_eq!(TypeTag::from_u8(0xFF), None);
    }

    #[test]
    fn test_record_is_zero() {
        assert_eq!(TypeTag::Record.to_u8(), 0);
    }

    #[test]
    fn test_scalar_classification() {
        assert!(TypeTag::U8.is_scalar());
        assert!(TypeTag::Bool.is_scalar());
        assert!(TypeTag::F64.is_scalar());
        assert!(!TypeTag::String.is_scalar());
        assert!(!TypeTag::Record.is_scalar());
        assert!(!TypeTag::Inline.is_scalar());

        assert_eq!(TypeTag::Usize.scalar_width(), Some(8));
        assert_eq!(TypeTag::Bool.scalar_width(), Some(1));
        assert_eq!(TypeTag::List.scalar_width(), None);
    }
}
