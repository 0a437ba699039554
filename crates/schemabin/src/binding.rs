// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed bindings between Rust values and [`Value`].
//!
//! [`SchemaType`] is implemented here for scalars, `String` and the std
//! containers; `#[derive(Schematic)]` implements it for records.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::types::{ScalarKind, StructDescriptor, TypeCatalog, TypeRef};
use crate::value::{Value, ValueError};

/// A Rust type with a static type descriptor and a value binding.
pub trait SchemaType: Sized {
    /// Declared type as seen by schema derivation.
    fn type_ref() -> TypeRef;

    /// Register every record type reachable from `Self` in `catalog`.
    fn declare(_catalog: &mut TypeCatalog) {}

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// A record type. Implemented by `#[derive(Schematic)]`.
pub trait Schematic: SchemaType {
    /// Qualified type name; the stable identity of the derived schema.
    const TYPE_NAME: &'static str;

    fn struct_descriptor() -> StructDescriptor;
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident, $kind:ident) => {
        impl SchemaType for $ty {
            fn type_ref() -> TypeRef {
                TypeRef::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(ValueError::mismatch(stringify!($ty), &other)),
                }
            }
        }
    };
}

impl_scalar!(bool, Bool, Bool);
impl_scalar!(u8, U8, U8);
impl_scalar!(u16, U16, U16);
impl_scalar!(u32, U32, U32);
impl_scalar!(u64, U64, U64);
impl_scalar!(i8, I8, I8);
impl_scalar!(i16, I16, I16);
impl_scalar!(i32, I32, I32);
impl_scalar!(i64, I64, I64);
impl_scalar!(f32, F32, F32);
impl_scalar!(f64, F64, F64);

// Machine-width integers travel as 64 bits.
macro_rules! impl_machine_width {
    ($ty:ty, $wide:ty, $variant:ident, $kind:ident) => {
        impl SchemaType for $ty {
            fn type_ref() -> TypeRef {
                TypeRef::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self as $wide)
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => <$ty>::try_from(v).map_err(|_| ValueError::Overflow {
                        value: v.to_string(),
                        target: stringify!($ty),
                    }),
                    other => Err(ValueError::mismatch(stringify!($ty), &other)),
                }
            }
        }
    };
}

impl_machine_width!(usize, u64, Usize, Usize);
impl_machine_width!(isize, i64, Isize, Isize);

impl SchemaType for String {
    fn type_ref() -> TypeRef {
        TypeRef::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }
}

impl<T: SchemaType> SchemaType for Vec<T> {
    fn type_ref() -> TypeRef {
        TypeRef::list(T::type_ref())
    }

    fn declare(catalog: &mut TypeCatalog) {
        T::declare(catalog);
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(SchemaType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            // A byte-string codec hands back list<u8> in bulk.
            Value::Bytes(bytes) => bytes
                .into_iter()
                .map(|b| T::from_value(Value::U8(b)))
                .collect(),
            other => Err(ValueError::mismatch("list", &other)),
        }
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    fn type_ref() -> TypeRef {
        TypeRef::optional(T::type_ref())
    }

    fn declare(catalog: &mut TypeCatalog) {
        T::declare(catalog);
    }

    fn to_value(&self) -> Value {
        Value::Optional(self.as_ref().map(|v| Box::new(v.to_value())))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Optional(None) => Ok(None),
            Value::Optional(Some(inner)) => T::from_value(*inner).map(Some),
            other => Err(ValueError::mismatch("optional", &other)),
        }
    }
}

impl<T: SchemaType> SchemaType for Box<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn declare(catalog: &mut TypeCatalog) {
        T::declare(catalog);
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Box::new)
    }
}

fn map_entries<K: SchemaType, V: SchemaType>(
    value: Value,
) -> Result<impl Iterator<Item = Result<(K, V), ValueError>>, ValueError> {
    match value {
        Value::Map(entries) => Ok(entries.into_iter().map(
            |(k, v)| -> Result<(K, V), ValueError> { Ok((K::from_value(k)?, V::from_value(v)?)) },
        )),
        other => Err(ValueError::mismatch("map", &other)),
    }
}

impl<K, V> SchemaType for HashMap<K, V>
where
    K: SchemaType + Eq + Hash,
    V: SchemaType,
{
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }

    fn declare(catalog: &mut TypeCatalog) {
        K::declare(catalog);
        V::declare(catalog);
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(value)?.collect()
    }
}

impl<K, V> SchemaType for BTreeMap<K, V>
where
    K: SchemaType + Ord,
    V: SchemaType,
{
    fn type_ref() -> TypeRef {
        TypeRef::map(K::type_ref(), V::type_ref())
    }

    fn declare(catalog: &mut TypeCatalog) {
        K::declare(catalog);
        V::declare(catalog);
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(value)?.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_binding() {
        assert_eq!(42u32.to_value(), Value::U32(42));
        assert_eq!(u32::from_value(Value::U32(42)), Ok(42));
        assert!(u32::from_value(Value::U64(42)).is_err());
        assert_eq!(u32::type_ref(), TypeRef::Scalar(ScalarKind::U32));
    }

    #[test]
    fn test_machine_width() {
        assert_eq!(5usize.to_value(), Value::Usize(5));
        assert_eq!(isize::from_value(Value::Isize(-3)), Ok(-3));
    }

    #[test]
    fn test_containers() {
        let tags = vec!["a".to_string(), "b".to_string()];
        let value = tags.to_value();
        assert_eq!(Vec::<String>::from_value(value), Ok(tags));

        let bytes = Vec::<u8>::from_value(Value::Bytes(vec![1, 2, 3]));
        assert_eq!(bytes, Ok(vec![1, 2, 3]));

        let maybe: Option<u16> = None;
        assert_eq!(maybe.to_value(), Value::none());
        assert_eq!(Option::<u16>::from_value(Value::some(Value::U16(9))), Ok(Some(9)));
    }

    #[test]
    fn test_map_binding() {
        let mut map = BTreeMap::new();
        map.insert(1i32, "a".to_string());
        map.insert(2i32, "b".to_string());
        let value = map.to_value();
        assert_eq!(value.as_map().map(<[_]>::len), Some(2));
        assert_eq!(BTreeMap::<i32, String>::from_value(value), Ok(map));
        assert_eq!(
            HashMap::<i32, String>::type_ref(),
            TypeRef::map(TypeRef::Scalar(ScalarKind::I32), TypeRef::String)
        );
    }
}
