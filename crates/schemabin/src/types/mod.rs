// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model: wire tags and static record descriptors.

mod builder;
mod descriptor;
mod tag;

pub use builder::StructBuilder;
pub use descriptor::{FieldDef, FieldTags, ScalarKind, StructDescriptor, TypeCatalog, TypeRef};
pub use tag::TypeTag;
