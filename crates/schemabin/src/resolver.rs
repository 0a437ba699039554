// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Strategy resolution.
//!
//! A [`CodecStrategy`] answers "can I encode this declared type?" and, if
//! chosen, produces the field's [`Codec`]. The [`StrategyResolver`] tries
//! strategies newest first, so a strategy registered later shadows the
//! defaults for the types it accepts.

use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::derive::SchemaDeriver;
use crate::error::DeriveError;
use crate::strategies::{
    ListStrategy, MapStrategy, OptionalStrategy, RecordStrategy, ScalarStrategy, StringStrategy,
};
use crate::types::{FieldTags, ScalarKind, TypeRef};

/// One entry of the capability table.
pub trait CodecStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Capability predicate over the declared type.
    ///
    /// Container strategies should only accept a type when its element
    /// types resolve too, so an unsupported element surfaces as an
    /// unsupported field rather than a derivation failure.
    fn can_handle(&self, ty: &TypeRef, tags: &FieldTags, deriver: &SchemaDeriver) -> bool;

    /// Produce the codec. May recurse into the deriver for referenced
    /// records, container elements and inline composites.
    fn resolve(
        &self,
        ty: &TypeRef,
        tags: &FieldTags,
        deriver: &mut SchemaDeriver,
    ) -> Result<Codec, DeriveError>;
}

/// Ordered strategy list, last registered wins.
#[derive(Clone, Default)]
pub struct StrategyResolver {
    strategies: Vec<Arc<dyn CodecStrategy>>,
}

impl StrategyResolver {
    /// An empty resolver; nothing resolves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default installation: record, scalars, string, list, map, optional.
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new();
        resolver.register(Arc::new(RecordStrategy));
        for kind in ScalarKind::ALL {
            resolver.register(Arc::new(ScalarStrategy::new(kind)));
        }
        resolver.register(Arc::new(StringStrategy));
        resolver.register(Arc::new(ListStrategy));
        resolver.register(Arc::new(MapStrategy));
        resolver.register(Arc::new(OptionalStrategy));
        resolver
    }

    pub fn register(&mut self, strategy: Arc<dyn CodecStrategy>) {
        log::debug!("[resolver] registered strategy {}", strategy.name());
        self.strategies.push(strategy);
    }

    /// Most recently registered strategy accepting `ty`.
    pub fn resolve(
        &self,
        ty: &TypeRef,
        tags: &FieldTags,
        deriver: &SchemaDeriver,
    ) -> Option<Arc<dyn CodecStrategy>> {
        self.strategies
            .iter()
            .rev()
            .find(|s| s.can_handle(ty, tags, deriver))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Debug for StrategyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyResolver")
            .field("strategies", &self.names())
            .finish()
    }
}
