// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream addressing.
//!
//! Offsets recorded inside a record block are relative to that block's own
//! start (*local*), which keeps blocks relocatable. The stream cursor is
//! *global*. [`StreamView`] keeps the stack of block bases and converts
//! between the two; it never touches the stream itself.

use std::io::{Read, Seek, Write};

use crate::error::WireError;

/// Random-access sink.
pub trait WriteSeek: Write + Seek {}
impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Random-access source.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Stack of nested view bases. An empty stack is the root view (base 0).
#[derive(Debug, Clone, Default)]
pub struct StreamView {
    bases: Vec<u64>,
}

impl StreamView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global base of the innermost view.
    pub fn base(&self) -> u64 {
        self.bases.last().copied().unwrap_or(0)
    }

    /// Number of pushed views.
    pub fn depth(&self) -> usize {
        self.bases.len()
    }

    /// Enter a child block anchored at `global_base`.
    pub fn push(&mut self, global_base: u64) {
        self.bases.push(global_base);
    }

    /// Leave the innermost block, returning its base.
    pub fn pop(&mut self) -> Result<u64, WireError> {
        self.bases.pop().ok_or(WireError::ViewUnderflow)
    }

    /// Drop views above `depth`; used to restore the frame after a failed
    /// nested read.
    pub fn truncate(&mut self, depth: usize) {
        self.bases.truncate(depth);
    }

    pub fn to_global(&self, local: u32) -> u64 {
        self.base() + u64::from(local)
    }

    pub fn to_local(&self, global: u64) -> Result<u32, WireError> {
        let base = self.base();
        let local = global
            .checked_sub(base)
            .ok_or(WireError::OutsideView { global, base })?;
        u32::try_from(local).map_err(|_| WireError::AddressOverflow(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_view_is_identity() {
        let view = StreamView::new();
        assert_eq!(view.base(), 0);
        assert_eq!(view.to_global(12), 12);
        assert_eq!(view.to_local(12).expect("in range"), 12);
    }

    #[test]
    fn test_nested_views_restore_parent_frame() {
        let mut view = StreamView::new();
        view.push(100);
        assert_eq!(view.to_global(8), 108);

        view.push(140);
        assert_eq!(view.to_local(150).expect("inside child"), 10);
        assert_eq!(view.pop().expect("child"), 140);

        // Parent frame is back exactly.
        assert_eq!(view.to_local(150).expect("inside parent"), 50);
        assert_eq!(view.pop().expect("parent"), 100);
        assert!(matches!(view.pop(), Err(WireError::ViewUnderflow)));
    }

    #[test]
    fn test_offset_before_base_is_rejected() {
        let mut view = StreamView::new();
        view.push(64);
        assert!(matches!(
            view.to_local(10),
            Err(WireError::OutsideView { global: 10, base: 64 })
        ));
    }

    #[test]
    fn test_local_offsets_are_32_bit() {
        let mut view = StreamView::new();
        view.push(0);
        assert!(matches!(
            view.to_local(u64::from(u32::MAX) + 1),
            Err(WireError::AddressOverflow(_))
        ));
    }

    #[test]
    fn test_truncate() {
        let mut view = StreamView::new();
        view.push(1);
        view.push(2);
        view.push(3);
        view.truncate(1);
        assert_eq!(view.depth(), 1);
        assert_eq!(view.base(), 1);
    }
}
