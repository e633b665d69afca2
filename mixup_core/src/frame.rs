// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frames and the frame store.
//!
//! A [`Frame`] captures one requested key ordering and, once the host has
//! painted it off-screen, the measured offset of every cell and the size of
//! the container. A [`FrameStore`] keeps the frames an in-flight animation
//! still diffs against, oldest first, and is collapsed back to a single frame
//! whenever the list comes to rest.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size};

use crate::key::{Key, KeyHash};

/// Identity of a [`Frame`].
///
/// Indices are assigned by a [`FrameStore`] in strictly increasing order and
/// are never reused, so they double as a stable rendering identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(pub u64);

impl fmt::Debug for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameIndex({})", self.0)
    }
}

/// One requested key ordering plus its measured geometry.
#[derive(Clone, Debug)]
pub struct Frame {
    index: FrameIndex,
    keys: Vec<Key>,
    hash: KeyHash,
    positions: BTreeMap<Key, Point>,
    container_size: Option<Size>,
    has_been_measured: bool,
}

impl Frame {
    fn new(index: FrameIndex, keys: Vec<Key>) -> Self {
        let hash = KeyHash::of(&keys);
        Self {
            index,
            keys,
            hash,
            positions: BTreeMap::new(),
            container_size: None,
            has_been_measured: false,
        }
    }

    /// Returns this frame's index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> FrameIndex {
        self.index
    }

    /// Returns the requested ordering.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns the hash of [`keys`](Self::keys).
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &KeyHash {
        &self.hash
    }

    /// Returns `true` if `key` is part of this ordering.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// Returns the measured offset of `key`'s cell, if recorded.
    #[must_use]
    pub fn position(&self, key: &Key) -> Option<Point> {
        self.positions.get(key).copied()
    }

    /// Returns the measured container size, if recorded.
    #[inline]
    #[must_use]
    pub fn container_size(&self) -> Option<Size> {
        self.container_size
    }

    /// Returns `true` once the first layout read for this frame has been
    /// accepted.
    #[inline]
    #[must_use]
    pub fn has_been_measured(&self) -> bool {
        self.has_been_measured
    }

    /// Returns `true` if every key has a position and the container has a
    /// size.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.container_size.is_some() && self.keys.iter().all(|k| self.positions.contains_key(k))
    }

    /// Records the offset of `key`'s cell. Last write wins.
    ///
    /// Returns `false`, recording nothing, if `key` is not part of this
    /// ordering.
    pub fn record_position(&mut self, key: &Key, position: Point) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.positions.insert(key.clone(), position);
        true
    }

    /// Records the container size. Last write wins.
    pub fn record_container_size(&mut self, size: Size) {
        self.container_size = Some(size);
    }

    /// Marks the frame as measured. The flag is never cleared.
    ///
    /// Returns `true` if this call set it.
    pub fn mark_measured(&mut self) -> bool {
        !core::mem::replace(&mut self.has_been_measured, true)
    }
}

/// Ordered frames, oldest first.
///
/// The store is never empty: it is created with an initial frame and every
/// pruning operation keeps at least the latest one.
#[derive(Clone, Debug)]
pub struct FrameStore {
    frames: Vec<Frame>,
    next_index: u64,
}

impl FrameStore {
    /// Creates a store holding a single frame for `keys`.
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self {
            frames: vec![Frame::new(FrameIndex(0), keys)],
            next_index: 1,
        }
    }

    /// Allocates a fresh frame with the next index.
    ///
    /// The frame is not inserted; pass it to [`push`](Self::push) or
    /// [`replace_with`](Self::replace_with).
    pub fn create(&mut self, keys: Vec<Key>) -> Frame {
        let index = FrameIndex(self.next_index);
        self.next_index += 1;
        Frame::new(index, keys)
    }

    /// Appends a frame as the newest.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not newer than the current latest frame.
    pub fn push(&mut self, frame: Frame) {
        assert!(
            frame.index > self.latest().index,
            "frame {:?} pushed out of order",
            frame.index
        );
        self.frames.push(frame);
    }

    /// Replaces every frame with `frame`, returning how many were dropped.
    pub fn replace_with(&mut self, frame: Frame) -> usize {
        let dropped = self.frames.len();
        self.frames.clear();
        self.frames.push(frame);
        dropped
    }

    /// Drops all but the latest frame, returning how many were dropped.
    pub fn truncate_to_latest(&mut self) -> usize {
        let dropped = self.frames.len() - 1;
        self.frames.drain(..dropped);
        dropped
    }

    /// Drops every frame except `index`, returning how many were dropped.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in the store.
    pub fn retain_only(&mut self, index: FrameIndex) -> usize {
        let pos = self.expect_position(index);
        let frame = self.frames.swap_remove(pos);
        self.replace_with(frame)
    }

    /// Drops every frame older than `index`, returning how many were dropped.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in the store.
    pub fn prune_before(&mut self, index: FrameIndex) -> usize {
        let pos = self.expect_position(index);
        self.frames.drain(..pos);
        pos
    }

    /// Returns the frames, oldest first.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the oldest retained frame.
    #[must_use]
    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    /// Returns the newest frame.
    #[must_use]
    pub fn latest(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// Returns the slot of `index`, if retained.
    #[must_use]
    pub fn position(&self, index: FrameIndex) -> Option<usize> {
        self.frames.binary_search_by_key(&index, |f| f.index).ok()
    }

    /// Returns the frame with `index`, if retained.
    #[must_use]
    pub fn get(&self, index: FrameIndex) -> Option<&Frame> {
        self.position(index).map(|pos| &self.frames[pos])
    }

    /// Returns the frame with `index` mutably, if retained.
    #[must_use]
    pub fn get_mut(&mut self, index: FrameIndex) -> Option<&mut Frame> {
        self.position(index).map(|pos| &mut self.frames[pos])
    }

    fn expect_position(&self, index: FrameIndex) -> usize {
        match self.position(index) {
            Some(pos) => pos,
            None => panic!("stale FrameIndex: {index:?} is not in the store"),
        }
    }
}
