//! # Particle Handles
//!
//! A [`ParticleHandle`] names one slot of one segment. It carries the
//! segment's [`SegmentId`], which is unique for the life of the process, so
//! a handle can never be mistaken for a slot of a different or newer segment.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter backing [`SegmentId::next`].
static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a segment. Never reused, even across pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Takes a fresh id.
    pub(crate) fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg#{}", self.0)
    }
}

/// Handle to an allocated particle slot.
///
/// Returned by [`ParticlePool::allocate`](crate::ParticlePool::allocate) and
/// handed back to [`ParticlePool::free`](crate::ParticlePool::free). The
/// `index` is the segment's position in the pool; it is stable because
/// cleanup only removes trailing segments, and `segment` guards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleHandle {
    /// Owning segment.
    pub(crate) segment: SegmentId,
    /// Position of the owning segment in the pool.
    pub(crate) index: u32,
    /// Slot within the owning segment.
    pub(crate) slot: u32,
}

impl ParticleHandle {
    pub(crate) const fn new(segment: SegmentId, index: u32, slot: u32) -> Self {
        Self {
            segment,
            index,
            slot,
        }
    }

    /// The owning segment.
    #[inline]
    #[must_use]
    pub const fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Position of the owning segment in the pool's segment list.
    #[inline]
    #[must_use]
    pub const fn segment_index(&self) -> usize {
        self.index as usize
    }

    /// Slot within the owning segment's buffer.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for ParticleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]/{}", self.segment, self.index, self.slot)
    }
}
