//! # Segment
//!
//! Fixed-size block allocator backing one slice of the pool.
//!
//! A segment owns exactly `particles_per_segment` slots from creation until
//! cleanup drops it. The free list is a stack: the most recently freed slot
//! is handed out next, and a fresh segment hands out slot 0 first.

use crate::buffer::{ParticleBuffer, ParticleSlot};
use crate::error::{PoolError, PoolResult};
use crate::handle::SegmentId;

/// A fixed-capacity group of slots and their available queue.
#[derive(Debug)]
pub(crate) struct Segment {
    id: SegmentId,
    buffer: ParticleBuffer,
    /// Slots ready to hand out. The top of the stack goes next.
    available: Vec<u32>,
}

impl Segment {
    /// Creates a segment with every slot detached and available.
    ///
    /// All memory is reserved upfront; a failed reservation leaves nothing
    /// behind.
    pub(crate) fn try_new(size: u32, detached_position: [f32; 3]) -> PoolResult<Self> {
        let buffer = ParticleBuffer::try_new(size as usize, detached_position)?;

        let mut available = Vec::new();
        available
            .try_reserve_exact(size as usize)
            .map_err(|_| PoolError::ResourceExhausted {
                slots: size as usize,
            })?;
        available.extend((0..size).rev());

        Ok(Self {
            id: SegmentId::next(),
            buffer,
            available,
        })
    }

    #[inline]
    pub(crate) const fn id(&self) -> SegmentId {
        self.id
    }

    /// Slot count. Constant.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub(crate) fn available(&self) -> usize {
        self.available.len()
    }

    /// No slot is live.
    #[inline]
    pub(crate) fn is_idle(&self) -> bool {
        self.available.len() == self.buffer.len()
    }

    #[inline]
    pub(crate) fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    #[inline]
    pub(crate) fn buffer_mut(&mut self) -> &mut ParticleBuffer {
        &mut self.buffer
    }

    /// Takes the top of the available stack and marks it live.
    ///
    /// **O(1)**, no heap allocation.
    pub(crate) fn pop_available(&mut self) -> Option<u32> {
        let slot = self.available.pop()?;
        if let Some(s) = self.buffer.slot_mut(slot as usize) {
            s.attach();
        }
        self.buffer.mark_needs_update();
        Some(slot)
    }

    /// Detaches a live slot and queues it for reuse.
    ///
    /// Returns `false` (and changes nothing) if the slot is out of range or
    /// already detached.
    pub(crate) fn push_available(&mut self, slot: u32, detached_position: [f32; 3]) -> bool {
        match self.buffer.slot_mut(slot as usize) {
            Some(s) if s.is_live() => s.detach(detached_position),
            _ => return false,
        }
        self.available.push(slot);
        self.buffer.mark_needs_update();
        true
    }

    pub(crate) fn slot(&self, slot: u32) -> Option<&ParticleSlot> {
        self.buffer.slot(slot as usize)
    }

    pub(crate) fn slot_mut(&mut self, slot: u32) -> Option<&mut ParticleSlot> {
        self.buffer.slot_mut(slot as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SlotState;

    #[test]
    fn test_new_segment_is_idle() {
        let segment = Segment::try_new(5, [0.0; 3]).unwrap();
        assert_eq!(segment.size(), 5);
        assert_eq!(segment.available(), 5);
        assert!(segment.is_idle());
    }

    #[test]
    fn test_pop_until_exhausted() {
        let mut segment = Segment::try_new(2, [0.0; 3]).unwrap();
        assert_eq!(segment.pop_available(), Some(0));
        assert_eq!(segment.pop_available(), Some(1));
        assert_eq!(segment.pop_available(), None);
        assert_eq!(segment.available(), 0);
        assert!(!segment.is_idle());
        assert_eq!(segment.slot(0).unwrap().state(), SlotState::Live);
    }

    #[test]
    fn test_freed_slots_reused_newest_first() {
        let mut segment = Segment::try_new(3, [0.0; 3]).unwrap();
        for _ in 0..3 {
            segment.pop_available().unwrap();
        }
        assert!(segment.push_available(2, [0.0; 3]));
        assert!(segment.push_available(0, [0.0; 3]));

        assert_eq!(segment.pop_available(), Some(0));
        assert_eq!(segment.pop_available(), Some(2));
    }

    #[test]
    fn test_push_rejects_detached_and_out_of_range() {
        let mut segment = Segment::try_new(2, [0.0; 3]).unwrap();
        assert!(!segment.push_available(0, [0.0; 3]));
        assert!(!segment.push_available(9, [0.0; 3]));
        assert_eq!(segment.available(), 2);
    }

    #[test]
    fn test_free_writes_detached_position() {
        let mut segment = Segment::try_new(1, [0.0; 3]).unwrap();
        let slot = segment.pop_available().unwrap();
        segment.slot_mut(slot).unwrap().position = [4.0, 5.0, 6.0];
        segment.push_available(slot, [0.0, -1.0, 0.0]);
        assert_eq!(segment.slot(slot).unwrap().position, [0.0, -1.0, 0.0]);
    }
}
