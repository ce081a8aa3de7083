//! # Particle Buffer
//!
//! The fixed-size backing resource of one segment. Sized once, never grown:
//! GPU vertex buffers behave the same way, which is why the pool is built
//! out of many of these instead of one resizable array.

use bytemuck::{Pod, Zeroable};

use crate::error::{PoolError, PoolResult};

/// Whether a slot is handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Owned by a caller.
    Live,
    /// Free. Renderers should skip it.
    Detached,
}

/// One slot as laid out in GPU memory.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleSlot {
    /// World-space position.
    pub position: [f32; 3],
    /// Non-zero while the slot is live.
    flags: u32,
}

impl ParticleSlot {
    /// Size of a slot in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    const LIVE: u32 = 1;

    /// Creates a detached slot at `position`.
    #[must_use]
    pub const fn detached(position: [f32; 3]) -> Self {
        Self { position, flags: 0 }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SlotState {
        if self.flags & Self::LIVE != 0 {
            SlotState::Live
        } else {
            SlotState::Detached
        }
    }

    /// Is this slot live?
    #[inline]
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.state(), SlotState::Live)
    }

    pub(crate) fn attach(&mut self) {
        self.flags |= Self::LIVE;
    }

    pub(crate) fn detach(&mut self, position: [f32; 3]) {
        self.position = position;
        self.flags &= !Self::LIVE;
    }
}

/// Fixed-capacity slot storage for one segment.
#[derive(Debug)]
pub struct ParticleBuffer {
    slots: Box<[ParticleSlot]>,
    needs_update: bool,
}

impl ParticleBuffer {
    /// Allocates `len` detached slots at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ResourceExhausted`] if the allocation fails.
    pub fn try_new(len: usize, position: [f32; 3]) -> PoolResult<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| PoolError::ResourceExhausted { slots: len })?;
        slots.resize(len, ParticleSlot::detached(position));

        Ok(Self {
            slots: slots.into_boxed_slice(),
            needs_update: true,
        })
    }

    /// Number of slots. Fixed for the buffer's life.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, live and detached.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[ParticleSlot] {
        &self.slots
    }

    /// Raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    /// Whether the contents changed since the renderer last synced.
    #[inline]
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Clears and returns the update flag.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    pub(crate) fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&ParticleSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut ParticleSlot> {
        self.slots.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        assert_eq!(ParticleSlot::SIZE, 16);
    }

    #[test]
    fn test_new_buffer_is_detached() {
        let buffer = ParticleBuffer::try_new(4, [0.0, -500.0, 0.0]).unwrap();
        assert_eq!(buffer.len(), 4);
        assert!(buffer.needs_update());
        for slot in buffer.slots() {
            assert_eq!(slot.state(), SlotState::Detached);
            assert_eq!(slot.position, [0.0, -500.0, 0.0]);
        }
    }

    #[test]
    fn test_attach_detach() {
        let mut slot = ParticleSlot::detached([0.0; 3]);
        slot.attach();
        slot.position = [1.0, 2.0, 3.0];
        assert!(slot.is_live());

        slot.detach([9.0; 3]);
        assert_eq!(slot.state(), SlotState::Detached);
        assert_eq!(slot.position, [9.0; 3]);
    }

    #[test]
    fn test_bytes_cover_every_slot() {
        let buffer = ParticleBuffer::try_new(3, [0.0; 3]).unwrap();
        assert_eq!(buffer.as_bytes().len(), 3 * ParticleSlot::SIZE);
    }

    #[test]
    fn test_take_needs_update() {
        let mut buffer = ParticleBuffer::try_new(1, [0.0; 3]).unwrap();
        assert!(buffer.take_needs_update());
        assert!(!buffer.take_needs_update());
        buffer.mark_needs_update();
        assert!(buffer.needs_update());
    }

    #[test]
    fn test_impossible_allocation_is_reported() {
        let err = ParticleBuffer::try_new(usize::MAX, [0.0; 3]).unwrap_err();
        assert_eq!(err, PoolError::ResourceExhausted { slots: usize::MAX });
    }
}
