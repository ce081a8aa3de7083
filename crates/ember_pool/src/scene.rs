//! # Scene Attachment
//!
//! The pool's only view of rendering. Every segment is attached once when
//! it is created and detached once before cleanup drops it.

use crate::buffer::ParticleBuffer;
use crate::handle::SegmentId;

/// Receives segment lifecycle events from a [`ParticlePool`](crate::ParticlePool).
///
/// Implementations typically create a draw call (or GPU buffer) in `attach`
/// and tear it down in `detach`. Both are called from inside pool
/// operations, so they must not call back into the pool.
pub trait SceneAttachment {
    /// A new segment exists. `buffer` is the segment's backing storage.
    fn attach(&mut self, segment: SegmentId, buffer: &ParticleBuffer);

    /// The segment is about to be destroyed.
    fn detach(&mut self, segment: SegmentId);
}

/// A scene that renders nothing. Used by servers, benchmarks and tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessScene;

impl SceneAttachment for HeadlessScene {
    #[inline]
    fn attach(&mut self, _segment: SegmentId, _buffer: &ParticleBuffer) {}

    #[inline]
    fn detach(&mut self, _segment: SegmentId) {}
}

impl<S: SceneAttachment + ?Sized> SceneAttachment for Box<S> {
    fn attach(&mut self, segment: SegmentId, buffer: &ParticleBuffer) {
        (**self).attach(segment, buffer);
    }

    fn detach(&mut self, segment: SegmentId) {
        (**self).detach(segment);
    }
}
