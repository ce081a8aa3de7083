//! # Segmented Particle Pool
//!
//! An elastic pool assembled from fixed-size segments.
//!
//! ## Allocation policy
//!
//! Allocation always takes the first free slot of the *earliest* segment.
//! Live particles therefore pack toward the front of the segment list and
//! idle segments collect at the tail, which is the only place cleanup looks.
//!
//! ```text
//!   segments:  [ full ][ full ][ 3/5 ][ idle ][ idle ][ idle ]
//!                                        ^ spare   ^------^ reclaimed
//! ```
//!
//! ## Thread Safety
//!
//! This pool is NOT thread-safe. Drive it from one loop, or share it through
//! [`SharedParticlePool`](crate::SharedParticlePool).

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::buffer::{ParticleBuffer, ParticleSlot};
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::handle::{ParticleHandle, SegmentId};
use crate::scene::SceneAttachment;
use crate::segment::Segment;
use crate::stats::{PoolStats, SegmentStats};

/// How far [`ParticlePool::grow_pool`] / [`ParticlePool::shrink_pool`] move
/// the capacity limit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PoolAdjustment {
    /// Scale by the configured `default_adjustment_ratio`.
    #[default]
    DefaultRatio,
    /// Scale by this ratio.
    Ratio(f64),
    /// Set the limit to exactly this many particles. Zero is honored.
    Absolute(usize),
}

/// The segmented particle pool.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = ParticlePool::new(PoolConfig::default(), HeadlessScene)?;
///
/// // Per frame
/// if let Some(handle) = pool.allocate()? {
///     pool.slot_mut(handle)?.position = [0.0, 1.0, 0.0];
/// }
/// pool.tick();
/// ```
pub struct ParticlePool<S: SceneAttachment> {
    config: PoolConfig,
    scene: S,
    /// Creation order. Only a trailing run is ever removed.
    segments: Vec<Segment>,
    last_cleanup: Instant,
}

impl<S: SceneAttachment> ParticlePool<S> {
    /// Creates a pool and eagerly builds enough segments for
    /// `minimum_particles`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the config does not validate,
    /// or [`PoolError::ResourceExhausted`] if a minimum segment cannot be
    /// allocated.
    pub fn new(config: PoolConfig, scene: S) -> PoolResult<Self> {
        config.validate()?;

        let mut pool = Self {
            segments: Vec::with_capacity(config.minimum_segments()),
            config,
            scene,
            last_cleanup: Instant::now(),
        };
        for _ in 0..pool.config.minimum_segments() {
            pool.create_segment()?;
        }

        info!(
            segments = pool.segments.len(),
            capacity = pool.capacity(),
            maximum = pool.config.maximum_particles,
            "particle pool ready"
        );
        Ok(pool)
    }

    /// Takes a free slot, growing by one segment if the limit allows.
    ///
    /// Returns `Ok(None)` when the pool is at its limit. That is normal
    /// backpressure, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ResourceExhausted`] if a new segment was needed
    /// and its buffer could not be allocated.
    pub fn allocate(&mut self) -> PoolResult<Option<ParticleHandle>> {
        let consumed = match self.scan() {
            Ok(handle) => return Ok(Some(handle)),
            Err(consumed) => consumed,
        };

        if consumed >= self.config.maximum_particles {
            trace!(consumed, maximum = self.config.maximum_particles, "pool at limit");
            return Ok(None);
        }

        self.create_segment()?;
        let index = self.segments.len() - 1;
        Ok(self.take_from(index))
    }

    /// Returns a slot to its segment.
    ///
    /// **O(1)**: the handle names its segment directly, nothing is searched.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidHandleContext`] if the handle does not belong to
    ///   a live segment of this pool.
    /// - [`PoolError::AlreadyFree`] if the slot was already freed.
    pub fn free(&mut self, handle: ParticleHandle) -> PoolResult<()> {
        let detached_position = self.config.detached_position;
        let segment = self.segment_mut(handle)?;
        if segment.push_available(handle.slot, detached_position) {
            Ok(())
        } else {
            Err(PoolError::AlreadyFree(handle))
        }
    }

    /// Per-frame update: flags every buffer for upload and, once the cleanup
    /// interval has passed, reclaims idle segments.
    ///
    /// Returns the number of segments reclaimed.
    pub fn tick(&mut self) -> usize {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant) -> usize {
        for segment in &mut self.segments {
            segment.buffer_mut().mark_needs_update();
        }

        let Some(interval) = self.config.cleanup_interval() else {
            return 0;
        };
        if now.saturating_duration_since(self.last_cleanup) <= interval {
            return 0;
        }

        let removed = self.cleanup();
        self.last_cleanup = now;
        removed
    }

    /// Reclaims trailing idle segments, keeping one as a warm spare.
    ///
    /// Runs unconditionally; [`tick`](Self::tick) is the interval-gated
    /// entry point. Returns the number of segments reclaimed.
    pub fn cleanup(&mut self) -> usize {
        let first_idle = self
            .segments
            .iter()
            .rposition(|segment| !segment.is_idle())
            .map_or(0, |busy| busy + 1);
        let idle = self.segments.len() - first_idle;
        if idle <= 1 {
            return 0;
        }

        let keep = first_idle + 1;
        for segment in self.segments.drain(keep..) {
            self.scene.detach(segment.id());
            debug!(segment = %segment.id(), "segment reclaimed");
        }

        let removed = idle - 1;
        info!(removed, remaining = self.segments.len(), "cleanup pass");
        removed
    }

    /// Raises the capacity limit. Returns the new limit.
    ///
    /// A ratio step is capped at one segment beyond the current segment
    /// count; [`PoolAdjustment::Absolute`] is not capped.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidRatio`] for a non-finite or non-positive
    /// ratio.
    pub fn grow_pool(&mut self, adjustment: PoolAdjustment) -> PoolResult<usize> {
        let maximum = match adjustment {
            PoolAdjustment::Absolute(count) => count,
            other => {
                let ratio = self.ratio(other)?;
                let ceiling = (self.segments.len() + 1) * self.config.particles_per_segment;
                scale_up(self.config.maximum_particles, ratio).min(ceiling)
            }
        };
        Ok(self.set_maximum(maximum))
    }

    /// Lowers the capacity limit. Returns the new limit.
    ///
    /// A ratio step never goes below one segment or below
    /// `minimum_particles`; [`PoolAdjustment::Absolute`] is not bounded.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidRatio`] for a non-finite or non-positive
    /// ratio.
    pub fn shrink_pool(&mut self, adjustment: PoolAdjustment) -> PoolResult<usize> {
        let maximum = match adjustment {
            PoolAdjustment::Absolute(count) => count,
            other => {
                let ratio = self.ratio(other)?;
                scale_down(self.config.maximum_particles, ratio)
                    .max(self.config.particles_per_segment)
                    .max(self.config.minimum_particles)
            }
        };
        Ok(self.set_maximum(maximum))
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats::collect(&self.segments)
    }

    /// Per-segment occupancy in creation order.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = SegmentStats> + '_ {
        self.segments.iter().map(SegmentStats::of)
    }

    /// Every segment's backing buffer in creation order.
    pub fn buffers(&self) -> impl ExactSizeIterator<Item = (SegmentId, &ParticleBuffer)> + '_ {
        self.segments.iter().map(|s| (s.id(), s.buffer()))
    }

    /// Hands each buffer flagged since the last sync to `upload`, clearing
    /// the flag.
    pub fn sync_buffers(&mut self, mut upload: impl FnMut(SegmentId, &ParticleBuffer)) {
        for segment in &mut self.segments {
            if segment.buffer_mut().take_needs_update() {
                upload(segment.id(), segment.buffer());
            }
        }
    }

    /// The live slot behind `handle`.
    ///
    /// # Errors
    ///
    /// Same as [`free`](Self::free).
    pub fn slot(&self, handle: ParticleHandle) -> PoolResult<&ParticleSlot> {
        self.segment(handle)?
            .slot(handle.slot)
            .filter(|slot| slot.is_live())
            .ok_or(PoolError::AlreadyFree(handle))
    }

    /// The live slot behind `handle`, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`free`](Self::free).
    pub fn slot_mut(&mut self, handle: ParticleHandle) -> PoolResult<&mut ParticleSlot> {
        let segment = self.segment_mut(handle)?;
        if !segment.slot(handle.slot).is_some_and(ParticleSlot::is_live) {
            return Err(PoolError::AlreadyFree(handle));
        }
        segment.buffer_mut().mark_needs_update();
        segment
            .slot_mut(handle.slot)
            .ok_or(PoolError::AlreadyFree(handle))
    }

    /// The active configuration, including the current limit.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Current capacity limit.
    #[inline]
    #[must_use]
    pub fn maximum_particles(&self) -> usize {
        self.config.maximum_particles
    }

    /// Number of live segments.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Slots across all live segments.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.segments.len() * self.config.particles_per_segment
    }

    /// Slots currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.size() - s.available())
            .sum()
    }

    /// The scene segments are attached to.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The scene, mutably.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Walks segments front to back and takes the first free slot.
    ///
    /// On failure returns the capacity of the full segments scanned. The
    /// walk stops early once that exceeds the limit.
    fn scan(&mut self) -> Result<ParticleHandle, usize> {
        let mut consumed = 0usize;
        for index in 0..self.segments.len() {
            if let Some(handle) = self.take_from(index) {
                return Ok(handle);
            }
            consumed += self.segments[index].size();
            if consumed > self.config.maximum_particles {
                break;
            }
        }
        Err(consumed)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn take_from(&mut self, index: usize) -> Option<ParticleHandle> {
        let segment = &mut self.segments[index];
        let slot = segment.pop_available()?;
        // Segment count fits u32, checked in create_segment.
        Some(ParticleHandle::new(segment.id(), index as u32, slot))
    }

    fn create_segment(&mut self) -> PoolResult<()> {
        let size = self.config.particles_per_segment;
        if u32::try_from(self.segments.len()).is_err() {
            return Err(PoolError::ResourceExhausted { slots: size });
        }
        let size = u32::try_from(size).map_err(|_| PoolError::ResourceExhausted { slots: size })?;

        let segment = Segment::try_new(size, self.config.detached_position)?;
        self.scene.attach(segment.id(), segment.buffer());
        debug!(
            segment = %segment.id(),
            index = self.segments.len(),
            size,
            "segment created"
        );
        self.segments.push(segment);
        Ok(())
    }

    fn segment(&self, handle: ParticleHandle) -> PoolResult<&Segment> {
        self.segments
            .get(handle.segment_index())
            .filter(|s| s.id() == handle.segment && handle.slot() < s.size())
            .ok_or(PoolError::InvalidHandleContext(handle))
    }

    fn segment_mut(&mut self, handle: ParticleHandle) -> PoolResult<&mut Segment> {
        self.segments
            .get_mut(handle.segment_index())
            .filter(|s| s.id() == handle.segment && handle.slot() < s.size())
            .ok_or(PoolError::InvalidHandleContext(handle))
    }

    fn ratio(&self, adjustment: PoolAdjustment) -> PoolResult<f64> {
        let ratio = match adjustment {
            PoolAdjustment::Ratio(ratio) => ratio,
            _ => self.config.default_adjustment_ratio,
        };
        if ratio.is_finite() && ratio > 0.0 {
            Ok(ratio)
        } else {
            Err(PoolError::InvalidRatio(ratio))
        }
    }

    fn set_maximum(&mut self, maximum: usize) -> usize {
        debug!(
            from = self.config.maximum_particles,
            to = maximum,
            segments = self.segments.len(),
            "capacity limit adjusted"
        );
        self.config.maximum_particles = maximum;
        maximum
    }
}

impl<S: SceneAttachment> std::fmt::Debug for ParticlePool<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticlePool")
            .field("segments", &self.segments.len())
            .field("capacity", &self.capacity())
            .field("maximum_particles", &self.config.maximum_particles)
            .finish_non_exhaustive()
    }
}

/// `floor(value * ratio)`, saturating.
#[allow(clippy::cast_precision_loss)]
fn scale_up(value: usize, ratio: f64) -> usize {
    floor(value as f64 * ratio)
}

/// `floor(value / ratio)`, saturating.
#[allow(clippy::cast_precision_loss)]
fn scale_down(value: usize, ratio: f64) -> usize {
    floor(value as f64 / ratio)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor(value: f64) -> usize {
    value.floor() as usize
}
