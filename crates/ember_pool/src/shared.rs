//! # Shared Pool
//!
//! One lock around the whole pool. The allocation scan and the limit check
//! must see a consistent segment list, so allocate, free, tick and cleanup
//! are serialized against each other rather than locked per segment.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::PoolResult;
use crate::handle::ParticleHandle;
use crate::pool::{ParticlePool, PoolAdjustment};
use crate::scene::SceneAttachment;
use crate::stats::PoolStats;

/// A [`ParticlePool`] behind a single `parking_lot::Mutex`.
///
/// Cloning is cheap and yields another handle to the same pool.
pub struct SharedParticlePool<S: SceneAttachment> {
    inner: Arc<Mutex<ParticlePool<S>>>,
}

impl<S: SceneAttachment> SharedParticlePool<S> {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: ParticlePool<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// See [`ParticlePool::allocate`].
    ///
    /// # Errors
    ///
    /// See [`ParticlePool::allocate`].
    pub fn allocate(&self) -> PoolResult<Option<ParticleHandle>> {
        self.inner.lock().allocate()
    }

    /// See [`ParticlePool::free`].
    ///
    /// # Errors
    ///
    /// See [`ParticlePool::free`].
    pub fn free(&self, handle: ParticleHandle) -> PoolResult<()> {
        self.inner.lock().free(handle)
    }

    /// See [`ParticlePool::tick`].
    pub fn tick(&self) -> usize {
        self.inner.lock().tick()
    }

    /// See [`ParticlePool::cleanup`].
    pub fn cleanup(&self) -> usize {
        self.inner.lock().cleanup()
    }

    /// See [`ParticlePool::grow_pool`].
    ///
    /// # Errors
    ///
    /// See [`ParticlePool::grow_pool`].
    pub fn grow_pool(&self, adjustment: PoolAdjustment) -> PoolResult<usize> {
        self.inner.lock().grow_pool(adjustment)
    }

    /// See [`ParticlePool::shrink_pool`].
    ///
    /// # Errors
    ///
    /// See [`ParticlePool::shrink_pool`].
    pub fn shrink_pool(&self, adjustment: PoolAdjustment) -> PoolResult<usize> {
        self.inner.lock().shrink_pool(adjustment)
    }

    /// See [`ParticlePool::stats`].
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }

    /// Locks the pool for a batch of operations.
    ///
    /// Hold the guard for as short as possible; every other caller blocks.
    pub fn lock(&self) -> MutexGuard<'_, ParticlePool<S>> {
        self.inner.lock()
    }
}

impl<S: SceneAttachment> Clone for SharedParticlePool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SceneAttachment> From<ParticlePool<S>> for SharedParticlePool<S> {
    fn from(pool: ParticlePool<S>) -> Self {
        Self::new(pool)
    }
}
