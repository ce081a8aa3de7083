//! # Pool Error Types
//!
//! All errors that can occur in the particle pool.
//!
//! Running out of capacity is NOT an error: `allocate` returns `Ok(None)`
//! and the caller treats it as backpressure.

use thiserror::Error;

use crate::handle::ParticleHandle;

/// Errors that can occur in the particle pool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// The handle does not name a live segment of this pool.
    ///
    /// Raised for handles from another pool, handles whose segment was
    /// reclaimed by cleanup, and forged handles. Always a programmer error.
    #[error("invalid handle context: {0} is not bound to a live segment of this pool")]
    InvalidHandleContext(ParticleHandle),

    /// The handle's slot is already free.
    #[error("slot already free: {0}")]
    AlreadyFree(ParticleHandle),

    /// The host could not allocate a segment's backing buffer.
    #[error("resource exhausted: could not allocate a buffer of {slots} slots")]
    ResourceExhausted {
        /// Number of slots requested.
        slots: usize,
    },

    /// A grow/shrink ratio that is not finite and positive.
    #[error("invalid adjustment ratio: {0}")]
    InvalidRatio(f64),

    /// Invalid pool configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
