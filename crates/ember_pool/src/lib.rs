//! # EMBER Particle Pool
//!
//! Elastic particle storage built from fixed-size segments, designed for:
//! - Allocate/free every frame with no heap traffic in steady state
//! - Backing buffers that cannot grow once created (GPU vertex buffers)
//! - Bounded memory: idle segments are reclaimed on a timer
//!
//! ## Architecture Rules
//!
//! 1. **Earliest segment first** - Allocation packs live particles toward the front
//! 2. **Trailing reclamation** - Cleanup only removes idle segments at the tail, keeping one spare
//! 3. **O(1) free** - A handle names its segment, nothing is searched
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_pool::{HeadlessScene, ParticlePool, PoolConfig};
//!
//! let mut pool = ParticlePool::new(PoolConfig::default(), HeadlessScene)?;
//! let handle = pool.allocate()?.expect("pool has capacity");
//! pool.free(handle)?;
//! pool.tick();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod handle;
pub mod pool;
pub mod scene;
mod segment;
pub mod shared;
pub mod stats;

pub use buffer::{ParticleBuffer, ParticleSlot, SlotState};
pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use handle::{ParticleHandle, SegmentId};
pub use pool::{ParticlePool, PoolAdjustment};
pub use scene::{HeadlessScene, SceneAttachment};
pub use shared::SharedParticlePool;
pub use stats::{PoolStats, SegmentStats};
