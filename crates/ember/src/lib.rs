//! # EMBER
//!
//! Workload driver for the segmented particle pool.
//!
//! ## Modules
//!
//! - `simulation`: Burst-and-decay frame loop over a [`ParticlePool`](ember_pool::ParticlePool)
//! - `error`: Demo error types

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod simulation;

// Re-export the pool
pub use ember_pool as pool;

pub use error::{DemoError, DemoResult};
pub use simulation::{BurstSimulation, DemoConfig, DemoFile, FrameReport, RunSummary};
