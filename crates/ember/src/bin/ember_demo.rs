//! # EMBER Demo
//!
//! Headless run of the particle pool under a bursty effects workload.
//! Shows growth on demand, the hard limit, and idle-segment reclamation.
//!
//! ```bash
//! # Defaults, or ./ember.toml if present
//! ./ember_demo
//!
//! # Explicit config, verbose pool logs
//! RUST_LOG=ember_pool=debug ./ember_demo crates/ember/ember.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ember::pool::{HeadlessScene, ParticlePool};
use ember::{BurstSimulation, DemoFile, DemoResult, RunSummary};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("ember.toml"), PathBuf::from);

    match run(&path) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                spawned = summary.spawned,
                dropped = summary.dropped,
                reclaimed = summary.reclaimed,
                peak_segments = summary.peak_segments,
                final_segments = summary.final_segments,
                final_maximum = summary.final_maximum,
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &std::path::Path) -> DemoResult<RunSummary> {
    let file = DemoFile::load_or_default(path)?;
    let pool = ParticlePool::new(file.pool, HeadlessScene)?;
    BurstSimulation::new(pool, file.demo).run()
}
