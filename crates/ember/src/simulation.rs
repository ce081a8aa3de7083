//! # Burst Simulation
//!
//! Drives a [`ParticlePool`] the way an effects system does:
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. RETIRE   free every particle whose lifetime ran out      │
//! │ 2. SPAWN    on burst frames, allocate until burst or limit  │
//! │ 3. ADAPT    if particles were dropped, grow the limit       │
//! │ 4. TICK     flag buffers, maybe reclaim idle segments       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time is simulated: frame N happens at `start + N * frame_time`, so a
//! cleanup interval of 30s is reached in a fraction of a real second.

use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, warn};

use ember_pool::{ParticleHandle, ParticlePool, PoolAdjustment, PoolConfig, SceneAttachment};

use crate::error::{DemoError, DemoResult};

/// Shape of the simulated workload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Frames to simulate.
    pub frames: u32,
    /// Simulated time per frame (ms).
    pub frame_time_ms: u64,
    /// A burst is spawned every this many frames.
    pub burst_every: u32,
    /// Particles requested per burst.
    pub burst_size: usize,
    /// Frames a particle lives.
    pub lifetime_frames: u32,
    /// Bursts stop after this frame, letting the pool drain.
    pub quiet_after: u32,
    /// Raise the limit whenever a burst is clipped.
    pub grow_on_drop: bool,
    /// Log a stats line every this many frames. 0 disables.
    pub report_every: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 4_000,
            frame_time_ms: 16,
            burst_every: 30,
            burst_size: 12_000,
            lifetime_frames: 180,
            quiet_after: 1_200,
            grow_on_drop: true,
            report_every: 500,
        }
    }
}

/// Full contents of a demo config file.
///
/// ```toml
/// [pool]
/// maximum_particles = 60000
/// particles_per_segment = 1500
///
/// [demo]
/// frames = 2000
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoFile {
    /// Pool settings.
    pub pool: PoolConfig,
    /// Workload settings.
    pub demo: DemoConfig,
}

impl DemoFile {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Config`] for malformed TOML and
    /// [`DemoError::Pool`] for a pool config that does not validate.
    pub fn from_toml_str(source: &str) -> DemoResult<Self> {
        let file: Self = toml::from_str(source)?;
        file.pool.validate()?;
        Ok(file)
    }

    /// Loads `path`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Io`] if the file exists but cannot be read,
    /// otherwise as [`from_toml_str`](Self::from_toml_str).
    pub fn load_or_default(path: &Path) -> DemoResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(DemoError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// What happened in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number.
    pub frame: u32,
    /// Particles allocated.
    pub spawned: usize,
    /// Requested particles the pool could not provide.
    pub dropped: usize,
    /// Particles freed.
    pub retired: usize,
    /// Segments reclaimed by the tick.
    pub reclaimed: usize,
    /// Segments after the frame.
    pub segments: usize,
    /// Live particles after the frame.
    pub live: usize,
}

/// Totals over a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames simulated.
    pub frames: u32,
    /// Particles allocated.
    pub spawned: usize,
    /// Requested particles that were dropped.
    pub dropped: usize,
    /// Segments reclaimed.
    pub reclaimed: usize,
    /// Highest segment count seen.
    pub peak_segments: usize,
    /// Segment count at the end.
    pub final_segments: usize,
    /// Limit at the end.
    pub final_maximum: usize,
}

/// An effects workload bound to one pool.
pub struct BurstSimulation<S: SceneAttachment> {
    pool: ParticlePool<S>,
    config: DemoConfig,
    /// Live particles in spawn order, with the frame they expire.
    live: VecDeque<(ParticleHandle, u32)>,
    start: Instant,
    frame: u32,
}

impl<S: SceneAttachment> BurstSimulation<S> {
    /// Binds a workload to `pool`. Simulated time starts now.
    #[must_use]
    pub fn new(pool: ParticlePool<S>, config: DemoConfig) -> Self {
        Self {
            pool,
            config,
            live: VecDeque::new(),
            start: Instant::now(),
            frame: 0,
        }
    }

    /// The driven pool.
    #[must_use]
    pub fn pool(&self) -> &ParticlePool<S> {
        &self.pool
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Propagates any [`PoolError`](ember_pool::PoolError); the simulation
    /// only frees handles it allocated, so one indicates a pool bug.
    pub fn step(&mut self) -> DemoResult<FrameReport> {
        let frame = self.frame;
        let mut report = FrameReport {
            frame,
            ..FrameReport::default()
        };

        while let Some(&(handle, expires)) = self.live.front() {
            if expires > frame {
                break;
            }
            self.pool.free(handle)?;
            self.live.pop_front();
            report.retired += 1;
        }

        if self.is_burst_frame(frame) {
            let expires = frame + self.config.lifetime_frames;
            for i in 0..self.config.burst_size {
                let Some(handle) = self.pool.allocate()? else {
                    report.dropped = self.config.burst_size - i;
                    break;
                };
                self.pool.slot_mut(handle)?.position = spawn_position(frame, i);
                self.live.push_back((handle, expires));
                report.spawned += 1;
            }
        }

        if report.dropped > 0 {
            warn!(frame, dropped = report.dropped, "burst clipped at pool limit");
            if self.config.grow_on_drop {
                self.pool.grow_pool(PoolAdjustment::DefaultRatio)?;
            }
        }

        let now = self.start + Duration::from_millis(self.config.frame_time_ms) * frame;
        report.reclaimed = self.pool.tick_at(now);
        report.segments = self.pool.segment_count();
        report.live = self.live.len();

        self.frame += 1;
        Ok(report)
    }

    /// Runs every configured frame.
    ///
    /// # Errors
    ///
    /// As [`step`](Self::step).
    pub fn run(&mut self) -> DemoResult<RunSummary> {
        let mut summary = RunSummary::default();

        for _ in 0..self.config.frames {
            let report = self.step()?;
            summary.frames += 1;
            summary.spawned += report.spawned;
            summary.dropped += report.dropped;
            summary.reclaimed += report.reclaimed;
            summary.peak_segments = summary.peak_segments.max(report.segments);

            if self.config.report_every != 0 && report.frame % self.config.report_every == 0 {
                let stats = self.pool.stats();
                info!(
                    frame = report.frame,
                    segments = stats.segment_count,
                    used = stats.used,
                    available = stats.available,
                    maximum = self.pool.maximum_particles(),
                    "pool status"
                );
            } else if report.reclaimed > 0 {
                debug!(frame = report.frame, reclaimed = report.reclaimed, "segments reclaimed");
            }
        }

        summary.final_segments = self.pool.segment_count();
        summary.final_maximum = self.pool.maximum_particles();
        Ok(summary)
    }

    fn is_burst_frame(&self, frame: u32) -> bool {
        self.config.burst_every != 0
            && frame <= self.config.quiet_after
            && frame % self.config.burst_every == 0
    }
}

/// Deterministic spiral so consecutive particles land apart.
#[allow(clippy::cast_precision_loss)]
fn spawn_position(frame: u32, index: usize) -> [f32; 3] {
    let t = index as f32 * 0.618_034;
    let r = (index % 64) as f32 * 0.25;
    [r * t.cos(), frame as f32 * 0.01, r * t.sin()]
}
