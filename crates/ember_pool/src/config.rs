//! # Pool Configuration
//!
//! Loaded once at startup, either from defaults or from a TOML file.
//! Only `maximum_particles` changes after construction, and only through
//! [`ParticlePool::grow_pool`](crate::ParticlePool::grow_pool) and
//! [`ParticlePool::shrink_pool`](crate::ParticlePool::shrink_pool).

use std::time::Duration;

use serde::Deserialize;

use crate::error::{PoolError, PoolResult};

/// Configuration for a [`ParticlePool`](crate::ParticlePool).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Hard ceiling on allocatable capacity.
    pub maximum_particles: usize,
    /// Capacity pre-allocated at construction.
    pub minimum_particles: usize,
    /// Fixed slot count of every segment. Must be non-zero.
    pub particles_per_segment: usize,
    /// Minimum spacing between cleanup passes (ms). `None` disables cleanup.
    ///
    /// In TOML, either an integer or the string `"never"`.
    #[serde(deserialize_with = "deserialize_interval")]
    pub cleanup_interval_ms: Option<u64>,
    /// Step used by grow/shrink when no explicit value is given.
    pub default_adjustment_ratio: f64,
    /// Position written into a slot when it is freed.
    ///
    /// Renderers should key off [`SlotState`](crate::SlotState); this value
    /// only keeps stale vertex data somewhere harmless.
    pub detached_position: [f32; 3],
}

impl PoolConfig {
    /// Default hard ceiling.
    pub const DEFAULT_MAXIMUM_PARTICLES: usize = 100_000;
    /// Default pre-allocated capacity.
    pub const DEFAULT_MINIMUM_PARTICLES: usize = 3_000;
    /// Default segment size.
    pub const DEFAULT_PARTICLES_PER_SEGMENT: usize = 1_500;
    /// Default cleanup spacing: 30 seconds.
    pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 30_000;
    /// Default grow/shrink step.
    pub const DEFAULT_ADJUSTMENT_RATIO: f64 = 1.1;

    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or values rejected by [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the pool relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if `particles_per_segment` is
    /// zero or `default_adjustment_ratio` is not finite and positive.
    pub fn validate(&self) -> PoolResult<()> {
        if self.particles_per_segment == 0 {
            return Err(PoolError::InvalidConfig(
                "particles_per_segment must be greater than zero".into(),
            ));
        }
        if u32::try_from(self.particles_per_segment).is_err() {
            return Err(PoolError::InvalidConfig(format!(
                "particles_per_segment {} does not fit a u32 slot index",
                self.particles_per_segment
            )));
        }
        if !self.default_adjustment_ratio.is_finite() || self.default_adjustment_ratio <= 0.0 {
            return Err(PoolError::InvalidConfig(format!(
                "default_adjustment_ratio must be finite and positive, got {}",
                self.default_adjustment_ratio
            )));
        }
        Ok(())
    }

    /// Cleanup spacing as a [`Duration`], or `None` when cleanup is disabled.
    #[must_use]
    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval_ms.map(Duration::from_millis)
    }

    /// Number of segments created eagerly at construction.
    #[must_use]
    pub fn minimum_segments(&self) -> usize {
        self.minimum_particles.div_ceil(self.particles_per_segment)
    }
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Interval {
        Millis(u64),
        Keyword(String),
    }

    match Interval::deserialize(deserializer)? {
        Interval::Millis(ms) => Ok(Some(ms)),
        Interval::Keyword(word) if word == "never" => Ok(None),
        Interval::Keyword(word) => Err(serde::de::Error::custom(format!(
            "expected milliseconds or \"never\", got {word:?}"
        ))),
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            maximum_particles: Self::DEFAULT_MAXIMUM_PARTICLES,
            minimum_particles: Self::DEFAULT_MINIMUM_PARTICLES,
            particles_per_segment: Self::DEFAULT_PARTICLES_PER_SEGMENT,
            cleanup_interval_ms: Some(Self::DEFAULT_CLEANUP_INTERVAL_MS),
            default_adjustment_ratio: Self::DEFAULT_ADJUSTMENT_RATIO,
            detached_position: [0.0; 3],
        }
    }
}
