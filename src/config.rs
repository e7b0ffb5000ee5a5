#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError, synth::params::InstrumentParameters, DEFAULT_BLOCK_SIZE,
    DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE,
};

/// Which sounding voice gives way when every slot is taken.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Largest age; ties go to the lowest slot.
    #[default]
    Oldest,
    /// Lowest stored energy; ties go to the lowest slot.
    Quietest,
}

/// What a note-off does.
///
/// With `damping` unset a note-off changes nothing and the string rings out
/// on its own damping.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseConfig {
    pub damping: Option<f64>,
    pub ramp_secs: f64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            damping: None,
            ramp_secs: 0.05,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub block_size: usize,
    pub max_voices: usize,
    /// Seed for the note generator; `None` picks one per engine.
    pub seed: Option<u64>,
    pub steal_policy: StealPolicy,
    pub release: ReleaseConfig,
    pub noisy_transient: bool,
    pub preferred_group_size: usize,
    /// Size of a dedicated render pool; `None` uses the global rayon pool.
    /// Ignored without the `rayon` feature.
    pub render_threads: Option<usize>,
    pub instrument: InstrumentParameters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            max_voices: 16,
            seed: None,
            steal_policy: StealPolicy::Oldest,
            release: ReleaseConfig::default(),
            noisy_transient: true,
            preferred_group_size: 256,
            render_threads: None,
            instrument: InstrumentParameters::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize {
                got: self.block_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        if self.max_voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        if self.preferred_group_size == 0 {
            return Err(ConfigError::InvalidGroupSize);
        }
        if self.render_threads == Some(0) {
            return Err(ConfigError::NoRenderThreads);
        }
        if let Some(damping) = self.release.damping {
            if !(damping.is_finite() && damping > 0.0) {
                return Err(ConfigError::InvalidReleaseDamping(damping));
            }
        }
        if !(self.release.ramp_secs.is_finite() && self.release.ramp_secs >= 0.0) {
            return Err(ConfigError::InvalidReleaseRamp(self.release.ramp_secs));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_pool() {
        let config = EngineConfig {
            max_voices: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoVoices)));
    }

    #[test]
    fn rejects_bad_block_and_rate() {
        let config = EngineConfig {
            block_size: MAX_BLOCK_SIZE + 1,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBlockSize { .. })));

        let config = EngineConfig {
            sample_rate: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSampleRate(_))));
    }

    #[test]
    fn rejects_bad_release() {
        let mut config = EngineConfig::default();
        config.release.damping = Some(-1.0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidReleaseDamping(_))));
        config.release.damping = Some(40.0);
        config.release.ramp_secs = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidReleaseRamp(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            max_voices = 8
            steal_policy = "quietest"

            [instrument]
            num_partials = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.max_voices, 8);
        assert_eq!(config.steal_policy, StealPolicy::Quietest);
        assert_eq!(config.instrument.num_partials, 40);
        assert_eq!(config.instrument.damping, 2.5);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
    }
}
