//! Engine configuration.
//!
//! [`EngineConfig`] captures everything needed to construct an
//! [`AudioEngine`](crate::AudioEngine): stream format, buffer pool sizing,
//! worker thread bounds, and the default parameter smoothing time. Configs
//! serialize to TOML; every field has a default, so a partial file (or an
//! empty one) still loads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use resonar_core::{AudioFormat, GrowthPolicy};

/// Errors from configuration loading, saving, or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O error for '{path}': {source}")]
    Io {
        /// Path of the file being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value outside its accepted range.
    #[error("invalid config field '{field}': {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an I/O error tagged with the file path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Buffer pool growth policy, as written in config files.
///
/// Serializable mirror of [`GrowthPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Allocate past the configured maximum instead of failing.
    #[default]
    OnDemand,
    /// Enforce the maximum and fail acquisition once it is reached.
    Bounded,
}

impl From<PoolPolicy> for GrowthPolicy {
    fn from(policy: PoolPolicy) -> Self {
        match policy {
            PoolPolicy::OnDemand => GrowthPolicy::OnDemand,
            PoolPolicy::Bounded => GrowthPolicy::Bounded,
        }
    }
}

/// Complete engine configuration.
///
/// ```toml
/// sample_rate = 48000.0
/// block_size = 256
/// channels = 2
/// pool_buffers = 32
/// pool_policy = "on_demand"
/// min_workers = 1
/// max_workers = 4
/// smoothing_ms = 20.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Stream sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,

    /// Frames per rendered block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Interleaved channel count.
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Buffer pool capacity, in buffers.
    #[serde(default = "default_pool_buffers")]
    pub pool_buffers: usize,

    /// How the pool behaves when `pool_buffers` are all in flight.
    #[serde(default)]
    pub pool_policy: PoolPolicy,

    /// Minimum number of background worker threads.
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Maximum number of background worker threads.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Default parameter smoothing time in milliseconds.
    #[serde(default = "default_smoothing_ms")]
    pub smoothing_ms: f32,
}

fn default_sample_rate() -> f32 {
    48000.0
}

fn default_block_size() -> usize {
    256
}

fn default_channels() -> usize {
    2
}

fn default_pool_buffers() -> usize {
    32
}

fn default_min_workers() -> usize {
    1
}

fn default_max_workers() -> usize {
    4
}

fn default_smoothing_ms() -> f32 {
    20.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            channels: default_channels(),
            pool_buffers: default_pool_buffers(),
            pool_policy: PoolPolicy::default(),
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            smoothing_ms: default_smoothing_ms(),
        }
    }
}

impl EngineConfig {
    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::io(path, source))?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Parses a config from a TOML string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the string is not valid TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Saves the config to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if serialization fails,
    /// [`ConfigError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| ConfigError::io(path, source))?;
            }
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::io(path, source))
    }

    /// Serializes the config to a pretty TOML string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The stream format this config describes.
    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels, self.block_size)
    }

    /// Checks every field against its accepted range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!("{} is not a positive rate", self.sample_rate),
            ));
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid("block_size", "must be at least 1"));
        }
        if self.channels == 0 {
            return Err(ConfigError::invalid("channels", "must be at least 1"));
        }
        if self.pool_buffers == 0 {
            return Err(ConfigError::invalid("pool_buffers", "must be at least 1"));
        }
        if self.min_workers == 0 {
            return Err(ConfigError::invalid("min_workers", "must be at least 1"));
        }
        if self.max_workers < self.min_workers {
            return Err(ConfigError::invalid(
                "max_workers",
                format!(
                    "{} is below min_workers ({})",
                    self.max_workers, self.min_workers
                ),
            ));
        }
        if !(self.smoothing_ms >= 0.0 && self.smoothing_ms.is_finite()) {
            return Err(ConfigError::invalid(
                "smoothing_ms",
                format!("{} is not a non-negative time", self.smoothing_ms),
            ));
        }
        Ok(())
    }
}
