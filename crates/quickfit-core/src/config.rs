//! Allocator configuration.
//!
//! The class table is fixed when an allocator is built. Hosts either construct
//! a [`QuickFitConfig`] directly or read it from the environment:
//! - `QUICKFIT_SIZE_CLASSES`: comma-separated ascending thresholds in bytes,
//!   e.g. `50,100,200` (the default).
//! - `QUICKFIT_LIFECYCLE_LOG`: `off` (default) or `on`; also accepts
//!   `1/0`, `true/false`, `yes/no`, `enabled/disabled`.
//! - `QUICKFIT_LIFECYCLE_CAPACITY`: most lifecycle records kept at once
//!   (default 1024).

use crate::error::ConfigError;
use crate::lifecycle::DEFAULT_LIFECYCLE_CAPACITY;
use crate::size_class::{DEFAULT_THRESHOLDS, SizeClassTable};

/// Environment variable holding the size-class thresholds.
pub const ENV_SIZE_CLASSES: &str = "QUICKFIT_SIZE_CLASSES";

/// Environment variable toggling lifecycle records.
pub const ENV_LIFECYCLE_LOG: &str = "QUICKFIT_LIFECYCLE_LOG";

/// Environment variable bounding the lifecycle ring.
pub const ENV_LIFECYCLE_CAPACITY: &str = "QUICKFIT_LIFECYCLE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickFitConfig {
    /// Ascending class thresholds in bytes.
    pub thresholds: Vec<usize>,
    /// Record an [`crate::AllocatorLogRecord`] for every operation.
    pub lifecycle_logging: bool,
    /// Most records kept before the oldest is dropped.
    pub lifecycle_capacity: usize,
}

impl Default for QuickFitConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            lifecycle_logging: false,
            lifecycle_capacity: DEFAULT_LIFECYCLE_CAPACITY,
        }
    }
}

impl QuickFitConfig {
    #[must_use]
    pub fn with_thresholds(thresholds: &[usize]) -> Self {
        Self {
            thresholds: thresholds.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn lifecycle_logging(mut self, enabled: bool) -> Self {
        self.lifecycle_logging = enabled;
        self
    }

    #[must_use]
    pub fn lifecycle_capacity(mut self, capacity: usize) -> Self {
        self.lifecycle_capacity = capacity;
        self
    }

    /// Reads the configuration from the process environment. Unset variables
    /// keep their defaults; set but malformed ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_SIZE_CLASSES) {
            config.thresholds = parse_thresholds(&raw)?;
        }
        if let Some(raw) = lookup(ENV_LIFECYCLE_LOG) {
            config.lifecycle_logging = parse_toggle(&raw)?;
        }
        if let Some(raw) = lookup(ENV_LIFECYCLE_CAPACITY) {
            config.lifecycle_capacity =
                raw.trim().parse().map_err(|_| ConfigError::Parse {
                    key: ENV_LIFECYCLE_CAPACITY,
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }

    /// Validates the thresholds into a [`SizeClassTable`].
    pub fn size_classes(&self) -> Result<SizeClassTable, ConfigError> {
        SizeClassTable::new(&self.thresholds)
    }
}

/// Parses `"50, 100,200"` into thresholds. Ordering is checked later by
/// [`SizeClassTable::new`].
pub fn parse_thresholds(raw: &str) -> Result<Vec<usize>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>().map_err(|_| ConfigError::Parse {
                key: ENV_SIZE_CLASSES,
                value: part.to_string(),
            })
        })
        .collect()
}

/// Parses a loose on/off flag (case-insensitive).
pub fn parse_toggle(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "1" | "true" | "yes" | "enabled" => Ok(true),
        "off" | "0" | "false" | "no" | "disabled" => Ok(false),
        _ => Err(ConfigError::Parse {
            key: ENV_LIFECYCLE_LOG,
            value: raw.to_string(),
        }),
    }
}
