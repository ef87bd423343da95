//! Server configuration from environment variables.
//!
//! ```bash
//! COHORT_EVENT_CHANNEL_CAPACITY=100  # events a slow subscriber may lag before resync
//! COHORT_MAX_BULK_GROUPS=100         # upper bound for one bulk group creation
//! ```

use std::env;
use thiserror::Error;

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;
pub const DEFAULT_MAX_BULK_GROUPS: u32 = 100;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub event_channel_capacity: usize,
    pub max_bulk_groups: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            max_bulk_groups: DEFAULT_MAX_BULK_GROUPS,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} (expected a positive integer)")]
    InvalidNumber { var: &'static str, value: String },
}

fn positive<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::InvalidNumber { var, value: raw }),
        },
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            event_channel_capacity: positive(
                "COHORT_EVENT_CHANNEL_CAPACITY",
                DEFAULT_EVENT_CHANNEL_CAPACITY,
            )?,
            max_bulk_groups: positive("COHORT_MAX_BULK_GROUPS", DEFAULT_MAX_BULK_GROUPS)?,
        })
    }
}
