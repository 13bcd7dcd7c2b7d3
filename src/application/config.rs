use crate::domain::errors::ConfigError;
use crate::domain::metrics::ChannelShape;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling and caching policy of the sync cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fixed cadence of background refetches
    pub poll_interval_ms: u64,
    /// Age below which a cached result is reused on re-observation
    pub stale_time_ms: u64,
    /// Deliver a synthesized series before the first fetch settles
    pub placeholder: bool,
    pub refetch_on_window_focus: bool,
    /// Channel layout used for synthesized series
    pub shape: ChannelShape,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            stale_time_ms: 500,
            placeholder: true,
            refetch_on_window_focus: false,
            shape: ChannelShape::Balance,
        }
    }
}

impl SyncConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("poll_interval_ms"));
        }
        Ok(())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time_ms = u64::try_from(stale_time.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_placeholder(mut self, placeholder: bool) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn with_refetch_on_window_focus(mut self, enabled: bool) -> Self {
        self.refetch_on_window_focus = enabled;
        self
    }

    pub fn with_shape(mut self, shape: ChannelShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }
}
