//! Runtime configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::wire::DEFAULT_FRESHNESS_WINDOW_MS;

/// Environment variable overriding the freshness window (milliseconds).
pub const ENV_FRESHNESS_WINDOW_MS: &str = "MEDITRACK_FRESHNESS_WINDOW_MS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Accepted clock distance between a freshness token and "now", both ways.
    pub freshness_window_ms: u64,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }
}

impl ProtectionConfig {
    /// Defaults, overridden by `MEDITRACK_FRESHNESS_WINDOW_MS` when it parses.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(ENV_FRESHNESS_WINDOW_MS)
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.freshness_window_ms = ms;
        }
        config
    }

    pub fn with_freshness_window_ms(mut self, ms: u64) -> Self {
        self.freshness_window_ms = ms;
        self
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.freshness_window_ms).unwrap_or(i64::MAX))
    }
}
