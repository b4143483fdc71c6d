//! Allocation engine policy parameters.
//!
//! These values bound how aggressively committed assignments are revisited:
//! the freshness window excludes silent hospital feeds from scoring, and the
//! switch margin is the minimum score advantage required before a committed
//! hospital is traded for a challenger.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Allocation engine configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EngineConfig {
    /// Maximum age of a hospital feed before the hospital is excluded from
    /// scoring (seconds).
    #[serde(default = "default_freshness_window")]
    #[validate(range(min = 5, max = 3600))]
    pub freshness_window_secs: u64,

    /// Minimum score advantage a challenger hospital must hold over the
    /// incumbent's re-scored value before a reallocation is committed.
    #[serde(default = "default_switch_margin")]
    #[validate(range(min = 0.0, max = 0.5))]
    pub switch_margin: f64,

    /// Bound on vitals snapshots retained per ambulance for trend analysis.
    #[serde(default = "default_vitals_history")]
    #[validate(range(min = 2, max = 256))]
    pub vitals_history_len: usize,
}

fn default_freshness_window() -> u64 {
    60
}

fn default_switch_margin() -> f64 {
    0.05
}

fn default_vitals_history() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window(),
            switch_margin: default_switch_margin(),
            vitals_history_len: default_vitals_history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_config_is_valid() {
        EngineConfig::default().validate().expect("default valid");
    }

    #[test]
    fn rejects_excessive_switch_margin() {
        let mut config = EngineConfig::default();
        config.switch_margin = 0.9;
        assert!(config.validate().is_err());
    }
}
