//! Observability and monitoring configuration.
//!
//! Parameters for system instrumentation:
//! - Metrics collection
//! - Structured logging

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MetricsConfig {
    /// Enable the Prometheus registry.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// Metrics collection parameters.
    #[validate(nested)]
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Minimum severity emitted on the structured dispatch log
    /// (low, medium, high, critical).
    #[serde(default = "default_severity")]
    #[validate(custom(function = validation::validate_severity))]
    pub min_severity: String,
}

fn default_true() -> bool {
    true
}

fn default_severity() -> String {
    "medium".into()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig { enabled: true },
            min_severity: default_severity(),
        }
    }
}
