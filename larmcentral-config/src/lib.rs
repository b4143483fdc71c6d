//! # Larmcentral Configuration System
//!
//! Hierarchical configuration management for the Larmcentral dispatch core.
//!
//! ## Features
//! - **Unified Configuration**: Single source of truth across all components
//! - **Validation**: Runtime validation of every decision parameter
//! - **Environment Awareness**: `LARMCENTRAL_*` variables override file values
//!
//! Every tunable that influences an allocation decision (scoring weights,
//! freshness window, switch margin, vitals bounds) lives here so that the
//! decision leaves stay pure functions over immutable config structs.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod core;
mod engine;
mod error;
mod routing;
mod scoring;
mod telemetry;
mod triage;
mod validation;

pub use crate::core::CoreConfig;
pub use crate::core::IntakeConfig;
pub use engine::EngineConfig;
pub use error::ConfigError;
pub use routing::RoutingConfig;
pub use scoring::{ScoringConfig, ScoringWeights};
pub use telemetry::TelemetryConfig;
pub use triage::{TriageConfig, VitalBounds};

/// Top-level configuration container for all Larmcentral components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct LarmcentralConfig {
    /// Core system configuration (intake queue sizing).
    #[validate(nested)]
    pub core: CoreConfig,

    /// Allocation engine policy (freshness window, switch margin).
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Hospital scoring weights and tie-break parameters.
    #[validate(nested)]
    pub scoring: ScoringConfig,

    /// Route estimation parameters (speeds, congestion clamp, hysteresis).
    #[validate(nested)]
    pub routing: RoutingConfig,

    /// Vitals triage thresholds.
    #[validate(nested)]
    pub triage: TriageConfig,

    /// Telemetry and observability configuration.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl LarmcentralConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/larmcentral.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `LARMCENTRAL_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(LarmcentralConfig::default()));

        if Path::new("config/larmcentral.yaml").exists() {
            figment = figment.merge(Yaml::file("config/larmcentral.yaml"));
        }

        let env = std::env::var("LARMCENTRAL_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("LARMCENTRAL_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(LarmcentralConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LARMCENTRAL_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
