//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration
//! modules.

use validator::ValidationError;

use crate::scoring::ScoringWeights;

/// Validate that a given value is a power of two.
pub fn validate_power_of_two(value: usize) -> Result<(), ValidationError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_power_of_two"))
    }
}

/// Validate that the per-criterion scoring weights sum to 1.0.
pub fn validate_weight_sum(weights: &ScoringWeights) -> Result<(), ValidationError> {
    const TOLERANCE: f64 = 1e-6;
    let negative = [
        weights.eta,
        weights.specialty,
        weights.beds,
        weights.er_load,
        weights.equipment,
        weights.staff,
    ]
    .iter()
    .any(|w| *w < 0.0);

    if negative || (weights.total() - 1.0).abs() > TOLERANCE {
        return Err(ValidationError::new("weights_must_sum_to_one"));
    }
    Ok(())
}

/// Validate an AVPU consciousness level name.
pub fn validate_avpu(level: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(alert|verbal|pain|unresponsive)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(&level.to_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_avpu_level"))
    }
}

/// Validate log severity level.
pub fn validate_severity(level: &str) -> Result<(), ValidationError> {
    let valid = ["low", "medium", "high", "critical"].contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_severity"))
    }
}

/// Validate intake queue overflow strategy.
pub fn validate_full_queue_strategy(strategy: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(yield|drop)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(strategy) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_full_queue_strategy"))
    }
}
