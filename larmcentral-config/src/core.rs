//! Core system configuration parameters.
//!
//! Manages fundamental system properties that affect all components:
//! - Intake queue sizing and backpressure behavior

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Core system configuration parameters.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CoreConfig {
    /// Intake queue configuration for producer-to-engine event passing.
    #[validate(nested)]
    pub intake: IntakeConfig,
}

/// Intake queue configuration for the ring-buffer event bus.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct IntakeConfig {
    /// Capacity of the intake queue (must be a power of two).
    #[serde(default = "default_capacity")]
    #[validate(range(min = 128, max = 1048576))]
    #[validate(custom(function = validation::validate_power_of_two))]
    pub capacity: usize,

    /// Strategy when the queue is full (yield or drop).
    #[serde(default = "default_full_queue_strategy")]
    #[validate(custom(function = validation::validate_full_queue_strategy))]
    pub full_queue_strategy: String,
}

fn default_capacity() -> usize {
    4096
}

fn default_full_queue_strategy() -> String {
    "yield".into()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            full_queue_strategy: default_full_queue_strategy(),
        }
    }
}
