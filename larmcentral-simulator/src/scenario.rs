//! Scenario files: a seed, an initial roster, and a timed event script.
//!
//! Scenarios are YAML, replayed on the virtual clock, and expected to
//! produce the same decision-log hash on every run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use larmcentral_core::events::EventKind;
use larmcentral_engine::Roster;

/// One scripted event at a virtual-clock offset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Virtual time of submission (epoch ms).
    pub at_ms: u64,
    pub kind: EventKind,
}

/// A replayable dispatch scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub seed: u64,
    pub roster: Roster,
    pub events: Vec<TimedEvent>,
    /// Decision-log hash from a reference run, if recorded.
    #[serde(default)]
    pub expected_hash: Option<String>,
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    Serde(#[from] serde_yaml::Error),
}

/// Loads a scenario from a YAML file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_yaml::from_str(&content)?;
    Ok(scenario)
}

/// Saves a scenario to a YAML file.
pub fn save_scenario<P: AsRef<Path>>(path: P, scenario: &Scenario) -> Result<(), ScenarioError> {
    let content = serde_yaml::to_string(scenario)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use larmcentral_core::geo::GeoPoint;
    use larmcentral_core::model::{Condition, EmergencyId};

    #[test]
    fn scenario_yaml_round_trip() {
        let scenario = Scenario {
            seed: 7,
            roster: crate::default_roster(),
            events: vec![TimedEvent {
                at_ms: 1000,
                kind: EventKind::CreateEmergency {
                    emergency: EmergencyId::from("EMG-1"),
                    pickup: GeoPoint::new(28.61, 77.21),
                    condition: Condition::Cardiac,
                },
            }],
            expected_hash: None,
        };

        let yaml = serde_yaml::to_string(&scenario).unwrap();
        let parsed: Scenario = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.roster.hospitals.len(), scenario.roster.hospitals.len());
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_scenario("does/not/exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
