//! Mismatch reports for failed replay validation.

use std::{
    collections::HashMap,
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    reports: Vec<String>,
    scenario_hashes: HashMap<String, String>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a mismatch report to disk and returns the filename.
    pub fn record_mismatch_report(&mut self, report: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let filename = format!("replay_mismatch_{}.yaml", timestamp);
        fs::write(&filename, report)
            .unwrap_or_else(|_| panic!("Failed to write mismatch report {}", filename));

        self.reports.push(filename.clone());
        filename
    }

    pub fn record_scenario_hash(&mut self, scenario: &str, hash: &str) {
        self.scenario_hashes
            .insert(scenario.to_string(), hash.to_string());
    }
}
