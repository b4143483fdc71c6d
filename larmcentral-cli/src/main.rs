//! ## larmcentral-cli
//! **Operational entrypoint for the dispatch decision core**
//!
//! Deterministic scenario replay (with hash validation) and seeded fuzz
//! runs against the allocation engine.

use clap::Parser;

use larmcentral_telemetry::logging::EventLogger;
use larmcentral_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let metrics = MetricsRecorder::new();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(sim_args) => commands::run_simulation_mode(sim_args, metrics).await,
        Commands::Fuzz(fuzz_args) => commands::run_fuzz_mode(fuzz_args, metrics).await,
    }
}
