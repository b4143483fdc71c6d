use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use larmcentral_config::LarmcentralConfig;
use larmcentral_engine::DispatchRuntime;
use larmcentral_simulator::{
    default_roster, load_scenario, DiagnosticsCollector, DispatchDriver, RandomizedEventDriver,
    ScenarioDriver, Simulator,
};
use larmcentral_telemetry::metrics::MetricsRecorder;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario file (or run a seeded random simulation)
    Simulate(SimulateArgs),
    /// Run repeated randomized simulations with incrementing seeds
    Fuzz(FuzzArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Optional scenario file to replay; if not provided, a randomized
    /// simulation is run against the demo roster.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,
    /// Number of events to generate (used when no scenario is provided)
    #[arg(long, default_value_t = 200)]
    pub events: usize,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Expected decision-log hash; the run fails on mismatch
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FuzzArgs {
    /// Initial seed for fuzzing (will auto-increment)
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Number of fuzzing iterations (0 for unlimited)
    #[arg(long, default_value_t = 0)]
    pub iterations: usize,
    /// Maximum events per iteration
    #[arg(long, default_value_t = 1000)]
    pub max_events: usize,
}

pub async fn run_simulation_mode(
    args: SimulateArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = LarmcentralConfig::load()?;

    let hash = match &args.scenario {
        Some(path) => {
            info!("Replaying scenario {}", path.display());
            let scenario = load_scenario(path)?;
            let expected = args
                .validate_hash
                .clone()
                .or_else(|| scenario.expected_hash.clone());

            let mut simulator = Simulator::new(config, scenario.roster.clone(), metrics.clone())?;
            let mut driver = ScenarioDriver::new(&scenario);
            let hash = simulator.run(&mut driver).await?;

            if let Some(expected) = expected {
                if expected != hash {
                    let report = format!(
                        "Replay validation failed!\nExpected: {expected}\nActual: {hash}\n"
                    );
                    let filename = DiagnosticsCollector::new().record_mismatch_report(&report);
                    error!("Mismatch report saved to {filename}");
                    return Err(report.into());
                }
                info!("Replay validation successful");
            }
            hash
        }
        None => {
            info!(
                "Running randomized simulation: seed {}, {} events",
                args.seed, args.events
            );
            let roster = default_roster();
            let mut simulator = Simulator::new(config, roster.clone(), metrics.clone())?;
            let mut driver = RandomizedEventDriver::new(args.seed, args.events, &roster);
            simulator.run(&mut driver).await?
        }
    };

    println!("{hash}");
    if let Ok(report) = metrics.gather_metrics() {
        info!("Metrics:\n{report}");
    }
    Ok(())
}

pub async fn run_fuzz_mode(
    args: FuzzArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if args.iterations == 0 {
        warn!("Infinite fuzz mode activated (Ctrl-C to exit)");
    }

    let mut iteration = 0usize;
    loop {
        if args.iterations > 0 && iteration >= args.iterations {
            break;
        }

        let seed = args.seed + iteration as u64;
        info!("Fuzz iteration {} with seed {seed}", iteration + 1);

        let config = LarmcentralConfig::load()?;
        let roster = default_roster();

        // Fuzz runs go through the intake bus, drained in the background
        // exactly as production producers would be.
        let runtime = DispatchRuntime::new(config, roster.clone(), metrics.clone())?;
        let mut notifications = runtime.subscribe();
        let processor = runtime.spawn_event_processor();

        let mut driver = RandomizedEventDriver::new(seed, args.max_events, &roster);
        let mut submitted = 0usize;
        while let Some(event) = driver.next_event().await? {
            runtime.submit(event)?;
            submitted += 1;
        }
        runtime.intake.close();
        processor.await??;

        let mut decisions = 0usize;
        while notifications.try_recv().is_ok() {
            decisions += 1;
        }
        info!(
            "Iteration {} complete: {submitted} events, {decisions} decisions",
            iteration + 1
        );

        if args.iterations > 0 && (iteration + 1) % 10 == 0 {
            info!("Progress: {}/{}", iteration + 1, args.iterations);
        }
        iteration += 1;
    }

    info!("Fuzz testing complete. Processed {iteration} iterations");
    if let Ok(report) = metrics.gather_metrics() {
        info!("Metrics:\n{report}");
    }
    Ok(())
}
