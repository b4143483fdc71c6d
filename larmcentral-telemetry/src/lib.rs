//! ## larmcentral-telemetry
//! **Structured logging and dispatch metrics**
//!
//! ### Components:
//! - `logging/`: tracing subscriber setup and structured dispatch events
//! - `metrics/`: Prometheus counters and decision-latency histogram

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
