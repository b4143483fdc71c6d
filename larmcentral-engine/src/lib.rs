//! ## larmcentral-engine
//! **Allocation engine: the authoritative dispatch state machine**
//!
//! Owns the in-memory state of emergencies, ambulances, and hospitals;
//! drains the intake bus strictly one event at a time; invokes the triage,
//! routing, and scoring leaves; commits reservations atomically; and
//! publishes ordered notifications plus a consistent read snapshot after
//! every applied event.

pub mod engine;

pub use engine::{DispatchProcessor, DispatchRuntime, DispatchState, Roster};

pub mod prelude {
    pub use crate::engine::{DispatchProcessor, DispatchRuntime, DispatchState, Roster};
}
