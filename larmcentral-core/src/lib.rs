//! # larmcentral-core
//!
//! Foundation layer for the dispatch decision core: the domain model
//! (emergencies, ambulances, hospitals, vitals, routes), the intake event
//! vocabulary, the lock-free intake bus, the ordered notification fan-out,
//! and the virtual/wall clock abstraction.
//!
//! ### Key Submodules:
//! - `model`: id-indexed entity records and shared value types
//! - `events`: intake ring buffer, typed producer events, notification bus
//! - `geo`: coordinate primitives and great-circle distance
//! - `time`: seedable `VirtualClock` for simulation and replay

pub mod error;
pub mod events;
pub mod geo;
pub mod model;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::geo::*;
    pub use crate::model::*;
    pub use crate::time::*;
}

pub use error::DispatchError;
