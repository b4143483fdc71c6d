//! Virtual clock for deterministic simulation and replay.
//!
//! Simulation drivers advance this clock and stamp events from it; live
//! producers stamp events with wall-clock epoch milliseconds at the
//! boundary. The engine itself only ever reads event timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A seedable virtual clock that advances in nanoseconds.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    offset: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Creates a new virtual clock with the given seed (starting time).
    pub fn new(seed: u64) -> Self {
        Self {
            offset: Arc::new(AtomicU64::new(seed)),
        }
    }

    /// Returns the current virtual time in nanoseconds.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    /// Returns the current virtual time in milliseconds.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ns() / 1_000_000
    }

    /// Advances the virtual clock by the given number of nanoseconds.
    #[inline]
    pub fn advance(&self, ns: u64) {
        self.offset.fetch_add(ns, Ordering::Release);
    }
}
