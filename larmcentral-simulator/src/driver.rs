//! Drivers feeding the engine during simulation.

use std::collections::VecDeque;

use async_trait::async_trait;

use larmcentral_core::events::DispatchEvent;
use larmcentral_core::time::VirtualClock;
use larmcentral_core::DispatchError;

use crate::scenario::{Scenario, TimedEvent};

/// Produces the next intake event of a simulation, or `None` when done.
#[async_trait]
pub trait DispatchDriver: Send + Sync {
    async fn next_event(&mut self) -> Result<Option<DispatchEvent>, DispatchError>;
}

/// Replays a scripted scenario on the virtual clock.
pub struct ScenarioDriver {
    events: VecDeque<TimedEvent>,
    clock: VirtualClock,
}

impl ScenarioDriver {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            events: scenario.events.iter().cloned().collect(),
            clock: VirtualClock::new(0),
        }
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }
}

#[async_trait]
impl DispatchDriver for ScenarioDriver {
    async fn next_event(&mut self) -> Result<Option<DispatchEvent>, DispatchError> {
        let Some(timed) = self.events.pop_front() else {
            return Ok(None);
        };

        // Advance virtual time to the scripted submission point.
        let now_ms = self.clock.now_ms();
        if timed.at_ms > now_ms {
            self.clock.advance((timed.at_ms - now_ms) * 1_000_000);
        }

        Ok(Some(DispatchEvent::new(timed.at_ms, timed.kind)))
    }
}
