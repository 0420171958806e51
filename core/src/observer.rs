//! Notification hooks for external collaborators (logging, metrics, storage).
//!
//! RULE: Observers are called synchronously, after the dispatcher has
//! finished mutating state for that step. They see read-only views and
//! cannot alter routing.

use crate::{call::Call, employee::Employee, event::DispatchEvent, tier::Tier};
use std::any::Any;

/// Every hook defaults to a no-op; implement only what you need.
pub trait DispatchObserver: Send {
    /// Every event, in emission order.
    fn on_event(&mut self, _event: &DispatchEvent) {}

    fn on_call_assigned(&mut self, _call: &Call, _employee: &Employee) {}

    fn on_call_queued(&mut self, _call: &Call, _backlog_len: usize) {}

    /// `call` is already Pending at its raised tier, not yet re-routed.
    fn on_call_escalated(&mut self, _call: &Call, _from_tier: Tier) {}

    /// `call` is Completed and no longer tracked by the dispatcher.
    fn on_call_completed(&mut self, _call: &Call) {}

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Collects every event in memory until taken.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<DispatchEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DispatchEvent] {
        &self.events
    }

    /// Drain everything collected so far.
    pub fn take(&mut self) -> Vec<DispatchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.events.iter().filter(|e| e.type_name() == type_name).count()
    }
}

impl DispatchObserver for EventLog {
    fn on_event(&mut self, event: &DispatchEvent) {
        self.events.push(event.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
