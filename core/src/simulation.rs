//! Traffic simulator: a deterministic event source driving a Dispatcher.
//!
//! EXECUTION ORDER per tick (fixed, never reordered):
//!   1. Handling: every employee busy at the start of the tick, junior pool
//!      first and in roster order, completes or escalates (or keeps talking).
//!   2. Arrivals: per tier, junior first, up to `arrival_attempts_per_tick`
//!      new calls.
//!   3. Flush: the tick's events are folded into the summary and, if a
//!      store is attached, persisted.
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - The simulator only uses the public dispatch API, like any caller.

use crate::{
    config::{DispatchConfig, TrafficConfig},
    dispatcher::Dispatcher,
    error::DispatchResult,
    event::DispatchEvent,
    observer::EventLog,
    rng::{RngBank, TrafficRng, TrafficStream},
    store::CallStore,
    tier::Tier,
    types::{EmployeeId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub ticks:       Tick,
    pub submitted:   u64,
    pub assigned:    u64,
    pub queued:      u64,
    pub escalated:   u64,
    pub completed:   u64,
    pub drained:     u64,
    pub backlog:     usize,
    pub max_backlog: usize,
}

impl SimulationSummary {
    fn record(&mut self, event: &DispatchEvent) {
        match event {
            DispatchEvent::CallSubmitted { .. } => self.submitted += 1,
            DispatchEvent::CallAssigned { .. } => self.assigned += 1,
            DispatchEvent::CallQueued { .. } => self.queued += 1,
            DispatchEvent::CallEscalated { .. } => self.escalated += 1,
            DispatchEvent::CallCompleted { .. } => self.completed += 1,
            DispatchEvent::BacklogDrained { .. } => self.drained += 1,
        }
    }
}

pub struct TrafficSimulator {
    pub run_id:       RunId,
    pub current_tick: Tick,
    seed:             u64,
    dispatcher:       Dispatcher,
    traffic:          TrafficConfig,
    arrivals:         TrafficRng,
    handling:         TrafficRng,
    store:            Option<CallStore>,
    summary:          SimulationSummary,
}

impl TrafficSimulator {
    pub fn new(run_id: RunId, seed: u64, config: &DispatchConfig) -> DispatchResult<Self> {
        let mut dispatcher = Dispatcher::from_config(config)?;
        dispatcher.register_observer(Box::new(EventLog::new()));

        let bank = RngBank::new(seed);
        Ok(Self {
            run_id,
            current_tick: 0,
            seed,
            dispatcher,
            traffic: config.traffic.clone(),
            arrivals: bank.for_stream(TrafficStream::Arrivals),
            handling: bank.for_stream(TrafficStream::Handling),
            store: None,
            summary: SimulationSummary::default(),
        })
    }

    /// Persist every event and completed call to `store`.
    /// The run row must already exist.
    pub fn with_store(mut self, store: CallStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Direct access for callers driving the dispatcher by hand between
    /// ticks. Call `flush_events` afterwards to record what happened.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn store(&self) -> Option<&CallStore> {
        self.store.as_ref()
    }

    pub fn summary(&self) -> &SimulationSummary {
        &self.summary
    }

    /// Advance one tick. Returns the events emitted during it.
    pub fn tick(&mut self) -> DispatchResult<Vec<DispatchEvent>> {
        self.current_tick += 1;
        let tick = self.current_tick;

        self.handle_busy_employees(tick)?;
        self.generate_arrivals()?;

        let events = self.flush_events()?;
        self.summary.ticks = tick;
        log::debug!(
            "tick={tick} dispatch: events={} active={} backlog={}",
            events.len(),
            self.dispatcher.active_calls(),
            self.dispatcher.backlog_len(),
        );
        Ok(events)
    }

    /// Run n ticks in a loop.
    pub fn run_ticks(&mut self, n: u64) -> DispatchResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        log::info!(
            "run={} ticks={} submitted={} completed={} escalated={} backlog={}",
            self.run_id,
            self.current_tick,
            self.summary.submitted,
            self.summary.completed,
            self.summary.escalated,
            self.summary.backlog,
        );
        Ok(())
    }

    /// Take everything the dispatcher reported since the last flush,
    /// fold it into the summary and persist it at the current tick.
    pub fn flush_events(&mut self) -> DispatchResult<Vec<DispatchEvent>> {
        let events = self
            .dispatcher
            .observer_mut::<EventLog>()
            .map(EventLog::take)
            .unwrap_or_default();

        for event in &events {
            self.summary.record(event);
        }
        self.summary.backlog = self.dispatcher.backlog_len();
        self.summary.max_backlog = self.summary.max_backlog.max(self.summary.backlog);

        if let Some(store) = &self.store {
            for event in &events {
                store.append_event(&self.run_id, self.current_tick, event)?;
            }
        }
        Ok(events)
    }

    fn handle_busy_employees(&mut self, tick: Tick) -> DispatchResult<()> {
        let busy: Vec<(EmployeeId, Tier)> = self
            .dispatcher
            .all_employees()
            .filter(|e| !e.is_free())
            .map(|e| (e.id().to_string(), e.tier()))
            .collect();

        for (employee_id, tier) in busy {
            if self.handling.chance(self.traffic.completion_probability) {
                let call = self.dispatcher.complete_call(&employee_id)?;
                if let Some(store) = &self.store {
                    store.insert_completed_call(&self.run_id, tick, &call)?;
                }
            } else if tier.can_escalate()
                && self.handling.chance(self.traffic.escalation_probability)
            {
                self.dispatcher.escalate_call(&employee_id)?;
            }
        }
        Ok(())
    }

    fn generate_arrivals(&mut self) -> DispatchResult<()> {
        for tier in Tier::ALL {
            let p = self.traffic.arrival_probability.get(tier);
            for _ in 0..self.traffic.arrival_attempts_per_tick {
                if self.arrivals.chance(p) {
                    self.dispatcher.submit_call(tier)?;
                }
            }
        }
        Ok(())
    }
}
