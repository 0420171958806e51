//! The dispatcher — routes calls to employees and owns the backlog.
//!
//! ROUTING (fixed, documented, never reordered):
//!   1. Start at the call's required tier.
//!   2. Within a tier, scan employees in roster order; first free one wins.
//!   3. Move one tier up and repeat. Never scan downward.
//!   4. Nobody free: append the call to the back of the backlog.
//!
//! RULES:
//!   - Every public operation runs to completion before returning.
//!     Share a Dispatcher across threads only behind one lock.
//!   - A live call is in exactly one place: an employee slot or the backlog.
//!     Completed calls leave the dispatcher and go back to the caller.
//!   - Only completions drain the backlog, one call per completion,
//!     first routable call in FIFO order (unless the policy also drains
//!     on escalation).
//!   - Routing failure is not an error. Precondition violations are.

use crate::{
    call::{Call, CallState},
    config::{DispatchConfig, DispatchPolicy, RosterConfig},
    employee::Employee,
    error::{DispatchError, DispatchResult},
    event::DispatchEvent,
    observer::DispatchObserver,
    tier::Tier,
    types::{CallId, EmployeeId},
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Where a call ended up after a routing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    Assigned { employee_id: EmployeeId },
    /// `position` is zero-based; 0 is the front of the backlog.
    Queued { position: usize },
}

/// Pool coordinates of an employee: (tier, index within that tier's pool).
type Slot = (Tier, usize);

pub struct Dispatcher {
    pools:        [Vec<Employee>; 3],
    roster_index: HashMap<EmployeeId, Slot>,
    /// Live calls only: Pending (in backlog) or Assigned.
    calls:        HashMap<CallId, Call>,
    backlog:      VecDeque<CallId>,
    next_call_id: u64,
    policy:       DispatchPolicy,
    observers:    Vec<Box<dyn DispatchObserver>>,
}

impl Dispatcher {
    /// Build a dispatcher from three ordered pools.
    /// Fails with `DuplicateEmployee` if an id appears twice.
    pub fn new(roster: &RosterConfig, policy: DispatchPolicy) -> DispatchResult<Self> {
        let mut pools: [Vec<Employee>; 3] = Default::default();
        let mut roster_index = HashMap::new();

        for tier in Tier::ALL {
            for entry in roster.pool(tier) {
                let slot = (tier, pools[tier.index()].len());
                if roster_index.insert(entry.employee_id.clone(), slot).is_some() {
                    return Err(DispatchError::DuplicateEmployee {
                        employee_id: entry.employee_id.clone(),
                    });
                }
                pools[tier.index()].push(Employee::new(
                    entry.employee_id.clone(),
                    entry.name.clone(),
                    tier,
                ));
            }
        }

        log::debug!(
            "dispatch: roster loaded junior={} mid={} senior={}",
            pools[0].len(),
            pools[1].len(),
            pools[2].len(),
        );

        Ok(Self {
            pools,
            roster_index,
            calls: HashMap::new(),
            backlog: VecDeque::new(),
            next_call_id: 0,
            policy,
            observers: Vec::new(),
        })
    }

    pub fn from_config(config: &DispatchConfig) -> DispatchResult<Self> {
        Self::new(&config.roster, config.policy)
    }

    /// Attach an observer. Observers are notified in registration order.
    pub fn register_observer(&mut self, observer: Box<dyn DispatchObserver>) {
        self.observers.push(observer);
    }

    /// First registered observer of type `T`.
    /// For tests and tooling; routing never depends on observers.
    pub fn observer<T: DispatchObserver + 'static>(&self) -> Option<&T> {
        self.observers
            .iter()
            .find_map(|o| o.as_any().downcast_ref::<T>())
    }

    pub fn observer_mut<T: DispatchObserver + 'static>(&mut self) -> Option<&mut T> {
        self.observers
            .iter_mut()
            .find_map(|o| o.as_any_mut().downcast_mut::<T>())
    }

    // ── Inbound operations ─────────────────────────────────────

    /// Create a Pending call at `required_tier` and route it, or queue it
    /// if nobody at or above that tier is free.
    pub fn submit_call(&mut self, required_tier: Tier) -> DispatchResult<CallId> {
        self.next_call_id += 1;
        let call_id = CallId(self.next_call_id);
        self.calls.insert(call_id, Call::new(call_id, required_tier));

        emit(
            &mut self.observers,
            DispatchEvent::CallSubmitted {
                call_id,
                required_tier,
            },
        );
        self.route_or_enqueue(call_id)?;
        Ok(call_id)
    }

    /// Like `submit_call`, with the tier given by name.
    /// Fails with `InvalidTier` before anything is created.
    pub fn submit_named(&mut self, required_tier: &str) -> DispatchResult<CallId> {
        let tier = required_tier.parse::<Tier>()?;
        self.submit_call(tier)
    }

    /// The employee finishes their call. The completed record is handed
    /// back to the caller, then one backlog call is drained if possible.
    pub fn complete_call(&mut self, employee_id: &str) -> DispatchResult<Call> {
        let (tier, idx) = self.locate(employee_id)?;
        let employee = &mut self.pools[tier.index()][idx];
        let call_id = employee
            .current_call()
            .ok_or_else(|| DispatchError::NoActiveCall {
                employee_id: employee_id.to_string(),
            })?;
        let call = self
            .calls
            .get_mut(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;

        employee.complete_call(call)?;
        let call = self
            .calls
            .remove(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;

        log::debug!("dispatch: {call_id} completed by {employee_id} ({tier})");
        self.on_call_completed(&call, employee_id)?;
        Ok(call)
    }

    /// The employee hands their call up one tier. The call is re-routed
    /// immediately or goes to the back of the backlog.
    ///
    /// A Senior always gets `EscalationNotSupported`; the call it holds
    /// stays Assigned to it, unchanged.
    pub fn escalate_call(&mut self, employee_id: &str) -> DispatchResult<Routing> {
        let (tier, idx) = self.locate(employee_id)?;
        let employee = &mut self.pools[tier.index()][idx];
        let (call_id, _) = employee.escalation_target()?;
        let call = self
            .calls
            .get_mut(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;

        let from_tier = call.required_tier();
        let to_tier = employee.escalate_call(call)?;

        log::info!("dispatch: {call_id} escalated by {employee_id} {from_tier} -> {to_tier}");
        self.on_call_escalated(call_id, employee_id, from_tier)
    }

    // ── Hooks ──────────────────────────────────────────────────

    fn on_call_escalated(
        &mut self,
        call_id: CallId,
        employee_id: &str,
        from_tier: Tier,
    ) -> DispatchResult<Routing> {
        let call = self
            .calls
            .get(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;
        let event = DispatchEvent::CallEscalated {
            call_id,
            employee_id: employee_id.to_string(),
            from_tier,
            to_tier: call.required_tier(),
        };
        for observer in self.observers.iter_mut() {
            observer.on_call_escalated(call, from_tier);
        }
        emit(&mut self.observers, event);

        let routing = self.route_or_enqueue(call_id)?;
        if self.policy.drain_on_escalation {
            self.drain_backlog()?;
        }
        Ok(routing)
    }

    fn on_call_completed(&mut self, call: &Call, employee_id: &str) -> DispatchResult<()> {
        for observer in self.observers.iter_mut() {
            observer.on_call_completed(call);
        }
        emit(
            &mut self.observers,
            DispatchEvent::CallCompleted {
                call_id: call.id(),
                employee_id: employee_id.to_string(),
                required_tier: call.required_tier(),
            },
        );
        self.drain_backlog()?;
        Ok(())
    }

    // ── Routing ────────────────────────────────────────────────

    /// The employee a call at `required_tier` would be routed to right now.
    pub fn find_employee_for(&self, required_tier: Tier) -> Option<&Employee> {
        self.free_slot_for(required_tier)
            .map(|(tier, idx)| &self.pools[tier.index()][idx])
    }

    fn free_slot_for(&self, required_tier: Tier) -> Option<Slot> {
        required_tier.and_above().find_map(|tier| {
            self.pools[tier.index()]
                .iter()
                .position(Employee::is_free)
                .map(|idx| (tier, idx))
        })
    }

    fn route_or_enqueue(&mut self, call_id: CallId) -> DispatchResult<Routing> {
        let required_tier = self
            .calls
            .get(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?
            .required_tier();

        match self.free_slot_for(required_tier) {
            Some(slot) => {
                let employee_id = self.assign(call_id, slot)?;
                Ok(Routing::Assigned { employee_id })
            }
            None => {
                let position = self.enqueue(call_id)?;
                Ok(Routing::Queued { position })
            }
        }
    }

    fn assign(&mut self, call_id: CallId, (tier, idx): Slot) -> DispatchResult<EmployeeId> {
        let call = self
            .calls
            .get_mut(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;
        let employee = &mut self.pools[tier.index()][idx];
        employee.accept_call(call)?;

        log::debug!(
            "dispatch: {call_id} ({}) -> {} ({tier})",
            call.required_tier(),
            employee.id(),
        );

        let event = DispatchEvent::CallAssigned {
            call_id,
            employee_id: employee.id().to_string(),
            employee_tier: tier,
            required_tier: call.required_tier(),
        };
        for observer in self.observers.iter_mut() {
            observer.on_call_assigned(call, employee);
        }
        emit(&mut self.observers, event);
        Ok(employee.id().to_string())
    }

    fn enqueue(&mut self, call_id: CallId) -> DispatchResult<usize> {
        let call = self
            .calls
            .get(&call_id)
            .ok_or(DispatchError::UnknownCall { call_id })?;
        self.backlog.push_back(call_id);
        let backlog_len = self.backlog.len();

        log::debug!(
            "dispatch: {call_id} ({}) queued, backlog={backlog_len}",
            call.required_tier(),
        );

        for observer in self.observers.iter_mut() {
            observer.on_call_queued(call, backlog_len);
        }
        emit(
            &mut self.observers,
            DispatchEvent::CallQueued {
                call_id,
                required_tier: call.required_tier(),
                backlog_len,
            },
        );
        Ok(backlog_len - 1)
    }

    /// Assign the first backlog call, in FIFO order, that some free employee
    /// at or above its tier can take. At most one call per invocation.
    fn drain_backlog(&mut self) -> DispatchResult<Option<CallId>> {
        let found = self.backlog.iter().enumerate().find_map(|(position, call_id)| {
            let call = self.calls.get(call_id)?;
            self.free_slot_for(call.required_tier())
                .map(|slot| (position, *call_id, slot))
        });

        let Some((position, call_id, slot)) = found else {
            if !self.backlog.is_empty() {
                log::debug!(
                    "dispatch: backlog has {} calls, none routable",
                    self.backlog.len()
                );
            }
            return Ok(None);
        };

        self.backlog.remove(position);
        let employee_id = self.assign(call_id, slot)?;
        emit(
            &mut self.observers,
            DispatchEvent::BacklogDrained {
                call_id,
                employee_id,
                position,
            },
        );
        Ok(Some(call_id))
    }

    // ── Queries ────────────────────────────────────────────────

    /// A live call. Completed calls are no longer tracked.
    pub fn call(&self, call_id: CallId) -> Option<&Call> {
        self.calls.get(&call_id)
    }

    pub fn employee(&self, employee_id: &str) -> Option<&Employee> {
        self.roster_index
            .get(employee_id)
            .map(|(tier, idx)| &self.pools[tier.index()][*idx])
    }

    /// One tier's pool, in routing priority order.
    pub fn employees(&self, tier: Tier) -> &[Employee] {
        &self.pools[tier.index()]
    }

    /// Every employee, junior pool first.
    pub fn all_employees(&self) -> impl Iterator<Item = &Employee> {
        self.pools.iter().flatten()
    }

    /// Queued calls, front first.
    pub fn backlog(&self) -> impl Iterator<Item = &Call> {
        self.backlog.iter().filter_map(|id| self.calls.get(id))
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn free_count(&self, tier: Tier) -> usize {
        self.pools[tier.index()].iter().filter(|e| e.is_free()).count()
    }

    /// Number of calls currently held by employees.
    pub fn active_calls(&self) -> usize {
        self.all_employees().filter(|e| !e.is_free()).count()
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    fn locate(&self, employee_id: &str) -> DispatchResult<Slot> {
        self.roster_index
            .get(employee_id)
            .copied()
            .ok_or_else(|| DispatchError::UnknownEmployee {
                employee_id: employee_id.to_string(),
            })
    }

    /// Verify every bookkeeping invariant between calls, employees and the
    /// backlog. Returns `InvalidState` describing the first violation found.
    pub fn check_invariants(&self) -> DispatchResult<()> {
        let mut held = HashSet::new();
        for employee in self.all_employees() {
            let Some(call_id) = employee.current_call() else {
                continue;
            };
            let call = self.calls.get(&call_id).ok_or_else(|| {
                DispatchError::invalid_state(format!(
                    "employee '{}' holds untracked {call_id}",
                    employee.id()
                ))
            })?;
            if call.state() != CallState::Assigned {
                return Err(DispatchError::invalid_state(format!(
                    "employee '{}' holds {call_id} in state {:?}",
                    employee.id(),
                    call.state()
                )));
            }
            if call.assigned_employee() != Some(employee.id()) {
                return Err(DispatchError::invalid_state(format!(
                    "{call_id} held by '{}' points at {:?}",
                    employee.id(),
                    call.assigned_employee()
                )));
            }
            if call.required_tier() > employee.tier() {
                return Err(DispatchError::invalid_state(format!(
                    "{call_id} requires {} but is held by {} '{}'",
                    call.required_tier(),
                    employee.tier(),
                    employee.id()
                )));
            }
            if !held.insert(call_id) {
                return Err(DispatchError::invalid_state(format!(
                    "{call_id} is held by more than one employee"
                )));
            }
        }

        let mut queued = HashSet::new();
        for call_id in &self.backlog {
            let call = self.calls.get(call_id).ok_or_else(|| {
                DispatchError::invalid_state(format!("backlog lists untracked {call_id}"))
            })?;
            if call.state() != CallState::Pending || call.assigned_employee().is_some() {
                return Err(DispatchError::invalid_state(format!(
                    "backlog lists {call_id} in state {:?} assigned to {:?}",
                    call.state(),
                    call.assigned_employee()
                )));
            }
            if held.contains(call_id) || !queued.insert(*call_id) {
                return Err(DispatchError::invalid_state(format!(
                    "{call_id} appears in more than one place"
                )));
            }
        }

        for (call_id, call) in &self.calls {
            let placed = match call.state() {
                CallState::Assigned => held.contains(call_id),
                CallState::Pending => queued.contains(call_id),
                CallState::Completed => false,
            };
            if !placed {
                return Err(DispatchError::invalid_state(format!(
                    "{call_id} in state {:?} is neither held nor queued",
                    call.state()
                )));
            }
        }
        Ok(())
    }
}

fn emit(observers: &mut [Box<dyn DispatchObserver>], event: DispatchEvent) {
    for observer in observers.iter_mut() {
        observer.on_event(&event);
    }
}
