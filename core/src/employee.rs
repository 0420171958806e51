//! Employee: a fixed-tier handler holding at most one call.
//!
//! The three employee kinds differ only in how they escalate, which is
//! the `Tier::next()` ladder. Senior sits at the top and cannot escalate.

use crate::{
    call::{Call, CallState},
    error::{DispatchError, DispatchResult},
    tier::Tier,
    types::{CallId, EmployeeId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    employee_id:  EmployeeId,
    name:         String,
    tier:         Tier,
    current_call: Option<CallId>,
}

impl Employee {
    pub fn new(employee_id: impl Into<EmployeeId>, name: impl Into<String>, tier: Tier) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            tier,
            current_call: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.employee_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn current_call(&self) -> Option<CallId> {
        self.current_call
    }

    pub fn is_free(&self) -> bool {
        self.current_call.is_none()
    }

    /// Bind `call` to this employee.
    ///
    /// Fails with `InvalidState` if this employee is busy, the call is not
    /// Pending, or the call needs a higher tier. Any of these means the
    /// caller routed wrongly; neither side is modified.
    pub fn accept_call(&mut self, call: &mut Call) -> DispatchResult<()> {
        if let Some(held) = self.current_call {
            return Err(DispatchError::invalid_state(format!(
                "employee '{}' already holds {held}, cannot accept {}",
                self.employee_id,
                call.id()
            )));
        }
        if call.state() != CallState::Pending {
            return Err(DispatchError::invalid_state(format!(
                "{} is {:?}, only pending calls can be accepted",
                call.id(),
                call.state()
            )));
        }
        if call.required_tier() > self.tier {
            return Err(DispatchError::invalid_state(format!(
                "{} requires {} but employee '{}' is {}",
                call.id(),
                call.required_tier(),
                self.employee_id,
                self.tier
            )));
        }

        self.current_call = Some(call.id());
        call.bind(self.employee_id.clone());
        Ok(())
    }

    /// Mark the held call Completed and free this employee.
    pub fn complete_call(&mut self, call: &mut Call) -> DispatchResult<()> {
        self.ensure_holds(call)?;
        call.finish();
        self.current_call = None;
        Ok(())
    }

    /// Hand the held call back as Pending at the next tier up.
    /// Returns the call's new required tier.
    pub fn escalate_call(&mut self, call: &mut Call) -> DispatchResult<Tier> {
        let (_, next) = self.escalation_target()?;
        self.ensure_holds(call)?;
        call.return_for_escalation(next);
        self.current_call = None;
        Ok(next)
    }

    /// The held call and the tier it would escalate to.
    ///
    /// The tier check comes first: a Senior is refused with
    /// `EscalationNotSupported` whether or not it holds a call.
    pub fn escalation_target(&self) -> DispatchResult<(CallId, Tier)> {
        let next = self.tier.next().ok_or_else(|| DispatchError::EscalationNotSupported {
            employee_id: self.employee_id.clone(),
            tier: self.tier,
        })?;
        let held = self.current_call.ok_or_else(|| DispatchError::NoActiveCall {
            employee_id: self.employee_id.clone(),
        })?;
        Ok((held, next))
    }

    fn ensure_holds(&self, call: &Call) -> DispatchResult<()> {
        match self.current_call {
            None => Err(DispatchError::NoActiveCall {
                employee_id: self.employee_id.clone(),
            }),
            Some(held) if held != call.id() => Err(DispatchError::invalid_state(format!(
                "employee '{}' holds {held}, not {}",
                self.employee_id,
                call.id()
            ))),
            Some(_) => Ok(()),
        }
    }
}
