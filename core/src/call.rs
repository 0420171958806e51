//! Call record and its lifecycle state.
//!
//! State machine:
//!   Pending  --accept-->   Assigned --complete--> Completed
//!   Assigned --escalate--> Pending   (required tier raised)
//!
//! Completed is terminal. Only Employee drives these transitions.

use crate::{
    tier::Tier,
    types::{CallId, EmployeeId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Pending,
    Assigned,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    call_id:           CallId,
    required_tier:     Tier,
    state:             CallState,
    /// Lookup only. The dispatcher's pools own employees.
    assigned_employee: Option<EmployeeId>,
    escalations:       u32,
}

impl Call {
    pub fn new(call_id: CallId, required_tier: Tier) -> Self {
        Self {
            call_id,
            required_tier,
            state: CallState::Pending,
            assigned_employee: None,
            escalations: 0,
        }
    }

    pub fn id(&self) -> CallId {
        self.call_id
    }

    pub fn required_tier(&self) -> Tier {
        self.required_tier
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn assigned_employee(&self) -> Option<&str> {
        self.assigned_employee.as_deref()
    }

    /// How many times this call has been escalated.
    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    pub fn is_completed(&self) -> bool {
        self.state == CallState::Completed
    }

    pub(crate) fn bind(&mut self, employee_id: EmployeeId) {
        self.assigned_employee = Some(employee_id);
        self.state = CallState::Assigned;
    }

    pub(crate) fn finish(&mut self) {
        self.assigned_employee = None;
        self.state = CallState::Completed;
    }

    /// Back to Pending at `tier`. The required tier is never lowered.
    pub(crate) fn return_for_escalation(&mut self, tier: Tier) {
        self.required_tier = self.required_tier.max(tier);
        self.assigned_employee = None;
        self.state = CallState::Pending;
        self.escalations += 1;
    }
}
