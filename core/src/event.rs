//! Dispatch events — everything the dispatcher reports to observers.
//!
//! Variants are append-only: the tag names are persisted in the event log.

use crate::{
    tier::Tier,
    types::{CallId, EmployeeId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    CallSubmitted {
        call_id: CallId,
        required_tier: Tier,
    },
    CallAssigned {
        call_id: CallId,
        employee_id: EmployeeId,
        employee_tier: Tier,
        required_tier: Tier,
    },
    CallQueued {
        call_id: CallId,
        required_tier: Tier,
        backlog_len: usize,
    },
    CallEscalated {
        call_id: CallId,
        employee_id: EmployeeId,
        from_tier: Tier,
        to_tier: Tier,
    },
    CallCompleted {
        call_id: CallId,
        employee_id: EmployeeId,
        required_tier: Tier,
    },
    /// A queued call was pulled from the backlog. `position` is its
    /// zero-based place in the queue at the moment it was taken.
    BacklogDrained {
        call_id: CallId,
        employee_id: EmployeeId,
        position: usize,
    },
}

impl DispatchEvent {
    /// Stable name used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CallSubmitted { .. }  => "call_submitted",
            Self::CallAssigned { .. }   => "call_assigned",
            Self::CallQueued { .. }     => "call_queued",
            Self::CallEscalated { .. }  => "call_escalated",
            Self::CallCompleted { .. }  => "call_completed",
            Self::BacklogDrained { .. } => "backlog_drained",
        }
    }

    pub fn call_id(&self) -> CallId {
        match self {
            Self::CallSubmitted { call_id, .. }
            | Self::CallAssigned { call_id, .. }
            | Self::CallQueued { call_id, .. }
            | Self::CallEscalated { call_id, .. }
            | Self::CallCompleted { call_id, .. }
            | Self::BacklogDrained { call_id, .. } => *call_id,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub call_id: CallId,
    pub event_type: String,
    pub payload: String, // JSON-serialized DispatchEvent
}
