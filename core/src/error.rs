use crate::{
    tier::Tier,
    types::{CallId, EmployeeId},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    // ── Faults: call/employee bookkeeping is already wrong ──
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Employee '{employee_id}' has no active call")]
    NoActiveCall { employee_id: EmployeeId },

    #[error("Employee '{employee_id}' is {tier} and cannot escalate further")]
    EscalationNotSupported { employee_id: EmployeeId, tier: Tier },

    #[error("Invalid tier: '{tier}'")]
    InvalidTier { tier: String },

    // ── Lookups ────────────────────────────────────────────
    #[error("Employee '{employee_id}' not found")]
    UnknownEmployee { employee_id: EmployeeId },

    #[error("Call {call_id} not found")]
    UnknownCall { call_id: CallId },

    #[error("Employee '{employee_id}' appears more than once in the roster")]
    DuplicateEmployee { employee_id: EmployeeId },

    // ── Infrastructure ─────────────────────────────────────
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DispatchError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState { reason: reason.into() }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
