//! Shared primitive types used across the dispatch core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulator tick. One tick = one dispatch round.
pub type Tick = u64;

/// Stable identifier for an employee, assigned by the roster.
pub type EmployeeId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Handle returned by the dispatcher when a call is submitted.
/// Ids are handed out sequentially per dispatcher and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{:08x}", self.0)
    }
}
