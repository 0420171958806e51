//! Tiered call dispatch.
//!
//! Calls carry a required tier. The dispatcher hands each one to the
//! least-senior free employee at or above that tier, re-routes escalated
//! calls one tier up, and drains a FIFO backlog as employees free up.

pub mod call;
pub mod config;
pub mod dispatcher;
pub mod employee;
pub mod error;
pub mod event;
pub mod observer;
pub mod rng;
pub mod simulation;
pub mod store;
pub mod tier;
pub mod types;

pub use call::{Call, CallState};
pub use dispatcher::{Dispatcher, Routing};
pub use employee::Employee;
pub use error::{DispatchError, DispatchResult};
pub use event::DispatchEvent;
pub use observer::{DispatchObserver, EventLog};
pub use tier::Tier;
pub use types::CallId;
