#![deny(missing_docs)]
//! Drives the model/tool dialogue for one run: call the model, hand any
//! requested tool calls through budget and approval, feed results back,
//! repeat until the model stops calling tools or the budget forbids
//! another model call.

mod approval;
mod scheduler;

pub use approval::{AllowAll, ApprovalGate, DenyAll};
pub use scheduler::{LoopError, Scheduler, SchedulerResult};
