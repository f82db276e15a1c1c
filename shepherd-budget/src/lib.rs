#![deny(missing_docs)]
//! The scheduler's budget ledger.
//!
//! The ledger itself — [`BudgetLimits`], [`BudgetState`], [`BudgetExceeded`] —
//! lives in `shepherd-types` since the scheduler, the CLI surface, and the
//! bot surface all need to construct and inspect it without depending on
//! this crate's invariant test suite. This crate re-exports that ledger as
//! the component boundary the rest of the workspace depends on, and carries
//! the property tests that pin down its check-before-book discipline.

pub use shepherd_types::{BudgetExceeded, BudgetLimits, BudgetState};
