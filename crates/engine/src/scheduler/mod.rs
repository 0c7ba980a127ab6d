//! Per-tick chaos evaluation over every bound application.
//!
//! [`ChaosScheduler::run_tick`] loads the registrations once and walks them in
//! order: eligibility, claim, roll, health probe, kill. Each unit ends in a
//! [`UnitOutcome`]; a failure in one unit never stops the others.
//! [`ChaosScheduler::run_forever`] drives ticks from a fixed interval.

mod core;
mod outcome;
mod runner;

#[cfg(test)]
mod tests;

pub use self::core::ChaosScheduler;
pub use self::outcome::{FailureStage, TickReport, UnitOutcome};
