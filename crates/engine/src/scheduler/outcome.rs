//! Result types for units and ticks.

use std::fmt;

/// Where a unit's processing broke off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Probe,
    Kill,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => f.write_str("probe"),
            Self::Kill => f.write_str("kill"),
        }
    }
}

/// How one unit ended for this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// Interval has not elapsed, or the timestamp was unreadable.
    NotDue,
    /// The pre-roll `last_processed` write failed; nothing else was tried.
    ClaimFailed,
    /// Claimed, but the roll said no.
    Spared,
    /// Claimed and rolled, but at least one instance was not running.
    Unhealthy,
    /// An instance kill was requested.
    Killed { index: u32 },
    /// A platform call failed or timed out.
    Failed { stage: FailureStage, error: String },
}

/// Tally of unit outcomes for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evaluated: usize,
    pub not_due: usize,
    pub claim_failed: usize,
    pub spared: usize,
    pub unhealthy: usize,
    pub killed: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn record(&mut self, outcome: &UnitOutcome) {
        self.evaluated += 1;
        match outcome {
            UnitOutcome::NotDue => self.not_due += 1,
            UnitOutcome::ClaimFailed => self.claim_failed += 1,
            UnitOutcome::Spared => self.spared += 1,
            UnitOutcome::Unhealthy => self.unhealthy += 1,
            UnitOutcome::Killed { .. } => self.killed += 1,
            UnitOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluated={} not_due={} claim_failed={} spared={} unhealthy={} killed={} failed={}",
            self.evaluated,
            self.not_due,
            self.claim_failed,
            self.spared,
            self.unhealthy,
            self.killed,
            self.failed
        )
    }
}
