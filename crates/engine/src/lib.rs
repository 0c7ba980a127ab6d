//! The chaos engine: decides, once per tick and per bound application,
//! whether to terminate one of its instances.

pub mod clock;
pub mod eligibility;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use eligibility::{is_due, should_inject};
pub use scheduler::{ChaosScheduler, FailureStage, TickReport, UnitOutcome};
