//! The platform contract the engine depends on, plus the two pure decisions
//! made over instance states.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Lifecycle state of one application instance as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Running,
    Starting,
    Crashed,
    Down,
    /// Any state this crate does not name.
    Other(String),
}

impl From<String> for InstanceState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "RUNNING" => Self::Running,
            "STARTING" => Self::Starting,
            "CRASHED" => Self::Crashed,
            "DOWN" => Self::Down,
            _ => Self::Other(raw),
        }
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("RUNNING"),
            Self::Starting => f.write_str("STARTING"),
            Self::Crashed => f.write_str("CRASHED"),
            Self::Down => f.write_str("DOWN"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Instance index → state.
pub type InstanceStates = HashMap<u32, InstanceState>;

/// Access to the control plane hosting the target applications.
#[async_trait]
pub trait PlatformProbe: Send + Sync {
    /// Current state of every instance of `app_id`. Empty if it has none.
    async fn list_instance_states(&self, app_id: &str) -> Result<InstanceStates, PlatformError>;

    /// Request termination of one instance. Does not wait for the platform to
    /// act on it.
    async fn kill_instance(&self, app_id: &str, index: u32) -> Result<(), PlatformError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        "platform"
    }
}

/// True iff every instance is running. An empty set is vacuously healthy.
pub fn is_healthy(states: &InstanceStates) -> bool {
    states.values().all(|s| *s == InstanceState::Running)
}

/// The first index the map yields.
///
/// Selection follows `HashMap` iteration order: arbitrary, not weighted and
/// not uniform over the instance count. An empty map yields index 0.
pub fn pick_instance(states: &InstanceStates) -> u32 {
    states.keys().next().copied().unwrap_or(0)
}
