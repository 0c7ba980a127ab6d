//! Registration records and the derived unit the engine evaluates.

use serde::{Deserialize, Serialize};

use crate::error::HavocError;

/// Smallest accepted polling frequency, in minutes.
pub const MIN_FREQUENCY: i32 = 1;
/// Largest accepted polling frequency, in minutes.
pub const MAX_FREQUENCY: i32 = 60;

/// A provisioned chaos registration.
///
/// `probability` and `frequency` only take effect once at least one
/// [`ServiceBinding`] references the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: String,
    #[serde(default)]
    pub dashboard_url: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub frequency: i32,
}

/// Links a registration to one target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub id: String,
    #[serde(rename = "app_guid", default)]
    pub app_id: String,
    #[serde(rename = "plan_id", default)]
    pub service_plan_id: String,
    #[serde(default)]
    pub service_instance_id: String,
    /// Canonical UTC timestamp of the last evaluation, `None` if never evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed: Option<String>,
}

/// A binding joined with its owning instance: one unit of work per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundApp {
    pub app_id: String,
    pub probability: f64,
    pub frequency: i32,
    pub last_processed: Option<String>,
}

/// Check user-supplied chaos settings against the accepted ranges.
pub fn validate_settings(probability: f64, frequency: i32) -> Result<(), HavocError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(HavocError::InvalidSettings(format!(
            "probability must be between 0 and 1, got {probability}"
        )));
    }
    if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
        return Err(HavocError::InvalidSettings(format!(
            "frequency must be between {MIN_FREQUENCY} and {MAX_FREQUENCY}, got {frequency}"
        )));
    }
    Ok(())
}
