//! Settings view for one registration.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use havoc_core::{validate_settings, MAX_FREQUENCY, MIN_FREQUENCY};

use crate::error::{ApiError, ApiResult};
use crate::state::BrokerState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub instance_id: String,
    pub probability: f64,
    pub frequency: i32,
    pub min_frequency: i32,
    pub max_frequency: i32,
}

/// Raw form fields; parsed by hand so a malformed number is a 400 with a
/// message rather than an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub probability: String,
    #[serde(default)]
    pub frequency: String,
}

impl SettingsForm {
    fn parse(&self) -> Result<(f64, i32), ApiError> {
        let probability = self.probability.trim().parse::<f64>().map_err(|_| {
            ApiError::BadRequest(format!("invalid probability: {:?}", self.probability))
        })?;
        let frequency = self.frequency.trim().parse::<i32>().map_err(|_| {
            ApiError::BadRequest(format!("invalid frequency: {:?}", self.frequency))
        })?;
        Ok((probability, frequency))
    }
}

fn view(instance_id: String, probability: f64, frequency: i32) -> DashboardResponse {
    DashboardResponse {
        instance_id,
        probability,
        frequency,
        min_frequency: MIN_FREQUENCY,
        max_frequency: MAX_FREQUENCY,
    }
}

/// `GET /dashboard/{id}`
pub async fn dashboard(
    State(state): State<Arc<BrokerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DashboardResponse>> {
    match state.store.get_instance(&id).await? {
        Some(instance) => Ok(Json(view(instance.id, instance.probability, instance.frequency))),
        None => Err(ApiError::Gone(format!("service instance not found: {id}"))),
    }
}

/// `POST /dashboard/{id}`
pub async fn update_settings(
    State(state): State<Arc<BrokerState>>,
    Path(id): Path<String>,
    Form(form): Form<SettingsForm>,
) -> ApiResult<(StatusCode, Json<DashboardResponse>)> {
    if state.store.get_instance(&id).await?.is_none() {
        return Err(ApiError::Gone(format!("service instance not found: {id}")));
    }

    let (probability, frequency) = form.parse()?;
    validate_settings(probability, frequency)?;

    state.store.update_instance(&id, probability, frequency).await?;
    info!(instance_id = %id, probability, frequency, "chaos settings updated");
    Ok((StatusCode::ACCEPTED, Json(view(id, probability, frequency))))
}
