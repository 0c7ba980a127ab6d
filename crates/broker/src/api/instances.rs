//! Provision, read and deprovision chaos registrations.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use havoc_core::ServiceInstance;

use crate::error::{ApiError, ApiResult};
use crate::state::BrokerState;

use super::EmptyResponse;

/// Only plan the catalog offers.
const DEFAULT_PLAN_ID: &str = "default";

#[derive(Debug, Serialize)]
pub struct InstanceResponse {
    pub dashboard_url: String,
    pub probability: f64,
    pub frequency: i32,
}

impl From<&ServiceInstance> for InstanceResponse {
    fn from(instance: &ServiceInstance) -> Self {
        Self {
            dashboard_url: instance.dashboard_url.clone(),
            probability: instance.probability,
            frequency: instance.frequency,
        }
    }
}

/// `PUT /v2/service_instances/{id}`
///
/// The request body (service, plan, org and space ids) is not consulted: every
/// instance gets the configured defaults and the single `default` plan.
pub async fn provision(
    State(state): State<Arc<BrokerState>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<InstanceResponse>)> {
    let instance = ServiceInstance {
        dashboard_url: state.dashboard_url(&id),
        plan_id: DEFAULT_PLAN_ID.to_string(),
        probability: state.config.default_probability,
        frequency: state.config.default_frequency,
        id,
    };
    state.store.create_instance(&instance).await?;
    info!(instance_id = %instance.id, "service instance provisioned");
    Ok((StatusCode::CREATED, Json(InstanceResponse::from(&instance))))
}

/// `GET /v2/service_instances/{id}`
pub async fn get_instance(
    State(state): State<Arc<BrokerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InstanceResponse>> {
    match state.store.get_instance(&id).await? {
        Some(instance) => Ok(Json(InstanceResponse::from(&instance))),
        None => Err(ApiError::NotFound(format!("service instance not found: {id}"))),
    }
}

/// `DELETE /v2/service_instances/{id}`
pub async fn deprovision(
    State(state): State<Arc<BrokerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmptyResponse>> {
    if state.store.get_instance(&id).await?.is_none() {
        return Err(ApiError::Gone(format!("service instance not found: {id}")));
    }
    state.store.delete_instance(&id).await?;
    info!(instance_id = %id, "service instance deprovisioned");
    Ok(Json(EmptyResponse {}))
}
