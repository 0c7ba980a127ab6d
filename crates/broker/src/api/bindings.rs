//! Bind and unbind applications to a registration.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use havoc_core::ServiceBinding;

use crate::error::{ApiError, ApiResult};
use crate::state::BrokerState;

use super::EmptyResponse;

#[derive(Debug, Deserialize)]
pub struct BindRequest {
    #[serde(default)]
    pub app_guid: String,
}

#[derive(Debug, Serialize)]
pub struct Credentials {
    pub probability: f64,
    pub frequency: i32,
}

#[derive(Debug, Serialize)]
pub struct BindResponse {
    pub credentials: Credentials,
}

/// `PUT /v2/service_instances/{id}/service_bindings/{binding_id}`
pub async fn bind(
    State(state): State<Arc<BrokerState>>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Json(req): Json<BindRequest>,
) -> ApiResult<(StatusCode, Json<BindResponse>)> {
    let Some(instance) = state.store.get_instance(&instance_id).await? else {
        return Err(ApiError::NotFound(format!(
            "service instance not found: {instance_id}"
        )));
    };
    if req.app_guid.trim().is_empty() {
        return Err(ApiError::BadRequest("app_guid is required".to_string()));
    }

    let binding = ServiceBinding {
        id: binding_id,
        app_id: req.app_guid,
        service_plan_id: instance.plan_id.clone(),
        service_instance_id: instance.id.clone(),
        last_processed: None,
    };
    state.store.create_binding(&binding).await?;
    info!(
        instance_id = %instance.id,
        binding_id = %binding.id,
        app_id = %binding.app_id,
        "application bound"
    );

    Ok((
        StatusCode::CREATED,
        Json(BindResponse {
            credentials: Credentials {
                probability: instance.probability,
                frequency: instance.frequency,
            },
        }),
    ))
}

/// `DELETE /v2/service_instances/{id}/service_bindings/{binding_id}`
pub async fn unbind(
    State(state): State<Arc<BrokerState>>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> ApiResult<Json<EmptyResponse>> {
    if state.store.get_instance(&instance_id).await?.is_none() {
        return Err(ApiError::Gone(format!(
            "service instance not found: {instance_id}"
        )));
    }
    state.store.delete_binding(&binding_id).await?;
    info!(instance_id = %instance_id, binding_id = %binding_id, "application unbound");
    Ok(Json(EmptyResponse {}))
}
