//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::BrokerState;

/// Build the broker router with all routes and middleware.
pub fn build_router(state: Arc<BrokerState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/v2/catalog", get(api::catalog))
        .route(
            "/v2/service_instances/{id}",
            get(api::get_instance)
                .put(api::provision)
                .delete(api::deprovision),
        )
        .route(
            "/v2/service_instances/{id}/service_bindings/{binding_id}",
            put(api::bind).delete(api::unbind),
        )
        .route(
            "/dashboard/{id}",
            get(api::dashboard).post(api::update_settings),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
