use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::catalog::Catalog;
use crate::state::BrokerState;

pub async fn catalog(State(state): State<Arc<BrokerState>>) -> Json<Catalog> {
    debug!("serving service catalog");
    Json(state.catalog.clone())
}
