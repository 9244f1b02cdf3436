//! Dashboard statistics routes

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use foncier_storage::RegistryStore;
use std::sync::Arc;

use crate::error::ApiResult;

#[cfg(feature = "openapi")]
use crate::error::ApiError;
#[cfg(feature = "openapi")]
use foncier_core::{ExtendedStats, RegistryStats};

#[derive(Clone)]
pub struct StatsState {
    pub store: Arc<dyn RegistryStore>,
}

/// GET /api/stats - Headline counters
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/stats",
    tag = "Statistics",
    responses(
        (status = 200, description = "Registry counters", body = RegistryStats),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn get_stats(State(state): State<Arc<StatsState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.store.stats().await?))
}

/// GET /api/stats/extended - Reporting figures
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/stats/extended",
    tag = "Statistics",
    responses(
        (status = 200, description = "Dashboard figures", body = ExtendedStats),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn get_extended_stats(
    State(state): State<Arc<StatsState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.store.extended_stats(Utc::now()).await?))
}

pub fn create_router(store: Arc<dyn RegistryStore>) -> Router {
    let state = Arc::new(StatsState { store });

    Router::new()
        .route("/stats", get(get_stats))
        .route("/stats/extended", get(get_extended_stats))
        .with_state(state)
}
