//! Parcel history REST API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use foncier_storage::RegistryStore;
use std::sync::Arc;

use super::parcel::require_parcel;
use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, ApiQuery, PathId},
    types::{CreateHistoryRequest, HistoryQuery},
};

#[cfg(feature = "openapi")]
use foncier_core::ParcelHistory;

#[derive(Clone)]
pub struct HistoryState {
    pub store: Arc<dyn RegistryStore>,
}

impl HistoryState {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

/// GET /api/parcels/{id}/history - Audit trail of a parcel
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels/{id}/history",
    tag = "History",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "History entries, newest first", body = Vec<ParcelHistory>),
        (status = 400, description = "Invalid date filter", body = ApiError),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn list_history(
    State(state): State<Arc<HistoryState>>,
    PathId(parcel_id): PathId,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    require_parcel(state.store.as_ref(), parcel_id).await?;
    let entries = state.store.history_list(parcel_id, &filter).await?;
    Ok(Json(entries))
}

/// POST /api/parcels/{id}/history - Record a manual history entry
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/parcels/{id}/history",
    tag = "History",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID")
    ),
    request_body = CreateHistoryRequest,
    responses(
        (status = 201, description = "Entry recorded", body = ParcelHistory),
        (status = 400, description = "Invalid change set", body = ApiError),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn create_history(
    State(state): State<Arc<HistoryState>>,
    PathId(parcel_id): PathId,
    ApiJson(req): ApiJson<CreateHistoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = req.into_entry(parcel_id, Utc::now())?;
    state.store.history_insert(&entry).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub fn create_router(store: Arc<dyn RegistryStore>) -> Router {
    let state = Arc::new(HistoryState::new(store));

    Router::new()
        .route("/parcels/:id/history", get(list_history).post(create_history))
        .with_state(state)
}
