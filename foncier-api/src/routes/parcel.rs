//! Parcel REST API Routes
//!
//! Registration, lookup, listing and audited updates of parcels.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use foncier_core::{diff_parcels, new_entity_id, Parcel, ParcelHistory};
use foncier_storage::RegistryStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, ApiQuery, PathId},
    telemetry::with_metrics,
    types::{CreateParcelRequest, ParcelListQuery, UpdateParcelRequest, DEFAULT_ACTOR},
};

/// Header naming the user behind a change.
pub const ACTOR_HEADER: &str = "x-user";

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for parcel routes.
#[derive(Clone)]
pub struct ParcelState {
    pub store: Arc<dyn RegistryStore>,
}

impl ParcelState {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

/// Look up a parcel by id, or fail with 404.
pub(crate) async fn require_parcel(
    store: &dyn RegistryStore,
    id: Uuid,
) -> ApiResult<Parcel> {
    store
        .parcel_get(id)
        .await?
        .ok_or_else(ApiError::parcel_not_found)
}

/// Actor from the `X-User` header, `Agent` when absent or blank.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/parcels - List parcels
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels",
    tag = "Parcels",
    params(ParcelListQuery),
    responses(
        (status = 200, description = "Parcels, newest first", body = Vec<Parcel>),
        (status = 400, description = "Invalid filter", body = ApiError),
    ),
))]
pub async fn list_parcels(
    State(state): State<Arc<ParcelState>>,
    ApiQuery(params): ApiQuery<ParcelListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.into_filter()?;
    let parcels = state.store.parcel_list(&filter).await?;
    Ok(Json(parcels))
}

/// POST /api/parcels - Register a parcel
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/parcels",
    tag = "Parcels",
    request_body = CreateParcelRequest,
    responses(
        (status = 201, description = "Parcel registered", body = Parcel),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 409, description = "Reference already exists", body = ApiError),
    ),
))]
pub async fn create_parcel(
    State(state): State<Arc<ParcelState>>,
    ApiJson(req): ApiJson<CreateParcelRequest>,
) -> ApiResult<impl IntoResponse> {
    let parcel = req.into_parcel(Utc::now())?;
    state.store.parcel_insert(&parcel).await?;

    tracing::info!(parcel_id = %parcel.id, reference = %parcel.reference, "parcel registered");
    Ok((StatusCode::CREATED, Json(parcel)))
}

/// GET /api/parcels/{key} - Get a parcel by id or cadastral reference
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels/{key}",
    tag = "Parcels",
    params(
        ("key" = String, Path, description = "Parcel id or cadastral reference")
    ),
    responses(
        (status = 200, description = "Parcel details", body = Parcel),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn get_parcel(
    State(state): State<Arc<ParcelState>>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let by_id = match Uuid::parse_str(&key) {
        Ok(id) => state.store.parcel_get(id).await?,
        Err(_) => None,
    };
    let parcel = match by_id {
        Some(parcel) => Some(parcel),
        None => state.store.parcel_get_by_reference(key.trim()).await?,
    };
    parcel.map(Json).ok_or_else(ApiError::parcel_not_found)
}

/// PUT /api/parcels/{id} - Update a parcel
///
/// Changed fields are recorded in the parcel history under the `X-User`
/// actor in the same write as the update.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/parcels/{id}",
    tag = "Parcels",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID"),
        ("X-User" = Option<String>, Header, description = "Actor recorded in the history"),
    ),
    request_body = UpdateParcelRequest,
    responses(
        (status = 200, description = "Parcel after the update", body = Parcel),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 404, description = "Parcel not found", body = ApiError),
        (status = 409, description = "Reference already exists", body = ApiError),
    ),
))]
pub async fn update_parcel(
    State(state): State<Arc<ParcelState>>,
    PathId(id): PathId,
    headers: HeaderMap,
    ApiJson(req): ApiJson<UpdateParcelRequest>,
) -> ApiResult<impl IntoResponse> {
    let current = require_parcel(state.store.as_ref(), id).await?;
    let mut updated = req.apply(&current)?;

    let changes = diff_parcels(&current, &updated);
    if changes.is_empty() {
        with_metrics(|m| m.record_parcel_update(false));
        return Ok(Json(current));
    }

    let now = Utc::now();
    updated.updated_at = now;
    let entry = ParcelHistory {
        id: new_entity_id(),
        parcel_id: id,
        changes,
        user: actor_from_headers(&headers),
        changed_at: now,
    };
    state.store.parcel_update(&updated, Some(&entry)).await?;

    with_metrics(|m| m.record_parcel_update(true));
    tracing::info!(
        parcel_id = %id,
        user = %entry.user,
        fields = entry.changes.len(),
        "parcel updated"
    );
    Ok(Json(updated))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(store: Arc<dyn RegistryStore>) -> Router {
    let state = Arc::new(ParcelState::new(store));

    Router::new()
        .route("/parcels", get(list_parcels).post(create_parcel))
        .route("/parcels/:id", get(get_parcel).put(update_parcel))
        .with_state(state)
}
