//! Note REST API Routes
//!
//! Free-text annotations scoped to a parcel.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use foncier_storage::RegistryStore;
use std::sync::Arc;

use super::parcel::require_parcel;
use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, PathId, PathIds},
    types::{CreateNoteRequest, UpdateNoteRequest},
};

#[cfg(feature = "openapi")]
use foncier_core::ParcelNote;

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for note routes.
#[derive(Clone)]
pub struct NoteState {
    pub store: Arc<dyn RegistryStore>,
}

impl NoteState {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/parcels/{id}/notes - List notes of a parcel
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels/{id}/notes",
    tag = "Notes",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID")
    ),
    responses(
        (status = 200, description = "Notes, newest first", body = Vec<ParcelNote>),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn list_notes(
    State(state): State<Arc<NoteState>>,
    PathId(parcel_id): PathId,
) -> ApiResult<impl IntoResponse> {
    require_parcel(state.store.as_ref(), parcel_id).await?;
    let notes = state.store.note_list(parcel_id).await?;
    Ok(Json(notes))
}

/// POST /api/parcels/{id}/notes - Add a note
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/parcels/{id}/notes",
    tag = "Notes",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID")
    ),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = ParcelNote),
        (status = 400, description = "Missing note text", body = ApiError),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn create_note(
    State(state): State<Arc<NoteState>>,
    PathId(parcel_id): PathId,
    ApiJson(req): ApiJson<CreateNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let note = req.into_note(parcel_id, Utc::now())?;
    state.store.note_insert(&note).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/parcels/{id}/notes/{note_id} - Edit a note
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/parcels/{id}/notes/{note_id}",
    tag = "Notes",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID"),
        ("note_id" = uuid::Uuid, Path, description = "Note ID"),
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = ParcelNote),
        (status = 400, description = "Missing note text", body = ApiError),
        (status = 404, description = "Note not found", body = ApiError),
    ),
))]
pub async fn update_note(
    State(state): State<Arc<NoteState>>,
    PathIds(parcel_id, note_id): PathIds,
    ApiJson(req): ApiJson<UpdateNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let current = state
        .store
        .note_get(parcel_id, note_id)
        .await?
        .ok_or_else(ApiError::note_not_found)?;

    let note = req.apply(&current, Utc::now())?;
    state.store.note_update(&note).await?;
    Ok(Json(note))
}

/// DELETE /api/parcels/{id}/notes/{note_id} - Delete a note
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/parcels/{id}/notes/{note_id}",
    tag = "Notes",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID"),
        ("note_id" = uuid::Uuid, Path, description = "Note ID"),
    ),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "Note not found", body = ApiError),
    ),
))]
pub async fn delete_note(
    State(state): State<Arc<NoteState>>,
    PathIds(parcel_id, note_id): PathIds,
) -> ApiResult<StatusCode> {
    if !state.store.note_delete(parcel_id, note_id).await? {
        return Err(ApiError::note_not_found());
    }
    tracing::debug!(%parcel_id, %note_id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(store: Arc<dyn RegistryStore>) -> Router {
    let state = Arc::new(NoteState::new(store));

    Router::new()
        .route("/parcels/:id/notes", get(list_notes).post(create_note))
        .route(
            "/parcels/:id/notes/:note_id",
            put(update_note).delete(delete_note),
        )
        .with_state(state)
}
