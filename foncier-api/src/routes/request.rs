//! Citizen document request REST API Routes
//!
//! Requests start `En attente` and are either approved or rejected once.

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

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, ApiQuery, PathId},
    types::{transition_request, CreateDocumentRequest, RequestListQuery, UpdateRequestStatus},
};

#[cfg(feature = "openapi")]
use foncier_core::DocumentRequest;

#[derive(Clone)]
pub struct RequestState {
    pub store: Arc<dyn RegistryStore>,
}

impl RequestState {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}

/// GET /api/requests - List citizen requests
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Requests, newest first", body = Vec<DocumentRequest>),
        (status = 400, description = "Unknown status", body = ApiError),
    ),
))]
pub async fn list_requests(
    State(state): State<Arc<RequestState>>,
    ApiQuery(params): ApiQuery<RequestListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = params.status()?;
    let requests = state.store.request_list(status).await?;
    Ok(Json(requests))
}

/// POST /api/requests - File a request
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Request filed", body = DocumentRequest),
        (status = 400, description = "Missing or invalid field", body = ApiError),
    ),
))]
pub async fn create_request(
    State(state): State<Arc<RequestState>>,
    ApiJson(req): ApiJson<CreateDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = req.into_request(Utc::now())?;
    state.store.request_insert(&request).await?;

    tracing::info!(request_id = %request.id, reference = %request.parcel_reference, "request filed");
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/requests/{id} - Get a request
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(
        ("id" = uuid::Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request details", body = DocumentRequest),
        (status = 404, description = "Request not found", body = ApiError),
    ),
))]
pub async fn get_request(
    State(state): State<Arc<RequestState>>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .request_get(id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::request_not_found)
}

/// PUT /api/requests/{id}/status - Approve or reject a request
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/requests/{id}/status",
    tag = "Requests",
    params(
        ("id" = uuid::Uuid, Path, description = "Request ID")
    ),
    request_body = UpdateRequestStatus,
    responses(
        (status = 200, description = "Request after the transition", body = DocumentRequest),
        (status = 400, description = "Unknown status", body = ApiError),
        (status = 404, description = "Request not found", body = ApiError),
        (status = 409, description = "Request already decided", body = ApiError),
    ),
))]
pub async fn update_request_status(
    State(state): State<Arc<RequestState>>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateRequestStatus>,
) -> ApiResult<impl IntoResponse> {
    let target = req.target()?;
    let current = state
        .store
        .request_get(id)
        .await?
        .ok_or_else(ApiError::request_not_found)?;

    match transition_request(&current, target, Utc::now())? {
        Some(updated) => {
            state.store.request_update(&updated).await?;
            tracing::info!(request_id = %id, from = %current.status, to = %updated.status, "request status changed");
            Ok(Json(updated))
        }
        None => Ok(Json(current)),
    }
}

pub fn create_router(store: Arc<dyn RegistryStore>) -> Router {
    let state = Arc::new(RequestState::new(store));

    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/status", put(update_request_status))
        .with_state(state)
}
