//! Synthetic data generator route
//!
//! Only mounted with a live handler when seeding is enabled; otherwise the
//! path answers 404 like any unknown resource.

use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use chrono::Utc;
use foncier_core::SeedGenerator;
use foncier_storage::RegistryStore;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    telemetry::with_metrics,
    types::{SeedRequest, SeedResponse},
};

#[derive(Clone)]
pub struct SeedState {
    pub store: Arc<dyn RegistryStore>,
    pub enabled: bool,
}

impl SeedState {
    pub fn new(store: Arc<dyn RegistryStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }
}

/// POST /api/seed - Generate synthetic parcels and requests
///
/// The body is optional; an empty body uses the defaults.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/seed",
    tag = "Seed",
    request_body(content = Option<SeedRequest>, content_type = "application/json"),
    responses(
        (status = 201, description = "Data generated", body = SeedResponse),
        (status = 400, description = "Counts out of range", body = ApiError),
        (status = 404, description = "Seeding disabled", body = ApiError),
    ),
))]
pub async fn seed(State(state): State<Arc<SeedState>>, body: Bytes) -> ApiResult<impl IntoResponse> {
    if !state.enabled {
        return Err(ApiError::not_found("Not found"));
    }

    let req: SeedRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SeedRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let (parcel_count, request_count) = req.counts()?;

    let now = Utc::now();
    let mut generator = SeedGenerator::new(req.seed, now);

    let mut references = Vec::with_capacity(parcel_count);
    for _ in 0..parcel_count {
        let parcel = generator.parcel(now);
        state.store.parcel_insert(&parcel).await?;
        references.push(parcel.reference);
    }

    for i in 0..request_count {
        let reference = &references[i % references.len()];
        let request = generator.request(now, reference);
        state.store.request_insert(&request).await?;
    }

    with_metrics(|m| {
        m.record_seeded("parcel", parcel_count);
        m.record_seeded("request", request_count);
    });
    tracing::info!(parcels = parcel_count, requests = request_count, seed = ?req.seed, "registry seeded");

    Ok((
        StatusCode::CREATED,
        Json(SeedResponse {
            parcels_created: parcel_count,
            requests_created: request_count,
        }),
    ))
}

pub fn create_router(store: Arc<dyn RegistryStore>, enabled: bool) -> Router {
    let state = Arc::new(SeedState::new(store, enabled));

    Router::new().route("/seed", post(seed)).with_state(state)
}
