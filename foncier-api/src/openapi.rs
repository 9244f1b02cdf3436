//! OpenAPI Specification for the e-Foncier API
//!
//! Generated by utoipa from the request/response types and the route
//! annotations.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::types::*;

// Import route modules for path references
use crate::routes::{document, health, history, note, parcel, request, seed, stats};
use crate::telemetry::metrics;

use foncier_core::{
    AcquisitionType, CityCount, Document, DocumentRequest, ExtendedStats, FieldChange, LandUse,
    MonthlyCount, Parcel, ParcelHistory, ParcelNote, ParcelStatus, ProvinceCount, RegistryStats,
    RequestStatus,
};

/// OpenAPI document for the e-Foncier API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "e-Foncier API",
        version = "0.3.0",
        description = "Land registry: parcels, audit trail, notes, documents and citizen requests",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Parcels", description = "Cadastral parcel records"),
        (name = "History", description = "Per-parcel audit trail"),
        (name = "Notes", description = "Free-text annotations on parcels"),
        (name = "Documents", description = "Files attached to parcels"),
        (name = "Requests", description = "Citizen document requests"),
        (name = "Statistics", description = "Dashboard figures"),
        (name = "Seed", description = "Synthetic data generator"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Parcel Routes ===
        parcel::list_parcels,
        parcel::create_parcel,
        parcel::get_parcel,
        parcel::update_parcel,

        // === History Routes ===
        history::list_history,
        history::create_history,

        // === Note Routes ===
        note::list_notes,
        note::create_note,
        note::update_note,
        note::delete_note,

        // === Document Routes ===
        document::list_documents,
        document::get_document,
        document::upload_documents,

        // === Request Routes ===
        request::list_requests,
        request::create_request,
        request::get_request,
        request::update_request_status,

        // === Statistics & Seed ===
        stats::get_stats,
        stats::get_extended_stats,
        seed::seed,

        // === Infrastructure ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Request Types ===
            CreateParcelRequest, UpdateParcelRequest, ParcelListQuery,
            CreateHistoryRequest, HistoryQuery,
            CreateNoteRequest, UpdateNoteRequest,
            CreateDocumentRequest, UpdateRequestStatus, RequestListQuery,
            SeedRequest, SeedResponse,
            document::UploadDocumentsForm,

            // === Domain Types ===
            Parcel, ParcelStatus, LandUse, AcquisitionType,
            ParcelHistory, FieldChange, ParcelNote, Document,
            DocumentRequest, RequestStatus,
            RegistryStats, ExtendedStats, ProvinceCount, CityCount, MonthlyCount,

            // === Health ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
