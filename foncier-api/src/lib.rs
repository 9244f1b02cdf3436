//! e-Foncier API - REST Layer for the Land Registry
//!
//! Axum routes over a [`foncier_storage::RegistryStore`]: parcels with an
//! audit trail, notes, uploaded documents, citizen document requests,
//! dashboard statistics and a synthetic data generator.
//!
//! The PostgreSQL store lives in [`db`]; the in-memory store from
//! foncier-storage backs tests and local runs.

pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod extractors;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{ApiConfig, StoreKind};
pub use db::{DbClient, DbConfig};
pub use documents::DocumentStorage;
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use types::*;
