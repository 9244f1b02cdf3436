//! e-Foncier API Server Entry Point
//!
//! Bootstraps telemetry and configuration, opens the registry store and
//! starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use foncier_api::telemetry::{init_tracer, TelemetryConfig};
use foncier_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, DbClient, DbConfig, DocumentStorage,
    StoreKind,
};
use foncier_storage::{MemoryStore, RegistryStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let store = open_store(api_config.store).await?;

    DocumentStorage::new(api_config.upload_dir.clone())
        .ensure_root()
        .await?;

    let app: Router = create_api_router(store, &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(
        %addr,
        store = ?api_config.store,
        seed_enabled = api_config.seed_enabled,
        "Starting e-Foncier API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(kind: StoreKind) -> ApiResult<Arc<dyn RegistryStore>> {
    match kind {
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Postgres => {
            let db_config = DbConfig::from_env();
            let db = DbClient::from_config(&db_config)?;
            db.migrate().await?;
            tracing::info!(pool_size = db.pool_size(), "Database schema ready");
            Ok(Arc::new(db))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("FONCIER_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("FONCIER_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
