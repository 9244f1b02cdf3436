//! API Configuration Module
//!
//! CORS, upload storage, seeding and store selection. Everything is read
//! from environment variables once at startup, with development defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default cap on request bodies, which bounds document uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// STORE SELECTION
// ============================================================================

/// Which [`foncier_storage::RegistryStore`] backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" => Ok(StoreKind::Memory),
            other => Err(format!("Unknown store kind: {}", other)),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Root directory for uploaded parcel documents, served under `/uploads`.
    pub upload_dir: PathBuf,

    /// Request body cap in bytes.
    pub max_upload_bytes: usize,

    /// Whether `POST /api/seed` is mounted.
    pub seed_enabled: bool,

    /// Per-request timeout.
    pub request_timeout: Duration,

    pub store: StoreKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            upload_dir: PathBuf::from("data/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_enabled: true,
            request_timeout: Duration::from_secs(30),
            store: StoreKind::Postgres,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FONCIER_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `FONCIER_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `FONCIER_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `FONCIER_UPLOAD_DIR`: Document root (default: data/uploads)
    /// - `FONCIER_MAX_UPLOAD_BYTES`: Body cap (default: 25 MiB)
    /// - `FONCIER_SEED_ENABLED`: Mount the seed endpoint (default: true unless
    ///   `FONCIER_ENVIRONMENT=production`)
    /// - `FONCIER_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `FONCIER_STORE`: `postgres` or `memory` (default: postgres)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("FONCIER_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let production = std::env::var("FONCIER_ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let store = match std::env::var("FONCIER_STORE") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "falling back to the postgres store");
                StoreKind::Postgres
            }),
            Err(_) => defaults.store,
        };

        Self {
            cors_origins,
            cors_allow_credentials: env_flag("FONCIER_CORS_ALLOW_CREDENTIALS").unwrap_or(false),
            cors_max_age_secs: env_parse("FONCIER_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            upload_dir: std::env::var("FONCIER_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_parse("FONCIER_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            seed_enabled: env_flag("FONCIER_SEED_ENABLED").unwrap_or(!production),
            request_timeout: env_parse("FONCIER_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            store,
        }
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // *.example.cd
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
