//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, the schema
//! migration run at startup, and the `RegistryStore` implementation the
//! service uses in production.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use foncier_core::{
    fill_monthly_evolution, ChangeSet, CityCount, Document, DocumentRequest, EntityId, EntityType,
    ExtendedStats, FoncierError, FoncierResult, HistoryFilter, LabelParseError, Parcel,
    ParcelFilter, ParcelHistory, ParcelNote, ParcelStatus, ProvinceCount, RegistryStats,
    RequestStatus, StorageError, Timestamp,
};
use foncier_storage::RegistryStore;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create/recycle timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "foncier".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("FONCIER_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("FONCIER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("FONCIER_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("FONCIER_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("FONCIER_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("FONCIER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("FONCIER_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        pool_cfg.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Parcel columns beyond the base table, with the DDL used to add them.
///
/// Databases created by older releases are missing some of these; the
/// migration adds whatever `information_schema` does not report.
pub const PARCEL_COLUMNS: &[(&str, &str)] = &[
    ("parcel_number", "TEXT NOT NULL DEFAULT ''"),
    ("province", "TEXT NOT NULL DEFAULT ''"),
    ("territory_or_city", "TEXT NOT NULL DEFAULT ''"),
    ("commune_or_sector", "TEXT NOT NULL DEFAULT ''"),
    ("quartier_or_cheflieu", "TEXT NOT NULL DEFAULT ''"),
    ("avenue", "TEXT NOT NULL DEFAULT ''"),
    ("gps_lat", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
    ("gps_long", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
    ("area", "DOUBLE PRECISION NOT NULL DEFAULT 0"),
    ("location", "TEXT"),
    ("land_use", "TEXT NOT NULL DEFAULT 'Résidentiel'"),
    ("certificate_number", "TEXT NOT NULL DEFAULT ''"),
    ("issuing_authority", "TEXT NOT NULL DEFAULT ''"),
    ("acquisition_type", "TEXT NOT NULL DEFAULT 'Concession'"),
    ("acquisition_act_ref", "TEXT NOT NULL DEFAULT ''"),
    ("title_date", "DATE NOT NULL DEFAULT DATE '1970-01-01'"),
    ("owner_name", "TEXT NOT NULL DEFAULT ''"),
    ("owner_id_number", "TEXT NOT NULL DEFAULT ''"),
    ("company_name", "TEXT"),
    ("rccm", "TEXT"),
    ("nif", "TEXT"),
    ("surveying_pv_ref", "TEXT NOT NULL DEFAULT ''"),
    ("surveyor_name", "TEXT NOT NULL DEFAULT ''"),
    ("surveyor_license", "TEXT NOT NULL DEFAULT ''"),
    ("cadastral_plan_ref", "TEXT NOT NULL DEFAULT ''"),
    ("servitudes", "TEXT"),
    ("charges", "TEXT"),
    ("litigation", "TEXT"),
];

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS parcels (
        id UUID PRIMARY KEY,
        reference TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'Libre',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS documents (
        id UUID PRIMARY KEY,
        parcel_id UUID NOT NULL REFERENCES parcels(id),
        doc_type TEXT NOT NULL,
        mime TEXT NOT NULL,
        file_path TEXT NOT NULL,
        original_name TEXT NOT NULL,
        size_bytes BIGINT NOT NULL,
        sha256 TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS parcel_history (
        id UUID PRIMARY KEY,
        parcel_id UUID NOT NULL REFERENCES parcels(id),
        changes JSONB NOT NULL,
        changed_by TEXT NOT NULL,
        changed_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS parcel_notes (
        id UUID PRIMARY KEY,
        parcel_id UUID NOT NULL REFERENCES parcels(id),
        note TEXT NOT NULL,
        author TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS requests (
        id UUID PRIMARY KEY,
        citizen_name TEXT NOT NULL,
        parcel_reference TEXT NOT NULL,
        document_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'En attente',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

// Run after column reconciliation so every indexed column exists.
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_parcels_status ON parcels(status)",
    "CREATE INDEX IF NOT EXISTS idx_parcels_province ON parcels(province)",
    "CREATE INDEX IF NOT EXISTS idx_parcels_created_at ON parcels(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_documents_parcel ON documents(parcel_id)",
    "CREATE INDEX IF NOT EXISTS idx_history_parcel ON parcel_history(parcel_id)",
    "CREATE INDEX IF NOT EXISTS idx_notes_parcel ON parcel_notes(parcel_id)",
    "CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status)",
    "CREATE INDEX IF NOT EXISTS idx_requests_reference ON requests(parcel_reference)",
];

/// Canonical columns not present in `existing`, in declaration order.
pub fn missing_parcel_columns(existing: &HashSet<String>) -> Vec<(&'static str, &'static str)> {
    PARCEL_COLUMNS
        .iter()
        .filter(|(name, _)| !existing.contains(*name))
        .copied()
        .collect()
}

/// Every parcel column in bind order: `id` first, then the row body.
static PARCEL_FIELDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut fields = vec!["id", "reference", "status"];
    fields.extend(PARCEL_COLUMNS.iter().map(|(name, _)| *name));
    fields.extend(["created_at", "updated_at"]);
    fields
});

static PARCEL_SELECT: Lazy<String> =
    Lazy::new(|| format!("SELECT {} FROM parcels", PARCEL_FIELDS.join(", ")));

static PARCEL_INSERT: Lazy<String> = Lazy::new(|| {
    let placeholders: Vec<String> = (1..=PARCEL_FIELDS.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO parcels ({}) VALUES ({})",
        PARCEL_FIELDS.join(", "),
        placeholders.join(", ")
    )
});

/// Columns rewritten by an update, in bind order. `created_at` never changes.
static PARCEL_UPDATE_FIELDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    PARCEL_FIELDS
        .iter()
        .copied()
        .filter(|name| *name != "created_at")
        .collect()
});

static PARCEL_UPDATE: Lazy<String> = Lazy::new(|| {
    let assignments: Vec<String> = PARCEL_UPDATE_FIELDS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, name)| format!("{} = ${}", name, i + 1))
        .collect();
    format!("UPDATE parcels SET {} WHERE id = $1", assignments.join(", "))
});

struct ParcelLabels {
    status: &'static str,
    land_use: &'static str,
    acquisition_type: &'static str,
}

impl ParcelLabels {
    fn of(parcel: &Parcel) -> Self {
        Self {
            status: parcel.status.as_str(),
            land_use: parcel.land_use.as_str(),
            acquisition_type: parcel.acquisition_type.as_str(),
        }
    }
}

/// Bind values in [`PARCEL_FIELDS`] order.
fn parcel_params<'a>(p: &'a Parcel, labels: &'a ParcelLabels) -> Vec<&'a (dyn ToSql + Sync)> {
    vec![
        &p.id,
        &p.reference,
        &labels.status,
        &p.parcel_number,
        &p.province,
        &p.territory_or_city,
        &p.commune_or_sector,
        &p.quartier_or_cheflieu,
        &p.avenue,
        &p.gps_lat,
        &p.gps_long,
        &p.area,
        &p.location,
        &labels.land_use,
        &p.certificate_number,
        &p.issuing_authority,
        &labels.acquisition_type,
        &p.acquisition_act_ref,
        &p.title_date,
        &p.owner_name,
        &p.owner_id_number,
        &p.company_name,
        &p.rccm,
        &p.nif,
        &p.surveying_pv_ref,
        &p.surveyor_name,
        &p.surveyor_license,
        &p.cadastral_plan_ref,
        &p.servitudes,
        &p.charges,
        &p.litigation,
        &p.created_at,
        &p.updated_at,
    ]
}

/// Bind values in [`PARCEL_UPDATE_FIELDS`] order.
fn parcel_update_params<'a>(
    p: &'a Parcel,
    labels: &'a ParcelLabels,
) -> Vec<&'a (dyn ToSql + Sync)> {
    PARCEL_FIELDS
        .iter()
        .zip(parcel_params(p, labels))
        .filter(|(name, _)| **name != "created_at")
        .map(|(_, param)| param)
        .collect()
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn backend(reason: impl Into<String>) -> FoncierError {
    StorageError::Backend {
        reason: reason.into(),
    }
    .into()
}

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> FoncierResult<T> {
    row.try_get(name)
        .map_err(|e| backend(format!("column {}: {}", name, e)))
}

fn label<T: FromStr<Err = LabelParseError>>(row: &Row, name: &str) -> FoncierResult<T> {
    let raw: &str = col(row, name)?;
    raw.parse().map_err(|e: LabelParseError| backend(e.to_string()))
}

fn row_to_parcel(row: &Row) -> FoncierResult<Parcel> {
    Ok(Parcel {
        id: col(row, "id")?,
        reference: col(row, "reference")?,
        parcel_number: col(row, "parcel_number")?,
        province: col(row, "province")?,
        territory_or_city: col(row, "territory_or_city")?,
        commune_or_sector: col(row, "commune_or_sector")?,
        quartier_or_cheflieu: col(row, "quartier_or_cheflieu")?,
        avenue: col(row, "avenue")?,
        gps_lat: col(row, "gps_lat")?,
        gps_long: col(row, "gps_long")?,
        area: col(row, "area")?,
        location: col(row, "location")?,
        status: label(row, "status")?,
        land_use: label(row, "land_use")?,
        certificate_number: col(row, "certificate_number")?,
        issuing_authority: col(row, "issuing_authority")?,
        acquisition_type: label(row, "acquisition_type")?,
        acquisition_act_ref: col(row, "acquisition_act_ref")?,
        title_date: col(row, "title_date")?,
        owner_name: col(row, "owner_name")?,
        owner_id_number: col(row, "owner_id_number")?,
        company_name: col(row, "company_name")?,
        rccm: col(row, "rccm")?,
        nif: col(row, "nif")?,
        surveying_pv_ref: col(row, "surveying_pv_ref")?,
        surveyor_name: col(row, "surveyor_name")?,
        surveyor_license: col(row, "surveyor_license")?,
        cadastral_plan_ref: col(row, "cadastral_plan_ref")?,
        servitudes: col(row, "servitudes")?,
        charges: col(row, "charges")?,
        litigation: col(row, "litigation")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn row_to_history(row: &Row) -> FoncierResult<ParcelHistory> {
    let changes: serde_json::Value = col(row, "changes")?;
    let changes: ChangeSet =
        serde_json::from_value(changes).map_err(|e| backend(format!("changes: {}", e)))?;
    Ok(ParcelHistory {
        id: col(row, "id")?,
        parcel_id: col(row, "parcel_id")?,
        changes,
        user: col(row, "changed_by")?,
        changed_at: col(row, "changed_at")?,
    })
}

fn row_to_note(row: &Row) -> FoncierResult<ParcelNote> {
    Ok(ParcelNote {
        id: col(row, "id")?,
        parcel_id: col(row, "parcel_id")?,
        note: col(row, "note")?,
        author: col(row, "author")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn row_to_document(row: &Row) -> FoncierResult<Document> {
    Ok(Document {
        id: col(row, "id")?,
        parcel_id: col(row, "parcel_id")?,
        doc_type: col(row, "doc_type")?,
        mime: col(row, "mime")?,
        file_path: col(row, "file_path")?,
        original_name: col(row, "original_name")?,
        size_bytes: col(row, "size_bytes")?,
        sha256: col(row, "sha256")?,
        created_at: col(row, "created_at")?,
    })
}

fn row_to_request(row: &Row) -> FoncierResult<DocumentRequest> {
    Ok(DocumentRequest {
        id: col(row, "id")?,
        citizen_name: col(row, "citizen_name")?,
        parcel_reference: col(row, "parcel_reference")?,
        document_type: col(row, "document_type")?,
        status: label(row, "status")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn collect<T>(rows: &[Row], decode: fn(&Row) -> FoncierResult<T>) -> FoncierResult<Vec<T>> {
    rows.iter().map(decode).collect()
}

/// Translate a driver error for an operation on `entity_type`.
fn pg_error(entity_type: EntityType) -> impl Fn(tokio_postgres::Error) -> FoncierError {
    move |err| match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
            let reason = match entity_type {
                EntityType::Parcel => "Reference already exists",
                _ => "Already exists",
            };
            StorageError::conflict(entity_type, reason).into()
        }
        Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
            StorageError::not_found(EntityType::Parcel, "referenced parcel").into()
        }
        _ => {
            tracing::error!("Database error: {:?}", err);
            backend(err.to_string())
        }
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Registry store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    async fn store_conn(&self) -> FoncierResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("Connection pool error: {:?}", e);
            backend(format!("connection pool: {}", e))
        })
    }

    /// Create missing tables, add missing parcel columns, then indexes.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;

        for statement in CREATE_TABLES {
            conn.batch_execute(statement).await?;
        }

        let rows = conn
            .query(
                "SELECT column_name FROM information_schema.columns
                 WHERE table_schema = current_schema() AND table_name = 'parcels'",
                &[],
            )
            .await?;
        let existing: HashSet<String> = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<_, _>>()?;

        for (name, ddl) in missing_parcel_columns(&existing) {
            tracing::info!(column = name, "adding missing parcels column");
            conn.batch_execute(&format!("ALTER TABLE parcels ADD COLUMN {} {}", name, ddl))
                .await?;
        }

        for statement in CREATE_INDEXES {
            conn.batch_execute(statement).await?;
        }

        tracing::info!("database schema is up to date");
        Ok(())
    }

    async fn count(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FoncierResult<i64> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_one(sql, params)
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        col(&row, "c")
    }
}

/// Owned bind values for dynamically built queries.
type BoxedParams = Vec<Box<dyn ToSql + Sync + Send>>;

fn param_refs(params: &BoxedParams) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// `%needle%` with LIKE wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn parcel_list_query(filter: &ParcelFilter) -> (String, BoxedParams) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: BoxedParams = Vec::new();

    if let Some(status) = filter.status {
        params.push(Box::new(status.as_str()));
        clauses.push(format!("status = ${}", params.len()));
    }
    if let Some(province) = filter.province.as_deref().map(str::trim) {
        params.push(Box::new(province.to_string()));
        clauses.push(format!("lower(province) = lower(${})", params.len()));
    }
    if let Some(query) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
        params.push(Box::new(like_pattern(query)));
        let n = params.len();
        clauses.push(format!(
            "(reference ILIKE ${n} OR parcel_number ILIKE ${n} OR owner_name ILIKE ${n})"
        ));
    }

    let mut sql = PARCEL_SELECT.clone();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = filter.limit {
        params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        sql.push_str(&format!(" LIMIT ${}", params.len()));
    }
    if let Some(offset) = filter.offset {
        params.push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));
        sql.push_str(&format!(" OFFSET ${}", params.len()));
    }
    (sql, params)
}

fn history_list_query(parcel_id: EntityId, filter: &HistoryFilter) -> (String, BoxedParams) {
    let mut params: BoxedParams = vec![Box::new(parcel_id)];
    let mut sql = "SELECT id, parcel_id, changes, changed_by, changed_at FROM parcel_history \
                   WHERE parcel_id = $1"
        .to_string();

    if let Some(query) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
        params.push(Box::new(like_pattern(query)));
        let n = params.len();
        sql.push_str(&format!(
            " AND (changed_by ILIKE ${n} OR changes::text ILIKE ${n})"
        ));
    }
    if let Some(from) = filter.from {
        params.push(Box::new(from));
        sql.push_str(&format!(
            " AND (changed_at AT TIME ZONE 'UTC')::date >= ${}",
            params.len()
        ));
    }
    if let Some(to) = filter.to {
        params.push(Box::new(to));
        sql.push_str(&format!(
            " AND (changed_at AT TIME ZONE 'UTC')::date <= ${}",
            params.len()
        ));
    }
    sql.push_str(" ORDER BY changed_at DESC, id DESC");
    (sql, params)
}

#[async_trait]
impl RegistryStore for DbClient {
    // ========================================================================
    // PARCEL OPERATIONS
    // ========================================================================

    async fn parcel_insert(&self, parcel: &Parcel) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        let labels = ParcelLabels::of(parcel);
        conn.execute(PARCEL_INSERT.as_str(), &parcel_params(parcel, &labels))
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        Ok(())
    }

    async fn parcel_get(&self, id: EntityId) -> FoncierResult<Option<Parcel>> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_opt(&format!("{} WHERE id = $1", *PARCEL_SELECT), &[&id])
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        row.as_ref().map(row_to_parcel).transpose()
    }

    async fn parcel_get_by_reference(&self, reference: &str) -> FoncierResult<Option<Parcel>> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_opt(
                &format!("{} WHERE reference = $1", *PARCEL_SELECT),
                &[&reference],
            )
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        row.as_ref().map(row_to_parcel).transpose()
    }

    async fn parcel_list(&self, filter: &ParcelFilter) -> FoncierResult<Vec<Parcel>> {
        let (sql, params) = parcel_list_query(filter);
        let conn = self.store_conn().await?;
        let rows = conn
            .query(sql.as_str(), &param_refs(&params))
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        collect(&rows, row_to_parcel)
    }

    async fn parcel_update(
        &self,
        parcel: &Parcel,
        history: Option<&ParcelHistory>,
    ) -> FoncierResult<()> {
        let mut conn = self.store_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(pg_error(EntityType::Parcel))?;

        let labels = ParcelLabels::of(parcel);
        let updated = tx
            .execute(PARCEL_UPDATE.as_str(), &parcel_update_params(parcel, &labels))
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        if updated == 0 {
            return Err(StorageError::not_found(EntityType::Parcel, parcel.id).into());
        }

        if let Some(entry) = history {
            let changes = serde_json::to_value(&entry.changes)
                .map_err(|e| backend(format!("changes: {}", e)))?;
            tx.execute(
                "INSERT INTO parcel_history (id, parcel_id, changes, changed_by, changed_at)
                 VALUES ($1, $2, $3, $4, $5)",
                &[&entry.id, &entry.parcel_id, &changes, &entry.user, &entry.changed_at],
            )
            .await
            .map_err(pg_error(EntityType::History))?;
        }

        tx.commit().await.map_err(|e| {
            FoncierError::from(StorageError::TransactionFailed {
                reason: e.to_string(),
            })
        })
    }

    // ========================================================================
    // HISTORY OPERATIONS
    // ========================================================================

    async fn history_insert(&self, entry: &ParcelHistory) -> FoncierResult<()> {
        let changes =
            serde_json::to_value(&entry.changes).map_err(|e| backend(format!("changes: {}", e)))?;
        let conn = self.store_conn().await?;
        conn.execute(
            "INSERT INTO parcel_history (id, parcel_id, changes, changed_by, changed_at)
             VALUES ($1, $2, $3, $4, $5)",
            &[&entry.id, &entry.parcel_id, &changes, &entry.user, &entry.changed_at],
        )
        .await
        .map_err(pg_error(EntityType::History))?;
        Ok(())
    }

    async fn history_list(
        &self,
        parcel_id: EntityId,
        filter: &HistoryFilter,
    ) -> FoncierResult<Vec<ParcelHistory>> {
        let (sql, params) = history_list_query(parcel_id, filter);
        let conn = self.store_conn().await?;
        let rows = conn
            .query(sql.as_str(), &param_refs(&params))
            .await
            .map_err(pg_error(EntityType::History))?;
        collect(&rows, row_to_history)
    }

    // ========================================================================
    // NOTE OPERATIONS
    // ========================================================================

    async fn note_insert(&self, note: &ParcelNote) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        conn.execute(
            "INSERT INTO parcel_notes (id, parcel_id, note, author, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &note.id,
                &note.parcel_id,
                &note.note,
                &note.author,
                &note.created_at,
                &note.updated_at,
            ],
        )
        .await
        .map_err(pg_error(EntityType::Note))?;
        Ok(())
    }

    async fn note_get(
        &self,
        parcel_id: EntityId,
        note_id: EntityId,
    ) -> FoncierResult<Option<ParcelNote>> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, parcel_id, note, author, created_at, updated_at FROM parcel_notes
                 WHERE id = $1 AND parcel_id = $2",
                &[&note_id, &parcel_id],
            )
            .await
            .map_err(pg_error(EntityType::Note))?;
        row.as_ref().map(row_to_note).transpose()
    }

    async fn note_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<ParcelNote>> {
        let conn = self.store_conn().await?;
        let rows = conn
            .query(
                "SELECT id, parcel_id, note, author, created_at, updated_at FROM parcel_notes
                 WHERE parcel_id = $1 ORDER BY created_at DESC, id DESC",
                &[&parcel_id],
            )
            .await
            .map_err(pg_error(EntityType::Note))?;
        collect(&rows, row_to_note)
    }

    async fn note_update(&self, note: &ParcelNote) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        let updated = conn
            .execute(
                "UPDATE parcel_notes SET note = $3, author = $4, updated_at = $5
                 WHERE id = $1 AND parcel_id = $2",
                &[
                    &note.id,
                    &note.parcel_id,
                    &note.note,
                    &note.author,
                    &note.updated_at,
                ],
            )
            .await
            .map_err(pg_error(EntityType::Note))?;
        if updated == 0 {
            return Err(StorageError::not_found(EntityType::Note, note.id).into());
        }
        Ok(())
    }

    async fn note_delete(&self, parcel_id: EntityId, note_id: EntityId) -> FoncierResult<bool> {
        let conn = self.store_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM parcel_notes WHERE id = $1 AND parcel_id = $2",
                &[&note_id, &parcel_id],
            )
            .await
            .map_err(pg_error(EntityType::Note))?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // DOCUMENT OPERATIONS
    // ========================================================================

    async fn document_insert(&self, document: &Document) -> FoncierResult<()> {
        self.documents_insert(std::slice::from_ref(document)).await
    }

    async fn documents_insert(&self, documents: &[Document]) -> FoncierResult<()> {
        let mut conn = self.store_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(pg_error(EntityType::Document))?;

        for document in documents {
            tx.execute(
                "INSERT INTO documents
                    (id, parcel_id, doc_type, mime, file_path, original_name, size_bytes, sha256, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                &[
                    &document.id,
                    &document.parcel_id,
                    &document.doc_type,
                    &document.mime,
                    &document.file_path,
                    &document.original_name,
                    &document.size_bytes,
                    &document.sha256,
                    &document.created_at,
                ],
            )
            .await
            .map_err(pg_error(EntityType::Document))?;
        }

        tx.commit().await.map_err(|e| {
            FoncierError::from(StorageError::TransactionFailed {
                reason: e.to_string(),
            })
        })
    }

    async fn document_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<Document>> {
        let conn = self.store_conn().await?;
        let rows = conn
            .query(
                "SELECT id, parcel_id, doc_type, mime, file_path, original_name, size_bytes,
                        sha256, created_at
                 FROM documents WHERE parcel_id = $1 ORDER BY created_at DESC, id DESC",
                &[&parcel_id],
            )
            .await
            .map_err(pg_error(EntityType::Document))?;
        collect(&rows, row_to_document)
    }

    async fn document_get(
        &self,
        parcel_id: EntityId,
        document_id: EntityId,
    ) -> FoncierResult<Option<Document>> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, parcel_id, doc_type, mime, file_path, original_name, size_bytes,
                        sha256, created_at
                 FROM documents WHERE id = $1 AND parcel_id = $2",
                &[&document_id, &parcel_id],
            )
            .await
            .map_err(pg_error(EntityType::Document))?;
        row.as_ref().map(row_to_document).transpose()
    }

    // ========================================================================
    // REQUEST OPERATIONS
    // ========================================================================

    async fn request_insert(&self, request: &DocumentRequest) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        conn.execute(
            "INSERT INTO requests
                (id, citizen_name, parcel_reference, document_type, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                &request.id,
                &request.citizen_name,
                &request.parcel_reference,
                &request.document_type,
                &request.status.as_str(),
                &request.created_at,
                &request.updated_at,
            ],
        )
        .await
        .map_err(pg_error(EntityType::Request))?;
        Ok(())
    }

    async fn request_get(&self, id: EntityId) -> FoncierResult<Option<DocumentRequest>> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, citizen_name, parcel_reference, document_type, status, created_at,
                        updated_at
                 FROM requests WHERE id = $1",
                &[&id],
            )
            .await
            .map_err(pg_error(EntityType::Request))?;
        row.as_ref().map(row_to_request).transpose()
    }

    async fn request_list(
        &self,
        status: Option<RequestStatus>,
    ) -> FoncierResult<Vec<DocumentRequest>> {
        let conn = self.store_conn().await?;
        let status = status.map(|s| s.as_str());
        let rows = conn
            .query(
                "SELECT id, citizen_name, parcel_reference, document_type, status, created_at,
                        updated_at
                 FROM requests WHERE ($1::text IS NULL OR status = $1)
                 ORDER BY created_at DESC, id DESC",
                &[&status],
            )
            .await
            .map_err(pg_error(EntityType::Request))?;
        collect(&rows, row_to_request)
    }

    async fn request_update(&self, request: &DocumentRequest) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        let updated = conn
            .execute(
                "UPDATE requests
                 SET citizen_name = $2, parcel_reference = $3, document_type = $4, status = $5,
                     updated_at = $6
                 WHERE id = $1",
                &[
                    &request.id,
                    &request.citizen_name,
                    &request.parcel_reference,
                    &request.document_type,
                    &request.status.as_str(),
                    &request.updated_at,
                ],
            )
            .await
            .map_err(pg_error(EntityType::Request))?;
        if updated == 0 {
            return Err(StorageError::not_found(EntityType::Request, request.id).into());
        }
        Ok(())
    }

    // ========================================================================
    // REPORTING
    // ========================================================================

    async fn stats(&self) -> FoncierResult<RegistryStats> {
        let conn = self.store_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) AS total,
                        COUNT(*) FILTER (WHERE status = $1) AS free,
                        COUNT(*) FILTER (WHERE status = $2) AS disputed,
                        COUNT(*) FILTER (WHERE status = $3) AS mortgaged,
                        (SELECT COUNT(*) FROM requests WHERE status = $4) AS pending
                 FROM parcels",
                &[
                    &ParcelStatus::Free.as_str(),
                    &ParcelStatus::Disputed.as_str(),
                    &ParcelStatus::Mortgaged.as_str(),
                    &RequestStatus::Pending.as_str(),
                ],
            )
            .await
            .map_err(pg_error(EntityType::Parcel))?;

        Ok(RegistryStats {
            total_parcels: col(&row, "total")?,
            free_parcels: col(&row, "free")?,
            disputed_parcels: col(&row, "disputed")?,
            mortgaged_parcels: col(&row, "mortgaged")?,
            pending_requests: col(&row, "pending")?,
        })
    }

    async fn extended_stats(&self, now: Timestamp) -> FoncierResult<ExtendedStats> {
        let parcels_this_month = self
            .count(
                "SELECT COUNT(*) AS c FROM parcels
                 WHERE date_trunc('month', created_at AT TIME ZONE 'UTC')
                     = date_trunc('month', $1::timestamptz AT TIME ZONE 'UTC')",
                &[&now],
            )
            .await?;
        let parcels_missing_docs = self
            .count(
                "SELECT COUNT(*) AS c FROM parcels p
                 WHERE NOT EXISTS (SELECT 1 FROM documents d WHERE d.parcel_id = p.id)",
                &[],
            )
            .await?;
        let parcels_in_validation = self
            .count(
                "SELECT COUNT(*) AS c FROM parcels
                 WHERE certificate_number = '' OR issuing_authority = ''
                    OR cadastral_plan_ref = ''",
                &[],
            )
            .await?;
        let parcels_boundary_conflicts = self
            .count(
                "SELECT COUNT(*) AS c FROM parcels
                 WHERE status = $1 OR COALESCE(btrim(litigation), '') <> ''",
                &[&ParcelStatus::Disputed.as_str()],
            )
            .await?;

        let conn = self.store_conn().await?;

        let rows = conn
            .query(
                "SELECT province, COUNT(*) AS c FROM parcels
                 GROUP BY province ORDER BY c DESC, province ASC",
                &[],
            )
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        let parcels_by_province = rows
            .iter()
            .map(|row| {
                Ok(ProvinceCount {
                    province: col(row, "province")?,
                    c: col(row, "c")?,
                })
            })
            .collect::<FoncierResult<Vec<_>>>()?;

        let rows = conn
            .query(
                "SELECT territory_or_city AS city, COUNT(*) AS c FROM parcels
                 GROUP BY territory_or_city ORDER BY c DESC, territory_or_city ASC",
                &[],
            )
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        let parcels_by_city = rows
            .iter()
            .map(|row| {
                Ok(CityCount {
                    city: col(row, "city")?,
                    c: col(row, "c")?,
                })
            })
            .collect::<FoncierResult<Vec<_>>>()?;

        let rows = conn
            .query(
                "SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month, COUNT(*) AS c
                 FROM parcels
                 WHERE created_at >= $1::timestamptz - INTERVAL '12 months'
                 GROUP BY month",
                &[&now],
            )
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        let monthly = rows
            .iter()
            .map(|row| Ok((col::<String>(row, "month")?, col::<i64>(row, "c")?)))
            .collect::<FoncierResult<Vec<_>>>()?;

        let row = conn
            .query_one(
                "SELECT COALESCE(AVG(EXTRACT(EPOCH FROM ($1::timestamptz - created_at)) / 86400.0), 0)::float8 AS days
                 FROM requests WHERE status = $2",
                &[&now, &RequestStatus::Pending.as_str()],
            )
            .await
            .map_err(pg_error(EntityType::Request))?;

        Ok(ExtendedStats {
            parcels_this_month,
            parcels_missing_docs,
            parcels_in_validation,
            parcels_boundary_conflicts,
            parcels_by_province,
            parcels_by_city,
            monthly_evolution: fill_monthly_evolution(&now, &monthly),
            pending_requests_avg_days: col(&row, "days")?,
        })
    }

    async fn health_check(&self) -> FoncierResult<()> {
        let conn = self.store_conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(pg_error(EntityType::Parcel))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_reports_absent_in_order() {
        let mut existing: HashSet<String> = ["id", "reference", "status", "owner_name", "area"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing = missing_parcel_columns(&existing);
        assert_eq!(missing.len(), PARCEL_COLUMNS.len() - 2);
        assert_eq!(missing[0].0, "parcel_number");
        assert!(missing.iter().all(|(name, _)| *name != "owner_name"));

        existing.extend(PARCEL_COLUMNS.iter().map(|(name, _)| name.to_string()));
        assert!(missing_parcel_columns(&existing).is_empty());
    }

    /// Distinct `$n` placeholders in a statement, sorted.
    fn placeholders(sql: &str) -> Vec<usize> {
        let re = regex::Regex::new(r"\$(\d+)").unwrap();
        let mut found: Vec<usize> = re
            .captures_iter(sql)
            .map(|c| c[1].parse().unwrap())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    #[test]
    fn test_parcel_statements_bind_every_field() {
        assert_eq!(PARCEL_FIELDS.len(), 33);
        assert_eq!(PARCEL_UPDATE_FIELDS.len(), 32);
        assert!(PARCEL_INSERT.ends_with("$33)"));
        assert!(PARCEL_UPDATE.contains("reference = $2"));
        assert!(PARCEL_UPDATE.contains("updated_at = $32"));
        assert!(!PARCEL_UPDATE.contains("created_at"));
        assert!(PARCEL_UPDATE.ends_with("WHERE id = $1"));
    }

    #[test]
    fn test_parcel_statements_use_every_bound_parameter() {
        let parcel = foncier_test_utils::fixtures::sample_parcel();
        let labels = ParcelLabels::of(&parcel);

        let insert = parcel_params(&parcel, &labels);
        let expected: Vec<usize> = (1..=insert.len()).collect();
        assert_eq!(placeholders(&PARCEL_INSERT), expected);

        let update = parcel_update_params(&parcel, &labels);
        let expected: Vec<usize> = (1..=update.len()).collect();
        assert_eq!(placeholders(&PARCEL_UPDATE), expected);
    }

    #[test]
    fn test_update_params_follow_update_columns() {
        let parcel = foncier_test_utils::fixtures::sample_parcel();
        let labels = ParcelLabels::of(&parcel);
        let params = parcel_update_params(&parcel, &labels);
        assert_eq!(params.len(), PARCEL_UPDATE_FIELDS.len());
        assert_eq!(PARCEL_UPDATE_FIELDS.last(), Some(&"updated_at"));
        assert_eq!(
            format!("{:?}", params[params.len() - 1]),
            format!("{:?}", parcel.updated_at)
        );
    }

    #[test]
    fn test_oversized_paging_saturates() {
        let filter = ParcelFilter {
            offset: Some(usize::MAX),
            ..ParcelFilter::default()
        };
        let (sql, params) = parcel_list_query(&filter);
        assert!(sql.ends_with("OFFSET $1"));
        assert_eq!(format!("{:?}", params[0]), format!("{:?}", i64::MAX));
    }

    #[test]
    fn test_parcel_list_query_numbers_placeholders() {
        let filter = ParcelFilter {
            status: Some(ParcelStatus::Disputed),
            province: Some("Kinshasa".to_string()),
            query: Some("KIN".to_string()),
            limit: Some(10),
            offset: Some(20),
        };
        let (sql, params) = parcel_list_query(&filter);
        assert_eq!(params.len(), 5);
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("lower(province) = lower($2)"));
        assert!(sql.contains("owner_name ILIKE $3"));
        assert!(sql.ends_with("LIMIT $4 OFFSET $5"));
    }

    #[test]
    fn test_blank_query_adds_no_clause() {
        let filter = ParcelFilter {
            query: Some("   ".to_string()),
            ..ParcelFilter::default()
        };
        let (sql, params) = parcel_list_query(&filter);
        assert!(params.is_empty());
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }

    #[test]
    fn test_history_query_bounds() {
        let filter = HistoryFilter {
            query: Some("owner".to_string()),
            from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            to: chrono::NaiveDate::from_ymd_opt(2024, 12, 31),
        };
        let (sql, params) = history_list_query(uuid::Uuid::nil(), &filter);
        assert_eq!(params.len(), 4);
        assert!(sql.contains(">= $3"));
        assert!(sql.contains("<= $4"));
    }
}
