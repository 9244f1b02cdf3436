//! Parcel document REST API Routes
//!
//! Uploads arrive as `multipart/form-data` with repeated `files` parts and
//! `types` parts, paired by position.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use foncier_core::{new_entity_id, Document, EntityId};
use foncier_storage::RegistryStore;
use std::sync::Arc;

use super::parcel::require_parcel;
use crate::{
    documents::{DocumentStorage, DEFAULT_MIME},
    error::{ApiError, ApiResult},
    extractors::{PathId, PathIds},
    telemetry::with_metrics,
    validation::ValidateNonEmpty,
};

// ============================================================================
// SHARED STATE
// ============================================================================

#[derive(Clone)]
pub struct DocumentState {
    pub store: Arc<dyn RegistryStore>,
    pub files: DocumentStorage,
    pub max_upload_bytes: usize,
}

impl DocumentState {
    pub fn new(store: Arc<dyn RegistryStore>, files: DocumentStorage, max_upload_bytes: usize) -> Self {
        Self {
            store,
            files,
            max_upload_bytes,
        }
    }
}

/// One `files` part read into memory.
struct UploadedFile {
    original_name: String,
    mime: String,
    bytes: Vec<u8>,
}

/// Multipart documentation schema.
#[cfg(feature = "openapi")]
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentsForm {
    /// One part per file
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
    /// Document kind of each file, in the same order
    types: Vec<String>,
}

async fn read_upload(
    multipart: &mut Multipart,
    limit: usize,
) -> ApiResult<(Vec<UploadedFile>, Vec<String>)> {
    let mut files = Vec::new();
    let mut types = Vec::new();

    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(limit)
        } else {
            ApiError::invalid_input(format!("Invalid multipart field: {}", e))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match name.as_str() {
            "files" => {
                let original_name = field.file_name().unwrap_or("document").to_string();
                let mime = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                files.push(UploadedFile {
                    original_name,
                    mime,
                    bytes,
                });
            }
            "types" => types.push(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    Ok((files, types))
}

/// Write every file, then record all documents in one batch. On failure the
/// files already written are removed and no document row remains.
async fn persist_documents(
    store: &dyn RegistryStore,
    files: &DocumentStorage,
    parcel_id: EntityId,
    uploads: Vec<(UploadedFile, String)>,
) -> ApiResult<Vec<Document>> {
    let mut documents = Vec::with_capacity(uploads.len());
    for (file, doc_type) in uploads {
        let id = new_entity_id();
        let stored = match files.store(parcel_id, id, &file.original_name, &file.bytes).await {
            Ok(stored) => stored,
            Err(e) => {
                discard_all(files, &documents).await;
                return Err(e);
            }
        };

        documents.push(Document {
            id,
            parcel_id,
            doc_type: doc_type.trim().to_string(),
            mime: file.mime,
            file_path: stored.file_path,
            original_name: file.original_name,
            size_bytes: stored.size_bytes,
            sha256: stored.sha256,
            created_at: Utc::now(),
        });
    }

    if let Err(e) = store.documents_insert(&documents).await {
        discard_all(files, &documents).await;
        return Err(e.into());
    }

    with_metrics(|m| {
        for document in &documents {
            m.record_upload(document.size_bytes.max(0) as u64);
        }
    });
    Ok(documents)
}

async fn discard_all(files: &DocumentStorage, documents: &[Document]) {
    for document in documents {
        files.discard(&document.file_path).await;
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/parcels/{id}/documents - List documents of a parcel
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels/{id}/documents",
    tag = "Documents",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID")
    ),
    responses(
        (status = 200, description = "Documents, newest first", body = Vec<Document>),
        (status = 404, description = "Parcel not found", body = ApiError),
    ),
))]
pub async fn list_documents(
    State(state): State<Arc<DocumentState>>,
    PathId(parcel_id): PathId,
) -> ApiResult<impl IntoResponse> {
    require_parcel(state.store.as_ref(), parcel_id).await?;
    let documents = state.store.document_list(parcel_id).await?;
    Ok(Json(documents))
}

/// GET /api/parcels/{id}/documents/{document_id} - Document metadata
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/parcels/{id}/documents/{document_id}",
    tag = "Documents",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID"),
        ("document_id" = uuid::Uuid, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Document metadata", body = Document),
        (status = 404, description = "Document not found", body = ApiError),
    ),
))]
pub async fn get_document(
    State(state): State<Arc<DocumentState>>,
    PathIds(parcel_id, document_id): PathIds,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .document_get(parcel_id, document_id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::document_not_found)
}

/// POST /api/parcels/{id}/documents - Upload documents
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/parcels/{id}/documents",
    tag = "Documents",
    params(
        ("id" = uuid::Uuid, Path, description = "Parcel ID")
    ),
    request_body(content = UploadDocumentsForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Documents stored", body = Vec<Document>),
        (status = 400, description = "Missing files or types", body = ApiError),
        (status = 404, description = "Parcel not found", body = ApiError),
        (status = 413, description = "Upload too large", body = ApiError),
    ),
))]
pub async fn upload_documents(
    State(state): State<Arc<DocumentState>>,
    PathId(parcel_id): PathId,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    require_parcel(state.store.as_ref(), parcel_id).await?;

    let (files, types) = read_upload(&mut multipart, state.max_upload_bytes).await?;
    if files.is_empty() {
        return Err(ApiError::missing_field("files"));
    }
    if types.len() < files.len() {
        return Err(ApiError::missing_field("types"));
    }
    for doc_type in &types[..files.len()] {
        doc_type.validate_non_empty("types")?;
    }

    let documents = persist_documents(
        state.store.as_ref(),
        &state.files,
        parcel_id,
        files.into_iter().zip(types).collect(),
    )
    .await?;

    tracing::info!(%parcel_id, count = documents.len(), "documents uploaded");
    Ok((StatusCode::CREATED, Json(documents)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(
    store: Arc<dyn RegistryStore>,
    files: DocumentStorage,
    max_upload_bytes: usize,
) -> Router {
    let state = Arc::new(DocumentState::new(store, files, max_upload_bytes));

    Router::new()
        .route(
            "/parcels/:id/documents",
            get(list_documents).post(upload_documents),
        )
        .route("/parcels/:id/documents/:document_id", get(get_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foncier_storage::MemoryStore;

    fn upload(name: &str, bytes: &[u8]) -> (UploadedFile, String) {
        (
            UploadedFile {
                original_name: name.to_string(),
                mime: "application/pdf".to_string(),
                bytes: bytes.to_vec(),
            },
            "Titre foncier".to_string(),
        )
    }

    fn temp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("foncier-documents-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_files() {
        let store = MemoryStore::new();
        let files = DocumentStorage::new(temp_root());
        let parcel_id = new_entity_id();

        let result = persist_documents(
            &store,
            &files,
            parcel_id,
            vec![upload("titre.pdf", b"%PDF-1"), upload("plan.pdf", b"%PDF-2")],
        )
        .await;
        assert!(result.is_err());

        let dir = files.root().join(parcel_id.to_string());
        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        assert!(store.document_list(parcel_id).await.unwrap().is_empty());

        let _ = tokio::fs::remove_dir_all(files.root()).await;
    }

    #[tokio::test]
    async fn test_batch_stores_every_file() {
        let store = MemoryStore::new();
        let parcel = foncier_test_utils::fixtures::sample_parcel();
        store.parcel_insert(&parcel).await.unwrap();
        let files = DocumentStorage::new(temp_root());

        let documents = persist_documents(
            &store,
            &files,
            parcel.id,
            vec![upload("titre.pdf", b"%PDF-1"), upload("plan.pdf", b"%PDF-2")],
        )
        .await
        .unwrap();
        assert_eq!(documents.len(), 2);
        for document in &documents {
            assert!(files.root().join(&document.file_path).exists());
        }
        assert_eq!(store.document_list(parcel.id).await.unwrap().len(), 2);

        let _ = tokio::fs::remove_dir_all(files.root()).await;
    }
}
