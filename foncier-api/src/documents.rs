//! Document file storage
//!
//! Uploaded files live under `<upload_dir>/<parcel_id>/` and are named
//! `<document_id>-<sanitized original name>`. Rows store the path relative
//! to the upload root so `/uploads/<file_path>` serves them.

use foncier_core::{content_hash_hex, EntityId};
use std::path::{Path, PathBuf};

use crate::error::ApiResult;

/// Longest stored file name component, in characters.
const MAX_NAME_LEN: usize = 120;

/// MIME type recorded when the client sends none.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Relative to the upload root, always `/`-separated
    pub file_path: String,
    pub size_bytes: i64,
    pub sha256: String,
}

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_file_name(raw: &str) -> String {
    // Browsers on some platforms send the full client path.
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

/// File store rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    root: PathBuf,
}

impl DocumentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload root if needed.
    pub async fn ensure_root(&self) -> ApiResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write one document's bytes and return its location and digest.
    pub async fn store(
        &self,
        parcel_id: EntityId,
        document_id: EntityId,
        original_name: &str,
        bytes: &[u8],
    ) -> ApiResult<StoredFile> {
        let dir = self.root.join(parcel_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}-{}", document_id, sanitize_file_name(original_name));
        tokio::fs::write(dir.join(&name), bytes).await?;

        tracing::debug!(%parcel_id, %document_id, size = bytes.len(), "stored document file");

        Ok(StoredFile {
            file_path: format!("{}/{}", parcel_id, name),
            size_bytes: bytes.len() as i64,
            sha256: content_hash_hex(bytes),
        })
    }

    /// Best-effort removal of a file written for a failed upload.
    pub async fn discard(&self, file_path: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(file_path)).await {
            tracing::warn!(file_path, error = %e, "failed to remove orphaned upload");
        }
    }
}
