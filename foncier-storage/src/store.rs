//! Async storage trait for registry entities.

use async_trait::async_trait;
use foncier_core::{
    Document, DocumentRequest, EntityId, ExtendedStats, FoncierResult, HistoryFilter, Parcel,
    ParcelFilter, ParcelHistory, ParcelNote, RegistryStats, RequestStatus, Timestamp,
};

/// Async storage trait for the land registry.
///
/// Listings are returned newest first. Child rows (history, notes,
/// documents) referencing an unknown parcel fail with
/// `StorageError::NotFound` for the parcel.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    // ========================================================================
    // PARCEL OPERATIONS
    // ========================================================================

    /// Insert a new parcel. A taken reference is a `Conflict`.
    async fn parcel_insert(&self, parcel: &Parcel) -> FoncierResult<()>;

    async fn parcel_get(&self, id: EntityId) -> FoncierResult<Option<Parcel>>;

    async fn parcel_get_by_reference(&self, reference: &str) -> FoncierResult<Option<Parcel>>;

    async fn parcel_list(&self, filter: &ParcelFilter) -> FoncierResult<Vec<Parcel>>;

    /// Replace a parcel row, appending `history` in the same unit of work.
    async fn parcel_update(
        &self,
        parcel: &Parcel,
        history: Option<&ParcelHistory>,
    ) -> FoncierResult<()>;

    // ========================================================================
    // HISTORY OPERATIONS
    // ========================================================================

    async fn history_insert(&self, entry: &ParcelHistory) -> FoncierResult<()>;

    async fn history_list(
        &self,
        parcel_id: EntityId,
        filter: &HistoryFilter,
    ) -> FoncierResult<Vec<ParcelHistory>>;

    // ========================================================================
    // NOTE OPERATIONS
    // ========================================================================

    async fn note_insert(&self, note: &ParcelNote) -> FoncierResult<()>;

    async fn note_get(
        &self,
        parcel_id: EntityId,
        note_id: EntityId,
    ) -> FoncierResult<Option<ParcelNote>>;

    async fn note_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<ParcelNote>>;

    /// Overwrite the text of an existing note.
    async fn note_update(&self, note: &ParcelNote) -> FoncierResult<()>;

    /// Returns whether a row was removed.
    async fn note_delete(&self, parcel_id: EntityId, note_id: EntityId) -> FoncierResult<bool>;

    // ========================================================================
    // DOCUMENT OPERATIONS
    // ========================================================================

    async fn document_insert(&self, document: &Document) -> FoncierResult<()>;

    /// Insert a batch of documents; either all rows are stored or none.
    async fn documents_insert(&self, documents: &[Document]) -> FoncierResult<()>;

    async fn document_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<Document>>;

    async fn document_get(
        &self,
        parcel_id: EntityId,
        document_id: EntityId,
    ) -> FoncierResult<Option<Document>>;

    // ========================================================================
    // REQUEST OPERATIONS
    // ========================================================================

    async fn request_insert(&self, request: &DocumentRequest) -> FoncierResult<()>;

    async fn request_get(&self, id: EntityId) -> FoncierResult<Option<DocumentRequest>>;

    async fn request_list(
        &self,
        status: Option<RequestStatus>,
    ) -> FoncierResult<Vec<DocumentRequest>>;

    async fn request_update(&self, request: &DocumentRequest) -> FoncierResult<()>;

    // ========================================================================
    // REPORTING
    // ========================================================================

    async fn stats(&self) -> FoncierResult<RegistryStats>;

    /// Dashboard figures relative to `now`.
    async fn extended_stats(&self, now: Timestamp) -> FoncierResult<ExtendedStats>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> FoncierResult<()>;
}
