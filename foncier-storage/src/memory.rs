//! In-process registry store.
//!
//! All tables sit behind one `RwLock`, so a parcel update and its history
//! row are applied together or not at all.

use crate::RegistryStore;
use async_trait::async_trait;
use foncier_core::{
    compute_extended_stats, compute_stats, Document, DocumentRequest, EntityId, EntityType,
    ExtendedStats, FoncierResult, HistoryFilter, Parcel, ParcelFilter, ParcelHistory, ParcelNote,
    RegistryStats, RequestStatus, StorageError, Timestamp,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    parcels: HashMap<EntityId, Parcel>,
    history: HashMap<EntityId, ParcelHistory>,
    notes: HashMap<EntityId, ParcelNote>,
    documents: HashMap<EntityId, Document>,
    requests: HashMap<EntityId, DocumentRequest>,
}

impl Tables {
    fn require_parcel(&self, id: EntityId) -> Result<(), StorageError> {
        if self.parcels.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::not_found(EntityType::Parcel, id))
        }
    }

    fn reference_taken(&self, reference: &str, except: Option<EntityId>) -> bool {
        self.parcels
            .values()
            .any(|p| p.reference == reference && Some(p.id) != except)
    }
}

/// Newest first, ties broken by id so the order is stable.
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (Timestamp, EntityId)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Registry store kept entirely in memory.
///
/// Used by the development server and by the router tests. Cloning yields
/// a handle onto the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    // ========================================================================
    // PARCEL OPERATIONS
    // ========================================================================

    async fn parcel_insert(&self, parcel: &Parcel) -> FoncierResult<()> {
        let mut tables = self.write()?;
        if tables.reference_taken(&parcel.reference, None) {
            return Err(StorageError::conflict(EntityType::Parcel, "Reference already exists").into());
        }
        if tables.parcels.contains_key(&parcel.id) {
            return Err(StorageError::conflict(EntityType::Parcel, "Id already exists").into());
        }
        tables.parcels.insert(parcel.id, parcel.clone());
        Ok(())
    }

    async fn parcel_get(&self, id: EntityId) -> FoncierResult<Option<Parcel>> {
        Ok(self.read()?.parcels.get(&id).cloned())
    }

    async fn parcel_get_by_reference(&self, reference: &str) -> FoncierResult<Option<Parcel>> {
        Ok(self
            .read()?
            .parcels
            .values()
            .find(|p| p.reference == reference)
            .cloned())
    }

    async fn parcel_list(&self, filter: &ParcelFilter) -> FoncierResult<Vec<Parcel>> {
        let tables = self.read()?;
        let mut rows: Vec<Parcel> = tables
            .parcels
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn parcel_update(
        &self,
        parcel: &Parcel,
        history: Option<&ParcelHistory>,
    ) -> FoncierResult<()> {
        let mut tables = self.write()?;
        tables.require_parcel(parcel.id)?;
        if tables.reference_taken(&parcel.reference, Some(parcel.id)) {
            return Err(StorageError::conflict(EntityType::Parcel, "Reference already exists").into());
        }
        if let Some(entry) = history {
            if entry.parcel_id != parcel.id {
                return Err(StorageError::TransactionFailed {
                    reason: "history entry belongs to another parcel".to_string(),
                }
                .into());
            }
            tables.history.insert(entry.id, entry.clone());
        }
        tables.parcels.insert(parcel.id, parcel.clone());
        Ok(())
    }

    // ========================================================================
    // HISTORY OPERATIONS
    // ========================================================================

    async fn history_insert(&self, entry: &ParcelHistory) -> FoncierResult<()> {
        let mut tables = self.write()?;
        tables.require_parcel(entry.parcel_id)?;
        tables.history.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn history_list(
        &self,
        parcel_id: EntityId,
        filter: &HistoryFilter,
    ) -> FoncierResult<Vec<ParcelHistory>> {
        let tables = self.read()?;
        let mut rows: Vec<ParcelHistory> = tables
            .history
            .values()
            .filter(|h| h.parcel_id == parcel_id && filter.matches(h))
            .cloned()
            .collect();
        newest_first(&mut rows, |h| (h.changed_at, h.id));
        Ok(rows)
    }

    // ========================================================================
    // NOTE OPERATIONS
    // ========================================================================

    async fn note_insert(&self, note: &ParcelNote) -> FoncierResult<()> {
        let mut tables = self.write()?;
        tables.require_parcel(note.parcel_id)?;
        tables.notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn note_get(
        &self,
        parcel_id: EntityId,
        note_id: EntityId,
    ) -> FoncierResult<Option<ParcelNote>> {
        Ok(self
            .read()?
            .notes
            .get(&note_id)
            .filter(|n| n.parcel_id == parcel_id)
            .cloned())
    }

    async fn note_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<ParcelNote>> {
        let tables = self.read()?;
        let mut rows: Vec<ParcelNote> = tables
            .notes
            .values()
            .filter(|n| n.parcel_id == parcel_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        Ok(rows)
    }

    async fn note_update(&self, note: &ParcelNote) -> FoncierResult<()> {
        let mut tables = self.write()?;
        match tables.notes.get_mut(&note.id) {
            Some(existing) if existing.parcel_id == note.parcel_id => {
                *existing = note.clone();
                Ok(())
            }
            _ => Err(StorageError::not_found(EntityType::Note, note.id).into()),
        }
    }

    async fn note_delete(&self, parcel_id: EntityId, note_id: EntityId) -> FoncierResult<bool> {
        let mut tables = self.write()?;
        let owned = tables
            .notes
            .get(&note_id)
            .is_some_and(|n| n.parcel_id == parcel_id);
        if owned {
            tables.notes.remove(&note_id);
        }
        Ok(owned)
    }

    // ========================================================================
    // DOCUMENT OPERATIONS
    // ========================================================================

    async fn document_insert(&self, document: &Document) -> FoncierResult<()> {
        let mut tables = self.write()?;
        tables.require_parcel(document.parcel_id)?;
        tables.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn documents_insert(&self, documents: &[Document]) -> FoncierResult<()> {
        let mut tables = self.write()?;
        for document in documents {
            tables.require_parcel(document.parcel_id)?;
        }
        for document in documents {
            tables.documents.insert(document.id, document.clone());
        }
        Ok(())
    }

    async fn document_list(&self, parcel_id: EntityId) -> FoncierResult<Vec<Document>> {
        let tables = self.read()?;
        let mut rows: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.parcel_id == parcel_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |d| (d.created_at, d.id));
        Ok(rows)
    }

    async fn document_get(
        &self,
        parcel_id: EntityId,
        document_id: EntityId,
    ) -> FoncierResult<Option<Document>> {
        Ok(self
            .read()?
            .documents
            .get(&document_id)
            .filter(|d| d.parcel_id == parcel_id)
            .cloned())
    }

    // ========================================================================
    // REQUEST OPERATIONS
    // ========================================================================

    async fn request_insert(&self, request: &DocumentRequest) -> FoncierResult<()> {
        let mut tables = self.write()?;
        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn request_get(&self, id: EntityId) -> FoncierResult<Option<DocumentRequest>> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    async fn request_list(
        &self,
        status: Option<RequestStatus>,
    ) -> FoncierResult<Vec<DocumentRequest>> {
        let tables = self.read()?;
        let mut rows: Vec<DocumentRequest> = tables
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn request_update(&self, request: &DocumentRequest) -> FoncierResult<()> {
        let mut tables = self.write()?;
        match tables.requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(())
            }
            None => Err(StorageError::not_found(EntityType::Request, request.id).into()),
        }
    }

    // ========================================================================
    // REPORTING
    // ========================================================================

    async fn stats(&self) -> FoncierResult<RegistryStats> {
        let tables = self.read()?;
        let parcels: Vec<Parcel> = tables.parcels.values().cloned().collect();
        let requests: Vec<DocumentRequest> = tables.requests.values().cloned().collect();
        Ok(compute_stats(&parcels, &requests))
    }

    async fn extended_stats(&self, now: Timestamp) -> FoncierResult<ExtendedStats> {
        let tables = self.read()?;
        let parcels: Vec<Parcel> = tables.parcels.values().cloned().collect();
        let documents: Vec<Document> = tables.documents.values().cloned().collect();
        let requests: Vec<DocumentRequest> = tables.requests.values().cloned().collect();
        Ok(compute_extended_stats(&now, &parcels, &documents, &requests))
    }

    async fn health_check(&self) -> FoncierResult<()> {
        self.read()?;
        Ok(())
    }
}
