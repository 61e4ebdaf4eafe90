//! In-memory implementation of RecordStore.
//!
//! This module provides a BTreeMap-based record store with real transaction
//! semantics. Useful for tests and for embedding the coordinator without a
//! database.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tandem_core::{FileId, FileRecord, FileRecordPatch, NewFileRecord};
use tandem_error::{DatabaseError, DatabaseErrorKind, TandemResult};
use tandem_interface::{RecordStore, RecordTransaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table contents shared by the store and its transactions.
#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<FileId, FileRecord>,
    last_id: i32,
}

impl Table {
    fn filename_taken(&self, filename: &str, except: Option<FileId>) -> bool {
        self.rows
            .values()
            .any(|r| r.filename == filename && Some(r.id) != except)
    }

    fn insert(&mut self, new: &NewFileRecord) -> TandemResult<FileRecord> {
        if self.filename_taken(&new.filename, None) {
            return Err(unique_violation(&new.filename).into());
        }

        self.last_id += 1;
        let record = FileRecord {
            id: FileId(self.last_id),
            filename: new.filename.clone(),
            content_type: new.content_type.clone(),
            data: new.data.clone(),
        };
        self.rows.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&mut self, id: FileId, patch: &FileRecordPatch) -> TandemResult<FileRecord> {
        if let Some(filename) = &patch.filename
            && self.filename_taken(filename, Some(id))
        {
            return Err(unique_violation(filename).into());
        }

        let record = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    fn delete(&mut self, id: FileId) -> TandemResult<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound).into())
    }
}

#[track_caller]
fn unique_violation(filename: &str) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::UniqueViolation(format!(
        "filename {:?} is already taken",
        filename
    )))
}

/// In-memory record store.
///
/// Transactions are serializable: `begin` waits until no other transaction is
/// open, works on a private copy of the table, and publishes that copy on
/// commit. Reads also wait for an open transaction to finish. All data is lost
/// when the store is dropped.
///
/// # Example
/// ```
/// use tandem_coordinator::InMemoryRecordStore;
/// use tandem_core::NewFileRecord;
/// use tandem_interface::RecordStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryRecordStore::new();
/// let mut tx = store.begin().await?;
/// let record = tx.create(&NewFileRecord::new("a.txt", "text/plain", None)).await?;
/// tx.commit().await?;
///
/// assert_eq!(store.find_by_id(record.id).await?, Some(record));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    table: Arc<Mutex<Table>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of committed records.
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    /// Check if the store holds no committed records.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.rows.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_id(&self, id: FileId) -> TandemResult<Option<FileRecord>> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn find_by_filename(&self, filename: &str) -> TandemResult<Option<FileRecord>> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .find(|r| r.filename == filename)
            .cloned())
    }

    async fn find_all(&self) -> TandemResult<Vec<FileRecord>> {
        Ok(self.table.lock().await.rows.values().cloned().collect())
    }

    async fn begin(&self) -> TandemResult<Box<dyn RecordTransaction>> {
        let committed = Arc::clone(&self.table).lock_owned().await;
        let staged = committed.clone();
        Ok(Box::new(InMemoryTransaction { committed, staged }))
    }
}

/// Open transaction: exclusive access to the committed table plus a staged copy.
struct InMemoryTransaction {
    committed: OwnedMutexGuard<Table>,
    staged: Table,
}

#[async_trait]
impl RecordTransaction for InMemoryTransaction {
    async fn create(&mut self, record: &NewFileRecord) -> TandemResult<FileRecord> {
        self.staged.insert(record)
    }

    async fn update(&mut self, id: FileId, patch: &FileRecordPatch) -> TandemResult<FileRecord> {
        self.staged.update(id, patch)
    }

    async fn delete(&mut self, id: FileId) -> TandemResult<()> {
        self.staged.delete(id)
    }

    async fn commit(self: Box<Self>) -> TandemResult<()> {
        let InMemoryTransaction {
            mut committed,
            staged,
        } = *self;
        *committed = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> TandemResult<()> {
        Ok(())
    }
}
