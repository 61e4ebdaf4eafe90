//! Record store traits.

use async_trait::async_trait;
use tandem_core::{FileId, FileRecord, FileRecordPatch, NewFileRecord};
use tandem_error::TandemResult;

/// Durable, transactional storage for [`FileRecord`]s.
///
/// Reads go straight to the store. Mutations happen inside a
/// [`RecordTransaction`] obtained from [`RecordStore::begin`].
///
/// Implementations must enforce uniqueness of `filename` themselves and
/// report a violation as `DatabaseErrorKind::UniqueViolation`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a record by id.
    async fn find_by_id(&self, id: FileId) -> TandemResult<Option<FileRecord>>;

    /// Look up a record by its filename.
    async fn find_by_filename(&self, filename: &str) -> TandemResult<Option<FileRecord>>;

    /// All records, ordered by id.
    async fn find_all(&self) -> TandemResult<Vec<FileRecord>>;

    /// Open a transaction.
    async fn begin(&self) -> TandemResult<Box<dyn RecordTransaction>>;
}

/// An open record store transaction.
///
/// Nothing written through the handle is visible to other readers until
/// [`commit`](RecordTransaction::commit) succeeds. Dropping the handle without
/// committing rolls the transaction back.
#[async_trait]
pub trait RecordTransaction: Send {
    /// Insert a record and return it with its generated id.
    async fn create(&mut self, record: &NewFileRecord) -> TandemResult<FileRecord>;

    /// Apply `patch` to the record with `id` and return the updated record.
    ///
    /// Fails with `DatabaseErrorKind::NotFound` if the record does not exist.
    async fn update(&mut self, id: FileId, patch: &FileRecordPatch) -> TandemResult<FileRecord>;

    /// Delete the record with `id`.
    ///
    /// Fails with `DatabaseErrorKind::NotFound` if the record does not exist.
    async fn delete(&mut self, id: FileId) -> TandemResult<()>;

    /// Make every change in this transaction durable.
    async fn commit(self: Box<Self>) -> TandemResult<()>;

    /// Discard every change in this transaction.
    async fn rollback(self: Box<Self>) -> TandemResult<()>;
}
