//! Two-store file coordinator.

use std::path::PathBuf;
use std::sync::Arc;
use tandem_core::{
    FileId, FileRecord, FileRecordPatch, NewFileRecord, resolve_rename, resolve_upload_name,
    validate_filename,
};
use tandem_error::{
    DatabaseErrorKind, FileError, FileErrorKind, TandemError, TandemErrorKind, TandemResult,
};
use tandem_interface::{ContentStore, RecordStore, RecordTransaction, Upload};
use tracing::{debug, error, info, warn};

use crate::{NameGuard, NameLocks};

/// Coordinates file records and file contents.
///
/// Each mutation runs inside one record store transaction. The content store
/// change happens after the record change and before the commit, so a failing
/// blob operation rolls the record back and a failing commit is undone on the
/// content side.
///
/// Mutations of the same filename are serialized through [`NameLocks`]; the
/// record store's unique constraint guards against other processes.
#[derive(Clone)]
pub struct FileCoordinator {
    records: Arc<dyn RecordStore>,
    content: Arc<dyn ContentStore>,
    locks: NameLocks,
}

/// A record read while holding the locks for its filename and, on rename,
/// for its target filename.
struct Locked {
    record: FileRecord,
    target: Option<String>,
    _guard: NameGuard,
}

impl std::fmt::Debug for FileCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCoordinator")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl FileCoordinator {
    /// Create a coordinator over a record store and a content store.
    pub fn new(records: Arc<dyn RecordStore>, content: Arc<dyn ContentStore>) -> Self {
        Self {
            records,
            content,
            locks: NameLocks::new(),
        }
    }

    /// Store a new file.
    ///
    /// The filename is `display_name` plus the extension of the reported
    /// name, or the reported name itself when no display name is given.
    /// `data` defaults to `"{}"`.
    ///
    /// # Errors
    ///
    /// - `FileErrorKind::InvalidName` if the resolved filename is not a single
    ///   path component
    /// - `FileErrorKind::DuplicateName` if a record already owns the filename
    /// - `FileErrorKind::StorageWrite` if the bytes could not be stored; no
    ///   record is created
    #[tracing::instrument(skip(self, upload, data), fields(reported = upload.filename()))]
    pub async fn upload(
        &self,
        upload: Upload,
        display_name: Option<&str>,
        data: Option<&str>,
    ) -> TandemResult<FileRecord> {
        let (reported, content_type, mut body) = upload.into_parts();
        let filename = resolve_upload_name(&reported, display_name);
        validate_filename(&filename)?;

        let _guard = self.locks.lock(&[filename.as_str()]).await;

        if self.records.find_by_filename(&filename).await?.is_some() {
            return Err(duplicate(&filename));
        }

        let mut tx = self.records.begin().await?;
        let new = NewFileRecord::new(filename.as_str(), content_type, data);
        let record = match tx.create(&new).await {
            Ok(record) => record,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(translate_record_error(e, &filename, None));
            }
        };

        let bytes = match self.content.write_stream(&filename, &mut *body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(filename = %filename, error = %e, "Blob write failed, rolling back record");
                rollback_quietly(tx).await;
                return Err(storage_write(e));
            }
        };

        if let Err(e) = tx.commit().await {
            warn!(filename = %filename, error = %e, "Commit failed, removing stored blob");
            if let Err(cleanup) = self.content.delete_file(&filename).await {
                error!(filename = %filename, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        info!(id = %record.id, filename = %record.filename, bytes, "Stored file");
        Ok(record)
    }

    /// Delete a file's record and blob.
    ///
    /// The blob is moved to a hidden staging name before the record deletion
    /// commits and removed afterwards. If the staged blob cannot be removed
    /// the delete still succeeds and the leftover is logged.
    ///
    /// # Errors
    ///
    /// - `FileErrorKind::NotFound` if no record has `id`
    /// - `FileErrorKind::StorageWrite` if the blob could not be removed; the
    ///   record is kept
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: FileId) -> TandemResult<bool> {
        let Locked { record, _guard, .. } = self.lock_record(id, None).await?;
        let staged = staging_key();

        let mut tx = self.records.begin().await?;
        if let Err(e) = tx.delete(id).await {
            rollback_quietly(tx).await;
            return Err(translate_record_error(e, &record.filename, Some(id)));
        }

        if let Err(e) = self.content.rename(&record.filename, &staged).await {
            warn!(filename = %record.filename, error = %e, "Blob removal failed, rolling back delete");
            rollback_quietly(tx).await;
            return Err(storage_write(e));
        }

        if let Err(e) = tx.commit().await {
            warn!(filename = %record.filename, error = %e, "Commit failed, restoring blob");
            if let Err(restore) = self.content.rename(&staged, &record.filename).await {
                error!(
                    filename = %record.filename,
                    staged = %staged,
                    error = %restore,
                    "Failed to restore staged blob"
                );
            }
            return Err(e);
        }

        if let Err(e) = self.content.delete_file(&staged).await {
            warn!(staged = %staged, error = %e, "Record deleted but staged blob was left behind");
        }

        info!(filename = %record.filename, "Deleted file");
        Ok(true)
    }

    /// Rename a file and/or replace its data.
    ///
    /// A new `display_name` keeps the current extension. Passing neither a
    /// name nor data is a no-op. A data-only update never touches the
    /// content store.
    ///
    /// # Errors
    ///
    /// - `FileErrorKind::NotFound` if no record has `id`
    /// - `FileErrorKind::InvalidName` if the new filename is not a single path
    ///   component
    /// - `FileErrorKind::DuplicateName` if another record owns the new filename
    /// - `FileErrorKind::StorageWrite` if the blob could not be renamed; the
    ///   record is unchanged
    #[tracing::instrument(skip(self, data), fields(id = %id))]
    pub async fn update(
        &self,
        id: FileId,
        display_name: Option<&str>,
        data: Option<&str>,
    ) -> TandemResult<bool> {
        let Locked {
            record,
            target,
            _guard,
        } = self.lock_record(id, display_name).await?;
        let rename_to = target.filter(|name| *name != record.filename);

        if let Some(to) = &rename_to
            && self.records.find_by_filename(to).await?.is_some()
        {
            return Err(duplicate(to));
        }

        let mut patch = FileRecordPatch::default();
        if let Some(to) = &rename_to {
            patch = patch.with_filename(to.as_str());
        }
        if let Some(data) = data {
            patch = patch.with_data(data);
        }
        if patch.is_empty() {
            debug!("Nothing to update");
            return Ok(true);
        }

        let mut tx = self.records.begin().await?;
        let target_name = rename_to.as_deref().unwrap_or(&record.filename);
        if let Err(e) = tx.update(id, &patch).await {
            rollback_quietly(tx).await;
            return Err(translate_record_error(e, target_name, Some(id)));
        }

        if let Some(to) = &rename_to
            && let Err(e) = self.content.rename(&record.filename, to).await
        {
            warn!(from = %record.filename, to = %to, error = %e, "Blob rename failed, rolling back");
            rollback_quietly(tx).await;
            return Err(storage_write(e));
        }

        if let Err(e) = tx.commit().await {
            if let Some(to) = &rename_to {
                warn!(from = %record.filename, to = %to, error = %e, "Commit failed, renaming blob back");
                if let Err(restore) = self.content.rename(to, &record.filename).await {
                    error!(
                        from = %to,
                        to = %record.filename,
                        error = %restore,
                        "Failed to restore blob name"
                    );
                }
            }
            return Err(e);
        }

        info!(
            from = %record.filename,
            to = %target_name,
            data_changed = patch.data.is_some(),
            "Updated file"
        );
        Ok(true)
    }

    /// Get a record by id.
    pub async fn get(&self, id: FileId) -> TandemResult<Option<FileRecord>> {
        self.records.find_by_id(id).await
    }

    /// All records, ordered by id.
    pub async fn get_all(&self) -> TandemResult<Vec<FileRecord>> {
        self.records.find_all().await
    }

    /// Location of a record's blob in the content store.
    pub fn blob_path(&self, record: &FileRecord) -> TandemResult<PathBuf> {
        self.content.path_for(&record.filename)
    }

    /// Read a record and lock its filename, plus the rename target if a
    /// display name is given.
    ///
    /// Retries when the record is renamed between the read and the lock.
    async fn lock_record(&self, id: FileId, display_name: Option<&str>) -> TandemResult<Locked> {
        loop {
            let seen = self.require(id).await?;
            let target = resolve_rename(&seen.filename, display_name);
            if let Some(target) = &target {
                validate_filename(target)?;
            }

            let mut names = vec![seen.filename.as_str()];
            names.extend(target.as_deref());
            let guard = self.locks.lock(names.as_slice()).await;

            match self.records.find_by_id(id).await? {
                Some(record) if record.filename == seen.filename => {
                    return Ok(Locked {
                        record,
                        target,
                        _guard: guard,
                    });
                }
                Some(record) => {
                    debug!(was = %seen.filename, now = %record.filename, "Renamed while locking, retrying");
                }
                None => return Err(not_found(id)),
            }
        }
    }

    async fn require(&self, id: FileId) -> TandemResult<FileRecord> {
        self.records
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

/// Hidden content-store key a blob is parked under while its delete commits.
///
/// Fixed length, so any filename the store accepts can also be staged.
fn staging_key() -> String {
    format!(".{}.deleting", uuid::Uuid::new_v4().simple())
}

async fn rollback_quietly(tx: Box<dyn RecordTransaction>) {
    if let Err(e) = tx.rollback().await {
        error!(error = %e, "Rollback failed");
    }
}

#[track_caller]
fn duplicate(filename: &str) -> TandemError {
    FileError::new(FileErrorKind::DuplicateName(filename.to_string())).into()
}

#[track_caller]
fn not_found(id: FileId) -> TandemError {
    FileError::new(FileErrorKind::NotFound(id.0)).into()
}

/// Re-raise a content store failure as `StorageWrite`.
#[track_caller]
fn storage_write(err: TandemError) -> TandemError {
    let message = match err.kind() {
        TandemErrorKind::Storage(e) => e.kind.to_string(),
        other => other.to_string(),
    };
    FileError::new(FileErrorKind::StorageWrite(message)).into()
}

/// Map record store conditions onto the coordinator's own error kinds.
#[track_caller]
fn translate_record_error(err: TandemError, filename: &str, id: Option<FileId>) -> TandemError {
    match (err.database_kind(), id) {
        (Some(DatabaseErrorKind::UniqueViolation(_)), _) => duplicate(filename),
        (Some(DatabaseErrorKind::NotFound), Some(id)) => not_found(id),
        _ => err,
    }
}
