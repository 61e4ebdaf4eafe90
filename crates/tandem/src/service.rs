//! Wiring of the configured stores into a coordinator.

use crate::TandemConfig;
use std::sync::Arc;
use tandem_coordinator::FileCoordinator;
use tandem_database::{PostgresRecordStore, establish_pool};
use tandem_error::TandemResult;
use tandem_storage::FileSystemStorage;
use tracing::{info, instrument};

/// Open the record store described by `config`.
///
/// # Errors
///
/// Returns an error if no connection string is configured or the pool
/// cannot connect.
#[instrument(skip(config))]
pub fn open_record_store(config: &TandemConfig) -> TandemResult<PostgresRecordStore> {
    let url = config.database_url()?;
    let pool = establish_pool(&url, *config.database().pool_size())?;
    Ok(PostgresRecordStore::new(pool))
}

/// Open both stores and build a coordinator over them.
///
/// The content directory is checked before the database is contacted.
///
/// # Errors
///
/// Returns an error if `storage.base_dir` is missing or not a directory, or
/// the record store cannot be opened.
#[instrument(skip(config))]
pub fn open_coordinator(config: &TandemConfig) -> TandemResult<FileCoordinator> {
    let content = FileSystemStorage::open(config.storage().base_dir())?;
    let records = open_record_store(config)?;

    info!(base_dir = %content.base_path().display(), "Opened file stores");
    Ok(FileCoordinator::new(Arc::new(records), Arc::new(content)))
}
