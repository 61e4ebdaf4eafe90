//! PostgreSQL implementation of RecordStore.

use crate::connection::PgPool;
use crate::{DatabaseResult, queries};
use async_trait::async_trait;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use tandem_core::{FileId, FileRecord, FileRecordPatch, NewFileRecord};
use tandem_error::{DatabaseError, DatabaseErrorKind, TandemResult};
use tandem_interface::{RecordStore, RecordTransaction};

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

fn join_error(e: tokio::task::JoinError) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::Query(format!(
        "database task failed: {}",
        e
    )))
}

fn checkout(pool: &PgPool) -> DatabaseResult<PgPooled> {
    pool.get()
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))
}

/// PostgreSQL record store using Diesel ORM.
///
/// Diesel is synchronous, so every query runs on tokio's blocking pool with a
/// connection checked out of an r2d2 pool. Filename uniqueness is enforced by
/// the `files_filename_key` constraint.
///
/// # Example
/// ```no_run
/// use tandem_database::{PostgresRecordStore, establish_pool};
/// use tandem_interface::RecordStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = establish_pool("postgres://localhost/tandem", 8)?;
/// let store = PostgresRecordStore::new(pool);
/// store.migrate().await?;
/// let files = store.find_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Create a record store on top of a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply any pending schema migrations.
    pub async fn migrate(&self) -> TandemResult<Vec<String>> {
        self.run(crate::run_migrations).await
    }

    async fn run<T, F>(&self, f: F) -> TandemResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = checkout(&pool)?;
            f(&mut conn)
        })
        .await
        .map_err(join_error)?;
        Ok(result?)
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: FileId) -> TandemResult<Option<FileRecord>> {
        self.run(move |conn| queries::find_by_id(conn, id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_filename(&self, filename: &str) -> TandemResult<Option<FileRecord>> {
        let filename = filename.to_string();
        self.run(move |conn| queries::find_by_filename(conn, &filename))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> TandemResult<Vec<FileRecord>> {
        self.run(queries::find_all).await
    }

    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> TandemResult<Box<dyn RecordTransaction>> {
        let pool = self.pool.clone();
        let conn = tokio::task::spawn_blocking(move || -> DatabaseResult<PgPooled> {
            let mut conn = checkout(&pool)?;
            AnsiTransactionManager::begin_transaction(&mut *conn)?;
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        tracing::debug!("Began transaction");
        Ok(Box::new(PgRecordTransaction { conn: Some(conn) }))
    }
}

/// A transaction holding one pooled connection until commit or rollback.
struct PgRecordTransaction {
    /// `None` once the transaction has finished, or while a statement runs.
    conn: Option<PgPooled>,
}

impl PgRecordTransaction {
    async fn with_conn<T, F>(&mut self, f: F) -> TandemResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.conn.take().ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::Transaction(
                "transaction already finished".to_string(),
            ))
        })?;

        let (conn, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut conn);
            (conn, result)
        })
        .await
        .map_err(join_error)?;

        self.conn = Some(conn);
        Ok(result?)
    }

    async fn finish<F>(mut self: Box<Self>, f: F) -> TandemResult<()>
    where
        F: FnOnce(&mut PgConnection) -> diesel::QueryResult<()> + Send + 'static,
    {
        let result = self
            .with_conn(move |conn| {
                f(conn).map_err(|e| DatabaseError::new(DatabaseErrorKind::Transaction(e.to_string())))
            })
            .await;
        // Back to the pool either way; r2d2 discards it if still mid-transaction
        drop(self.conn.take());
        result
    }
}

#[async_trait]
impl RecordTransaction for PgRecordTransaction {
    #[tracing::instrument(skip(self, record), fields(filename = %record.filename))]
    async fn create(&mut self, record: &NewFileRecord) -> TandemResult<FileRecord> {
        let record = record.clone();
        self.with_conn(move |conn| queries::insert(conn, &record))
            .await
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&mut self, id: FileId, patch: &FileRecordPatch) -> TandemResult<FileRecord> {
        let patch = patch.clone();
        self.with_conn(move |conn| queries::update(conn, id, &patch))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&mut self, id: FileId) -> TandemResult<()> {
        self.with_conn(move |conn| queries::delete(conn, id)).await
    }

    async fn commit(self: Box<Self>) -> TandemResult<()> {
        self.finish(|conn| AnsiTransactionManager::commit_transaction(conn))
            .await?;
        tracing::debug!("Committed transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> TandemResult<()> {
        self.finish(|conn| AnsiTransactionManager::rollback_transaction(conn))
            .await?;
        tracing::debug!("Rolled back transaction");
        Ok(())
    }
}

impl Drop for PgRecordTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        let rollback = move || {
            let mut conn = conn;
            if let Err(e) = AnsiTransactionManager::rollback_transaction(&mut *conn) {
                tracing::warn!(error = %e, "Rollback of abandoned transaction failed");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(rollback);
            }
            Err(_) => rollback(),
        }
    }
}
