//! PostgreSQL record store for Tandem.
//!
//! This crate provides the diesel schema for the `files` table, embedded
//! migrations, and [`PostgresRecordStore`], an implementation of
//! [`tandem_interface::RecordStore`] with real database transactions.
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_database::{PostgresRecordStore, database_url_from_env, establish_pool};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = establish_pool(&database_url_from_env()?, 8)?;
//! let store = PostgresRecordStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod migrations;
mod models;
mod queries;
mod record_store;

// Public modules for external access
pub mod schema;

pub use connection::{PgPool, database_url_from_env, establish_pool};
pub use migrations::run_migrations;
pub use models::{FileRow, FileRowChangeset, NewFileRow};
pub use record_store::PostgresRecordStore;

use tandem_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
