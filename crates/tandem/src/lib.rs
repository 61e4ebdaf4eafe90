//! Tandem - file storage with consistent metadata and contents.
//!
//! Every stored file is a metadata record in PostgreSQL plus a blob in a
//! directory on disk. Uploads, renames and deletes keep the two in step: an
//! operation either changes both stores or neither.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tandem::{TandemConfig, Upload, open_coordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TandemConfig::load(None)?;
//!     let files = open_coordinator(&config)?;
//!
//!     let upload = Upload::from_path("report.pdf".as_ref(), "application/pdf").await?;
//!     let record = files.upload(upload, Some("q3-summary"), None).await?;
//!     println!("Stored {} as #{}", record.filename, record.id);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Tandem is organized as a workspace with focused crates:
//!
//! - `tandem_error` - Error types
//! - `tandem_core` - File records and filename rules
//! - `tandem_interface` - Record store and content store traits
//! - `tandem_storage` - Filesystem content store
//! - `tandem_database` - PostgreSQL record store
//! - `tandem_coordinator` - The coordinator keeping both stores consistent
//!
//! This crate (`tandem`) re-exports everything and adds configuration,
//! logging setup and the `tandem` command-line tool.

mod config;
mod observability;
mod service;

pub use config::{DatabaseConfig, LoggingConfig, StorageConfig, TandemConfig, environment};
pub use observability::init_logging;
pub use service::{open_coordinator, open_record_store};

// Re-export workspace crates
pub use tandem_coordinator::*;
pub use tandem_core::*;
pub use tandem_database::{
    DatabaseResult, PgPool, PostgresRecordStore, database_url_from_env, establish_pool,
};
pub use tandem_error::*;
pub use tandem_interface::*;
pub use tandem_storage::*;
