//! Error types for the Tandem workspace.
//!
//! This crate provides the foundation error types shared by the record store,
//! the content store and the file coordinator.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! [`FileError`] carries the conditions callers of the coordinator are
//! expected to handle (duplicate names, unknown ids, failed blob writes).
//! [`StorageError`] and [`DatabaseError`] describe failures of the two
//! underlying stores.
//!
//! # Examples
//!
//! ```
//! use tandem_error::{FileError, FileErrorKind, TandemErrorKind, TandemResult};
//!
//! fn lookup(id: i32) -> TandemResult<String> {
//!     Err(FileError::new(FileErrorKind::NotFound(id)))?
//! }
//!
//! let err = lookup(7).unwrap_err();
//! assert!(matches!(err.kind(), TandemErrorKind::File(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod file;
mod json;
mod storage;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{TandemError, TandemErrorKind, TandemResult};
pub use file::{FileError, FileErrorKind};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
