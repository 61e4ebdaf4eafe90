//! Core data types for the Tandem file storage coordinator.
//!
//! A stored file has two representations: a [`FileRecord`] in the record store
//! and a blob in the content store whose key is the record's `filename`. This
//! crate defines the record shapes and the rules that turn an uploaded or
//! requested name into that key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod naming;
mod record;

pub use naming::{
    MAX_FILENAME_LEN, extension_of, resolve_rename, resolve_upload_name, validate_filename,
};
pub use record::{DEFAULT_DATA, FileId, FileRecord, FileRecordPatch, NewFileRecord};
