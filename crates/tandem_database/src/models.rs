//! Diesel row types for the `files` table.

use crate::schema::files;
use diesel::prelude::*;
use tandem_core::{FileId, FileRecord, FileRecordPatch, NewFileRecord};

/// Database row for the `files` table.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FileRow {
    /// Serial primary key
    pub id: i32,
    /// Unique filename, also the blob key
    pub filename: String,
    /// Uploader-reported content type
    pub content_type: String,
    /// Opaque metadata
    pub data: String,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        Self {
            id: FileId(row.id),
            filename: row.filename,
            content_type: row.content_type,
            data: row.data,
        }
    }
}

/// Insertable struct for a new file.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = files)]
pub struct NewFileRow {
    /// Unique filename
    pub filename: String,
    /// Uploader-reported content type
    pub content_type: String,
    /// Opaque metadata
    pub data: String,
}

impl From<&NewFileRecord> for NewFileRow {
    fn from(record: &NewFileRecord) -> Self {
        Self {
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
            data: record.data.clone(),
        }
    }
}

/// Changeset for renaming a file or replacing its metadata.
///
/// `None` fields are skipped by diesel.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = files)]
pub struct FileRowChangeset {
    /// New filename
    pub filename: Option<String>,
    /// New opaque metadata
    pub data: Option<String>,
}

impl From<&FileRecordPatch> for FileRowChangeset {
    fn from(patch: &FileRecordPatch) -> Self {
        Self {
            filename: patch.filename.clone(),
            data: patch.data.clone(),
        }
    }
}
