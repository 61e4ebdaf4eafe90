//! Blocking queries against the `files` table.
//!
//! Every function takes a plain connection so it can run either on a pooled
//! connection or inside an open transaction.

use crate::models::{FileRow, FileRowChangeset, NewFileRow};
use crate::schema::files;
use crate::DatabaseResult;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tandem_core::{FileId, FileRecord, FileRecordPatch, NewFileRecord};
use tandem_error::{DatabaseError, DatabaseErrorKind};

/// Get a record by id.
pub fn find_by_id(conn: &mut PgConnection, id: FileId) -> DatabaseResult<Option<FileRecord>> {
    files::table
        .find(id.0)
        .select(FileRow::as_select())
        .first(conn)
        .optional()
        .map(|row| row.map(FileRecord::from))
        .map_err(Into::into)
}

/// Get a record by filename.
pub fn find_by_filename(
    conn: &mut PgConnection,
    filename: &str,
) -> DatabaseResult<Option<FileRecord>> {
    files::table
        .filter(files::filename.eq(filename))
        .select(FileRow::as_select())
        .first(conn)
        .optional()
        .map(|row| row.map(FileRecord::from))
        .map_err(Into::into)
}

/// All records ordered by id.
pub fn find_all(conn: &mut PgConnection) -> DatabaseResult<Vec<FileRecord>> {
    let rows: Vec<FileRow> = files::table
        .order(files::id.asc())
        .select(FileRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(FileRecord::from).collect())
}

/// Insert a record. A taken filename surfaces as `UniqueViolation`.
pub fn insert(conn: &mut PgConnection, record: &NewFileRecord) -> DatabaseResult<FileRecord> {
    let row: FileRow = diesel::insert_into(files::table)
        .values(NewFileRow::from(record))
        .returning(FileRow::as_returning())
        .get_result(conn)?;
    Ok(row.into())
}

/// Apply a patch. An empty patch only checks that the record exists.
pub fn update(
    conn: &mut PgConnection,
    id: FileId,
    patch: &FileRecordPatch,
) -> DatabaseResult<FileRecord> {
    // diesel rejects changesets without any column
    if patch.is_empty() {
        return find_by_id(conn, id)?
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound));
    }

    let row: FileRow = diesel::update(files::table.find(id.0))
        .set(FileRowChangeset::from(patch))
        .returning(FileRow::as_returning())
        .get_result(conn)?;
    Ok(row.into())
}

/// Delete a record.
pub fn delete(conn: &mut PgConnection, id: FileId) -> DatabaseResult<()> {
    let deleted = diesel::delete(files::table.find(id.0)).execute(conn)?;
    if deleted == 0 {
        return Err(DatabaseError::new(DatabaseErrorKind::NotFound));
    }
    Ok(())
}
