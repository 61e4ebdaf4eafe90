//! Top-level error wrapper types.

use crate::{ConfigError, DatabaseError, FileError, JsonError, StorageError};

/// Every failure the workspace can report.
///
/// # Examples
///
/// ```
/// use tandem_error::{TandemError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::FileWrite("disk full".to_string()));
/// let err: TandemError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TandemErrorKind {
    /// Coordinator-level failure (duplicate name, unknown id, blob write)
    #[from(FileError)]
    File(FileError),
    /// Content store failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Record store failure
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON rendering error
    #[from(JsonError)]
    Json(JsonError),
}

/// Tandem error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tandem_error::{ConfigError, TandemResult};
///
/// fn might_fail() -> TandemResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tandem Error: {}", _0)]
pub struct TandemError(Box<TandemErrorKind>);

impl TandemError {
    /// Create a new error from a kind.
    pub fn new(kind: TandemErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TandemErrorKind {
        &self.0
    }

    /// The coordinator-level kind, if this is a [`FileError`].
    pub fn file_kind(&self) -> Option<&crate::FileErrorKind> {
        match self.kind() {
            TandemErrorKind::File(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The record store kind, if this is a [`DatabaseError`].
    pub fn database_kind(&self) -> Option<&crate::DatabaseErrorKind> {
        match self.kind() {
            TandemErrorKind::Database(e) => Some(&e.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TandemErrorKind
impl<T> From<T> for TandemError
where
    T: Into<TandemErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tandem operations.
pub type TandemResult<T> = std::result::Result<T, TandemError>;
