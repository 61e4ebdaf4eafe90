//! Content store error types.

/// Kinds of content store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to write blob
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read blob
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Failed to rename blob
    #[display("Failed to rename file: {}", _0)]
    Rename(String),
    /// Failed to delete blob
    #[display("Failed to delete file: {}", _0)]
    Delete(String),
    /// No blob at the specified location
    #[display("File not found: {}", _0)]
    NotFound(String),
    /// A blob already occupies the target location
    #[display("File already exists: {}", _0)]
    AlreadyExists(String),
    /// Key does not map to a path inside the base directory
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Invalid storage configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
}

/// Content store error with location tracking.
///
/// # Examples
///
/// ```
/// use tandem_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("/srv/static/a.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
