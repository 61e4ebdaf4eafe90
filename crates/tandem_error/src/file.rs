//! Errors surfaced by file coordinator operations.

/// Conditions reported to callers of the file coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FileErrorKind {
    /// Another record already owns the resolved filename
    #[display("A file with this name already exists: {}", _0)]
    DuplicateName(String),
    /// No record exists with the given id
    #[display("This file does not exist: {}", _0)]
    NotFound(i32),
    /// The content store could not write, rename or delete the blob
    #[display("Unable to write file to disk: {}", _0)]
    StorageWrite(String),
    /// The resolved filename cannot be used as a content-store key
    #[display("Invalid filename: {:?}", _0)]
    InvalidName(String),
}

/// File coordinator error with location tracking.
///
/// # Examples
///
/// ```
/// use tandem_error::{FileError, FileErrorKind};
///
/// let err = FileError::new(FileErrorKind::DuplicateName("report.pdf".to_string()));
/// assert!(format!("{}", err).contains("already exists"));
/// assert_eq!(err.kind, FileErrorKind::DuplicateName("report.pdf".to_string()));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("File Error: {} at line {} in {}", kind, line, file)]
pub struct FileError {
    /// The kind of error that occurred
    pub kind: FileErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FileError {
    /// Create a new file error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FileErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
