//! File record types.

use serde::{Deserialize, Serialize};

/// Payload stored in `data` when the uploader supplies none.
pub const DEFAULT_DATA: &str = "{}";

/// Identifier assigned by the record store when a record is created.
///
/// # Examples
///
/// ```
/// use tandem_core::FileId;
///
/// let id = FileId::from(42);
/// assert_eq!(id.to_string(), "42");
/// assert_eq!(id.0, 42);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct FileId(pub i32);

/// Metadata for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned identifier, immutable after creation
    pub id: FileId,
    /// Unique name; also the content-store key of the blob
    pub filename: String,
    /// Content type reported by the uploader, never interpreted
    pub content_type: String,
    /// Caller-supplied opaque metadata
    pub data: String,
}

/// Values for inserting a new record.
///
/// # Examples
///
/// ```
/// use tandem_core::{NewFileRecord, DEFAULT_DATA};
///
/// let new = NewFileRecord::new("report.pdf", "application/pdf", None);
/// assert_eq!(new.data, DEFAULT_DATA);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewFileRecord {
    /// Resolved filename
    pub filename: String,
    /// Content type reported by the uploader
    pub content_type: String,
    /// Opaque metadata
    pub data: String,
}

impl NewFileRecord {
    /// Build an insert payload, substituting [`DEFAULT_DATA`] for missing data.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Option<&str>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.unwrap_or(DEFAULT_DATA).to_string(),
        }
    }
}

/// Partial update of a record. `None` leaves the field unchanged.
///
/// # Examples
///
/// ```
/// use tandem_core::FileRecordPatch;
///
/// let patch = FileRecordPatch::default().with_filename("summary.pdf");
/// assert_eq!(patch.filename.as_deref(), Some("summary.pdf"));
/// assert!(patch.data.is_none());
/// assert!(!patch.is_empty());
/// assert!(FileRecordPatch::default().is_empty());
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct FileRecordPatch {
    /// New filename
    pub filename: Option<String>,
    /// New opaque metadata
    pub data: Option<String>,
}

impl FileRecordPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.data.is_none()
    }

    /// Apply the patch to a record in place.
    pub fn apply_to(&self, record: &mut FileRecord) {
        if let Some(filename) = &self.filename {
            record.filename.clone_from(filename);
        }
        if let Some(data) = &self.data {
            record.data.clone_from(data);
        }
    }
}
