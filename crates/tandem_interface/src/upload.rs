//! Inbound upload stream.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tokio::io::AsyncRead;

/// Byte stream of an upload.
pub type ByteSource = dyn AsyncRead + Send + Unpin;

/// An inbound file: its bytes plus the name and content type the sender
/// reported for it.
///
/// # Examples
///
/// ```
/// use tandem_interface::Upload;
///
/// let upload = Upload::from_bytes("notes.txt", "text/plain", b"hello".to_vec());
/// assert_eq!(upload.filename(), "notes.txt");
/// assert_eq!(upload.content_type(), "text/plain");
/// ```
pub struct Upload {
    filename: String,
    content_type: String,
    body: Box<ByteSource>,
}

impl Upload {
    /// Wrap an arbitrary reader.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        body: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            body: Box::new(body),
        }
    }

    /// Upload an in-memory buffer.
    pub fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::new(filename, content_type, Cursor::new(bytes))
    }

    /// Upload a local file, reporting its file name.
    pub async fn from_path(path: &Path, content_type: impl Into<String>) -> std::io::Result<Self> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(filename, content_type, file))
    }

    /// Name reported by the sender.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content type reported by the sender.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Split into reported name, content type and body.
    pub fn into_parts(self) -> (String, String, Box<ByteSource>) {
        (self.filename, self.content_type, self.body)
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
