//! Content stores for Tandem.
//!
//! The record store keeps file metadata; a content store keeps the bytes.
//! Blobs are addressed by the record's filename, joined onto a base
//! directory supplied by configuration.
//!
//! # Example
//!
//! ```rust
//! use tandem_interface::ContentStore;
//! use tandem_storage::FileSystemStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::TempDir::new()?;
//! let storage = FileSystemStorage::open(dir.path())?;
//!
//! let mut body: &[u8] = b"%PDF-1.7";
//! storage.write_stream("report.pdf", &mut body).await?;
//! assert_eq!(storage.read("report.pdf").await?, b"%PDF-1.7");
//!
//! storage.rename("report.pdf", "summary.pdf").await?;
//! storage.delete_file("summary.pdf").await?;
//! # Ok(())
//! # }
//! ```

mod filesystem;

pub use filesystem::FileSystemStorage;
pub use tandem_error::{StorageError, StorageErrorKind};
