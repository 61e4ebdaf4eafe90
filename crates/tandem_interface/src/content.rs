//! Content store trait.

use async_trait::async_trait;
use std::path::PathBuf;
use tandem_error::TandemResult;

use crate::ByteSource;

/// Storage for raw file bytes, addressed by filename.
///
/// Metadata lives in the [`RecordStore`](crate::RecordStore); the content store
/// only knows blobs and their keys.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stream `source` into a new blob named `filename`.
    ///
    /// Must not overwrite an existing blob. On failure no partial blob is left
    /// behind.
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write_stream(&self, filename: &str, source: &mut ByteSource) -> TandemResult<u64>;

    /// Move the blob `from` to `to`. Must not overwrite an existing blob.
    async fn rename(&self, from: &str, to: &str) -> TandemResult<()>;

    /// Remove the blob named `filename`.
    async fn delete_file(&self, filename: &str) -> TandemResult<()>;

    /// Read the whole blob named `filename`.
    async fn read(&self, filename: &str) -> TandemResult<Vec<u8>>;

    /// Whether a blob named `filename` exists.
    async fn exists(&self, filename: &str) -> TandemResult<bool>;

    /// Backend location of the blob named `filename`.
    fn path_for(&self, filename: &str) -> TandemResult<PathBuf>;
}
