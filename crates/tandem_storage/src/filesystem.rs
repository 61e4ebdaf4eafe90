//! Filesystem-based content store.
//!
//! Each blob is a regular file directly inside the base directory, named
//! exactly like the record's filename.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tandem_error::{StorageError, StorageErrorKind, TandemResult};
use tandem_interface::{ByteSource, ContentStore};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Filesystem content store.
///
/// Stores blobs flat under `base_path`:
///
/// ```text
/// /srv/static/
/// ├── report.pdf
/// ├── cover.png
/// └── .5f0c...part   (upload in progress)
/// ```
///
/// # Features
///
/// - **No clobbering**: new blobs and renames never replace an existing blob
/// - **Atomic writes**: bytes land in a temp file that is linked into place
///   only once fully written and synced
/// - **No partial blobs**: a failed write removes whatever it wrote
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Open a content store rooted at an existing directory.
    ///
    /// The directory is checked once here; later operations assume it stays.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `base_path` does not exist or is not a
    /// directory.
    #[tracing::instrument(skip(base_path))]
    pub fn open(base_path: impl Into<PathBuf>) -> TandemResult<Self> {
        let base_path = base_path.into();

        let metadata = std::fs::metadata(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidConfig(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        if !metadata.is_dir() {
            return Err(StorageError::new(StorageErrorKind::InvalidConfig(format!(
                "{} is not a directory",
                base_path.display()
            )))
            .into());
        }

        tracing::info!(path = %base_path.display(), "Opened filesystem storage");
        Ok(Self { base_path })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a blob key to a path, refusing anything but a plain file name.
    fn resolve(&self, filename: &str) -> TandemResult<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == filename => {
                Ok(self.base_path.join(name))
            }
            _ => Err(StorageError::new(StorageErrorKind::InvalidPath(filename.to_string())).into()),
        }
    }

    /// Fixed-length temp name, independent of the blob key's length.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(format!(".{}.part", Uuid::new_v4().simple()))
    }

    /// Copy `source` into a fresh file at `temp_path`, flushed and synced.
    async fn write_temp(temp_path: &Path, source: &mut ByteSource) -> std::io::Result<u64> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .await?;
        let written = tokio::io::copy(source, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }

    async fn remove_quietly(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
        }
    }
}

fn not_found_or(
    e: std::io::Error,
    path: &Path,
    other: impl FnOnce(String) -> StorageErrorKind,
) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        }
        _ => StorageError::new(other(format!("{}: {}", path.display(), e))),
    }
}

#[async_trait]
impl ContentStore for FileSystemStorage {
    #[tracing::instrument(skip(self, source))]
    async fn write_stream(&self, filename: &str, source: &mut ByteSource) -> TandemResult<u64> {
        let path = self.resolve(filename)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists(
                path.display().to_string(),
            ))
            .into());
        }

        // Write to temp file first, then link into place for atomicity
        let temp_path = self.temp_path();
        let written = match Self::write_temp(&temp_path, source).await {
            Ok(written) => written,
            Err(e) => {
                Self::remove_quietly(&temp_path).await;
                return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    temp_path.display(),
                    e
                )))
                .into());
            }
        };

        // hard_link fails instead of replacing an existing target
        let linked = tokio::fs::hard_link(&temp_path, &path).await;
        Self::remove_quietly(&temp_path).await;
        linked.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => {
                StorageError::new(StorageErrorKind::AlreadyExists(path.display().to_string()))
            }
            _ => StorageError::new(StorageErrorKind::FileWrite(format!(
                "link {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))),
        })?;

        tracing::info!(path = %path.display(), size = written, "Stored file");
        Ok(written)
    }

    #[tracing::instrument(skip(self))]
    async fn rename(&self, from: &str, to: &str) -> TandemResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;

        if tokio::fs::try_exists(&to_path).await.unwrap_or(false) {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists(
                to_path.display().to_string(),
            ))
            .into());
        }

        tokio::fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| not_found_or(e, &from_path, StorageErrorKind::Rename))?;

        tracing::info!(
            from = %from_path.display(),
            to = %to_path.display(),
            "Renamed file"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_file(&self, filename: &str) -> TandemResult<()> {
        let path = self.resolve(filename)?;

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or(e, &path, StorageErrorKind::Delete))?;

        tracing::info!(path = %path.display(), "Deleted file");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn read(&self, filename: &str) -> TandemResult<Vec<u8>> {
        let path = self.resolve(filename)?;

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or(e, &path, StorageErrorKind::FileRead))?;

        tracing::debug!(path = %path.display(), size = data.len(), "Read file");
        Ok(data)
    }

    async fn exists(&self, filename: &str) -> TandemResult<bool> {
        let path = self.resolve(filename)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    fn path_for(&self, filename: &str) -> TandemResult<PathBuf> {
        self.resolve(filename)
    }
}
