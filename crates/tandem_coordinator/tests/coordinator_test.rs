//! Tests for the file coordinator against the in-memory record store and a
//! filesystem content store in a temp directory.

use async_trait::async_trait;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tandem_coordinator::{FileCoordinator, InMemoryRecordStore};
use tandem_core::{FileId, FileRecord, FileRecordPatch, MAX_FILENAME_LEN, NewFileRecord};
use tandem_error::{
    DatabaseError, DatabaseErrorKind, FileErrorKind, StorageError, StorageErrorKind, TandemResult,
};
use tandem_interface::{ByteSource, ContentStore, RecordStore, RecordTransaction, Upload};
use tandem_storage::FileSystemStorage;
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

// ============================================================================
// Fault injection
// ============================================================================

/// Filesystem storage whose writes and renames can be made to fail.
struct FaultyContent {
    inner: FileSystemStorage,
    fail_writes: AtomicBool,
    fail_renames: AtomicBool,
    renames: AtomicUsize,
}

#[async_trait]
impl ContentStore for FaultyContent {
    async fn write_stream(&self, filename: &str, source: &mut ByteSource) -> TandemResult<u64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::FileWrite("disk full".into())).into());
        }
        self.inner.write_stream(filename, source).await
    }

    async fn rename(&self, from: &str, to: &str) -> TandemResult<()> {
        self.renames.fetch_add(1, Ordering::SeqCst);
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(
                StorageError::new(StorageErrorKind::Rename("permission denied".into())).into(),
            );
        }
        self.inner.rename(from, to).await
    }

    async fn delete_file(&self, filename: &str) -> TandemResult<()> {
        self.inner.delete_file(filename).await
    }

    async fn read(&self, filename: &str) -> TandemResult<Vec<u8>> {
        self.inner.read(filename).await
    }

    async fn exists(&self, filename: &str) -> TandemResult<bool> {
        self.inner.exists(filename).await
    }

    fn path_for(&self, filename: &str) -> TandemResult<PathBuf> {
        self.inner.path_for(filename)
    }
}

/// In-memory records whose commits can be made to fail.
struct FlakyRecords {
    inner: InMemoryRecordStore,
    fail_commits: Arc<AtomicBool>,
}

#[async_trait]
impl RecordStore for FlakyRecords {
    async fn find_by_id(&self, id: FileId) -> TandemResult<Option<FileRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_filename(&self, filename: &str) -> TandemResult<Option<FileRecord>> {
        self.inner.find_by_filename(filename).await
    }

    async fn find_all(&self) -> TandemResult<Vec<FileRecord>> {
        self.inner.find_all().await
    }

    async fn begin(&self) -> TandemResult<Box<dyn RecordTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        }))
    }
}

struct FlakyTransaction {
    inner: Box<dyn RecordTransaction>,
    fail_commit: bool,
}

#[async_trait]
impl RecordTransaction for FlakyTransaction {
    async fn create(&mut self, record: &NewFileRecord) -> TandemResult<FileRecord> {
        self.inner.create(record).await
    }

    async fn update(&mut self, id: FileId, patch: &FileRecordPatch) -> TandemResult<FileRecord> {
        self.inner.update(id, patch).await
    }

    async fn delete(&mut self, id: FileId) -> TandemResult<()> {
        self.inner.delete(id).await
    }

    async fn commit(self: Box<Self>) -> TandemResult<()> {
        if self.fail_commit {
            self.inner.rollback().await?;
            return Err(DatabaseError::new(DatabaseErrorKind::Transaction(
                "connection lost during commit".into(),
            ))
            .into());
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> TandemResult<()> {
        self.inner.rollback().await
    }
}

/// Record store whose filename lookups never find anything, so duplicate
/// names are only caught by the store's unique constraint.
struct NameBlindRecords {
    inner: InMemoryRecordStore,
}

#[async_trait]
impl RecordStore for NameBlindRecords {
    async fn find_by_id(&self, id: FileId) -> TandemResult<Option<FileRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_filename(&self, _filename: &str) -> TandemResult<Option<FileRecord>> {
        Ok(None)
    }

    async fn find_all(&self) -> TandemResult<Vec<FileRecord>> {
        self.inner.find_all().await
    }

    async fn begin(&self) -> TandemResult<Box<dyn RecordTransaction>> {
        self.inner.begin().await
    }
}

/// Yields some bytes, then fails like a dropped connection.
struct BrokenStream {
    sent: bool,
}

impl AsyncRead for BrokenStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.sent {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )));
        }
        self.sent = true;
        buf.put_slice(b"partial");
        Poll::Ready(Ok(()))
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    dir: TempDir,
    records: InMemoryRecordStore,
    content: Arc<FaultyContent>,
    fail_commits: Arc<AtomicBool>,
    coordinator: FileCoordinator,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let records = InMemoryRecordStore::new();
        let fail_commits = Arc::new(AtomicBool::new(false));
        let content = Arc::new(FaultyContent {
            inner: FileSystemStorage::open(dir.path()).unwrap(),
            fail_writes: AtomicBool::new(false),
            fail_renames: AtomicBool::new(false),
            renames: AtomicUsize::new(0),
        });
        let coordinator = FileCoordinator::new(
            Arc::new(FlakyRecords {
                inner: records.clone(),
                fail_commits: Arc::clone(&fail_commits),
            }),
            content.clone(),
        );
        Self {
            dir,
            records,
            content,
            fail_commits,
            coordinator,
        }
    }

    async fn upload(&self, name: &str, bytes: &[u8]) -> FileRecord {
        self.coordinator
            .upload(
                Upload::from_bytes(name, "application/octet-stream", bytes.to_vec()),
                None,
                None,
            )
            .await
            .unwrap()
    }

    /// Blob names on disk, sorted.
    fn blobs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn blob(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.dir.path().join(name)).unwrap()
    }
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_fresh_name_creates_record_and_blob() {
    let fx = Fixture::new();

    let record = fx
        .coordinator
        .upload(
            Upload::from_bytes("report.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
            None,
            Some(r#"{"pages":3}"#),
        )
        .await
        .unwrap();

    assert_eq!(record.filename, "report.pdf");
    assert_eq!(record.content_type, "application/pdf");
    assert_eq!(record.data, r#"{"pages":3}"#);
    assert_eq!(fx.records.len().await, 1);
    assert_eq!(fx.blobs(), vec!["report.pdf".to_string()]);
    assert_eq!(fx.blob("report.pdf"), b"%PDF-1.7");

    let fetched = fx.coordinator.get(record.id).await.unwrap().unwrap();
    assert_eq!(fetched, record);
    let path = fx.coordinator.blob_path(&fetched).unwrap();
    assert!(path.ends_with(&fetched.filename));
}

#[tokio::test]
async fn test_upload_display_name_takes_reported_extension() {
    let fx = Fixture::new();

    let record = fx
        .coordinator
        .upload(
            Upload::from_bytes("IMG_0042.PNG", "image/png", vec![0x89, 0x50]),
            Some("cover"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(record.filename, "cover.png");
    assert_eq!(record.data, "{}");
    assert_eq!(fx.blobs(), vec!["cover.png".to_string()]);
}

#[tokio::test]
async fn test_upload_duplicate_name_is_rejected() {
    let fx = Fixture::new();
    fx.upload("a.txt", b"first").await;

    let err = fx
        .coordinator
        .upload(Upload::from_bytes("a.txt", "text/plain", b"second".to_vec()), None, None)
        .await
        .unwrap_err();

    assert_eq!(
        err.file_kind(),
        Some(&FileErrorKind::DuplicateName("a.txt".to_string()))
    );
    assert_eq!(fx.records.len().await, 1);
    assert_eq!(fx.blobs(), vec!["a.txt".to_string()]);
    assert_eq!(fx.blob("a.txt"), b"first");
}

#[tokio::test]
async fn test_upload_broken_stream_leaves_nothing() {
    let fx = Fixture::new();
    fx.upload("keep.txt", b"keep").await;
    let before = fx.coordinator.get_all().await.unwrap();

    let err = fx
        .coordinator
        .upload(
            Upload::new("b.txt", "text/plain", BrokenStream { sent: false }),
            None,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err.file_kind(), Some(FileErrorKind::StorageWrite(_))));
    assert_eq!(fx.coordinator.get_all().await.unwrap(), before);
    assert!(fx.records.find_by_filename("b.txt").await.unwrap().is_none());
    assert_eq!(fx.blobs(), vec!["keep.txt".to_string()]);
}

#[tokio::test]
async fn test_upload_write_failure_rolls_back_record() {
    let fx = Fixture::new();
    fx.content.fail_writes.store(true, Ordering::SeqCst);

    let err = fx
        .coordinator
        .upload(Upload::from_bytes("c.txt", "text/plain", b"c".to_vec()), None, None)
        .await
        .unwrap_err();

    match err.file_kind() {
        Some(FileErrorKind::StorageWrite(msg)) => assert!(msg.contains("disk full")),
        other => panic!("expected StorageWrite, got {other:?}"),
    }
    assert!(fx.records.is_empty().await);
    assert!(fx.blobs().is_empty());
}

#[tokio::test]
async fn test_upload_commit_failure_removes_blob() {
    let fx = Fixture::new();
    fx.fail_commits.store(true, Ordering::SeqCst);

    let err = fx
        .coordinator
        .upload(Upload::from_bytes("d.txt", "text/plain", b"d".to_vec()), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.database_kind(),
        Some(DatabaseErrorKind::Transaction(_))
    ));
    assert!(fx.records.is_empty().await);
    assert!(fx.blobs().is_empty());
}

#[tokio::test]
async fn test_upload_invalid_name_is_rejected_before_mutation() {
    let fx = Fixture::new();

    for (reported, display) in [("x.txt", Some("../escape")), ("..", None), ("a/b.txt", None)] {
        let err = fx
            .coordinator
            .upload(Upload::from_bytes(reported, "text/plain", b"x".to_vec()), display, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err.file_kind(), Some(FileErrorKind::InvalidName(_))),
            "{reported:?} / {display:?}"
        );
    }

    assert!(fx.records.is_empty().await);
    assert!(fx.blobs().is_empty());
}

#[tokio::test]
async fn test_concurrent_uploads_of_same_name_store_one_file() {
    let fx = Fixture::new();

    let attempts = (0..8u8).map(|i| {
        let coordinator = fx.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .upload(Upload::from_bytes("race.bin", "application/octet-stream", vec![i; 64]), None, None)
                .await
        })
    });
    let mut stored = Vec::new();
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.unwrap() {
            Ok(record) => stored.push(record),
            Err(e) => assert!(matches!(
                e.file_kind(),
                Some(FileErrorKind::DuplicateName(_))
            )),
        }
    }

    assert_eq!(stored.len(), 1);
    assert_eq!(fx.records.len().await, 1);
    assert_eq!(fx.blobs(), vec!["race.bin".to_string()]);
}

#[tokio::test]
async fn test_unique_constraint_catches_duplicate_upload() {
    let dir = TempDir::new().unwrap();
    let records = InMemoryRecordStore::new();
    let coordinator = FileCoordinator::new(
        Arc::new(NameBlindRecords {
            inner: records.clone(),
        }),
        Arc::new(FileSystemStorage::open(dir.path()).unwrap()),
    );
    let upload = |bytes: &[u8]| Upload::from_bytes("taken.txt", "text/plain", bytes.to_vec());

    coordinator.upload(upload(b"first"), None, None).await.unwrap();
    let err = coordinator
        .upload(upload(b"second"), None, None)
        .await
        .unwrap_err();

    assert_eq!(
        err.file_kind(),
        Some(&FileErrorKind::DuplicateName("taken.txt".to_string()))
    );
    assert_eq!(records.len().await, 1);
    let blobs: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(blobs.len(), 1);
    assert_eq!(std::fs::read(dir.path().join("taken.txt")).unwrap(), b"first");
}

#[tokio::test]
async fn test_unique_constraint_catches_duplicate_rename() {
    let dir = TempDir::new().unwrap();
    let records = InMemoryRecordStore::new();
    let coordinator = FileCoordinator::new(
        Arc::new(NameBlindRecords {
            inner: records.clone(),
        }),
        Arc::new(FileSystemStorage::open(dir.path()).unwrap()),
    );
    let first = coordinator
        .upload(Upload::from_bytes("one.txt", "text/plain", b"1".to_vec()), None, None)
        .await
        .unwrap();
    let second = coordinator
        .upload(Upload::from_bytes("two.txt", "text/plain", b"2".to_vec()), None, None)
        .await
        .unwrap();

    let err = coordinator
        .update(second.id, Some("one"), None)
        .await
        .unwrap_err();

    assert_eq!(
        err.file_kind(),
        Some(&FileErrorKind::DuplicateName("one.txt".to_string()))
    );
    assert_eq!(records.find_all().await.unwrap(), vec![first, second]);
    assert_eq!(std::fs::read(dir.path().join("one.txt")).unwrap(), b"1");
    assert_eq!(std::fs::read(dir.path().join("two.txt")).unwrap(), b"2");
}

#[tokio::test]
async fn test_upload_rejects_overlong_name() {
    let fx = Fixture::new();
    let name = format!("{}.bin", "x".repeat(MAX_FILENAME_LEN));

    let err = fx
        .coordinator
        .upload(Upload::from_bytes(name, "application/octet-stream", b"x".to_vec()), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err.file_kind(), Some(FileErrorKind::InvalidName(_))));
    assert!(fx.records.is_empty().await);
    assert!(fx.blobs().is_empty());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_long_names_can_be_deleted() {
    let fx = Fixture::new();

    for stem_len in [206, 251] {
        let name = format!("{}.bin", "a".repeat(stem_len));
        let record = fx.upload(&name, b"long").await;
        assert_eq!(fx.blobs(), vec![name.clone()]);

        assert!(fx.coordinator.delete(record.id).await.unwrap());

        assert!(fx.coordinator.get(record.id).await.unwrap().is_none());
        assert!(fx.blobs().is_empty());
    }
}

#[tokio::test]
async fn test_rename_to_longest_name_keeps_extension() {
    let fx = Fixture::new();
    let record = fx.upload("short.bin", b"bytes").await;
    let stem = "r".repeat(MAX_FILENAME_LEN - ".bin".len());

    assert!(fx.coordinator.update(record.id, Some(stem.as_str()), None).await.unwrap());

    let expected = format!("{stem}.bin");
    assert_eq!(fx.blobs(), vec![expected.clone()]);
    assert_eq!(fx.blob(&expected), b"bytes");
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() {
    let fx = Fixture::new();
    let kept = fx.upload("kept.txt", b"kept").await;

    let err = fx.coordinator.delete(FileId(999)).await.unwrap_err();

    assert_eq!(err.file_kind(), Some(&FileErrorKind::NotFound(999)));
    assert_eq!(fx.coordinator.get_all().await.unwrap(), vec![kept]);
    assert_eq!(fx.blobs(), vec!["kept.txt".to_string()]);
}

#[tokio::test]
async fn test_delete_removes_record_and_blob() {
    let fx = Fixture::new();
    let record = fx.upload("gone.txt", b"bye").await;
    let path = fx.coordinator.blob_path(&record).unwrap();

    assert!(fx.coordinator.delete(record.id).await.unwrap());

    assert!(fx.coordinator.get(record.id).await.unwrap().is_none());
    assert!(!path.exists());
    assert!(fx.blobs().is_empty());
}

#[tokio::test]
async fn test_delete_with_missing_blob_keeps_record() {
    let fx = Fixture::new();
    let record = fx.upload("lost.txt", b"lost").await;
    std::fs::remove_file(fx.dir.path().join("lost.txt")).unwrap();

    let err = fx.coordinator.delete(record.id).await.unwrap_err();

    assert!(matches!(err.file_kind(), Some(FileErrorKind::StorageWrite(_))));
    assert_eq!(fx.coordinator.get(record.id).await.unwrap(), Some(record));
}

#[tokio::test]
async fn test_delete_commit_failure_restores_blob() {
    let fx = Fixture::new();
    let record = fx.upload("stay.txt", b"stay").await;
    fx.fail_commits.store(true, Ordering::SeqCst);

    assert!(fx.coordinator.delete(record.id).await.is_err());

    assert_eq!(fx.coordinator.get(record.id).await.unwrap(), Some(record));
    assert_eq!(fx.blobs(), vec!["stay.txt".to_string()]);
    assert_eq!(fx.blob("stay.txt"), b"stay");
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_rename_keeps_extension_and_moves_blob() {
    let fx = Fixture::new();
    let record = fx.upload("report.pdf", b"%PDF").await;

    assert!(fx.coordinator.update(record.id, Some("summary"), None).await.unwrap());

    let renamed = fx.coordinator.get(record.id).await.unwrap().unwrap();
    assert_eq!(renamed.filename, "summary.pdf");
    assert_eq!(renamed.data, record.data);
    assert_eq!(fx.blobs(), vec!["summary.pdf".to_string()]);
    assert_eq!(fx.blob("summary.pdf"), b"%PDF");
}

#[tokio::test]
async fn test_data_only_update_skips_content_store() {
    let fx = Fixture::new();
    let record = fx.upload("notes.txt", b"notes").await;

    assert!(
        fx.coordinator
            .update(record.id, None, Some(r#"{"tag":"draft"}"#))
            .await
            .unwrap()
    );

    let updated = fx.coordinator.get(record.id).await.unwrap().unwrap();
    assert_eq!(updated.filename, "notes.txt");
    assert_eq!(updated.data, r#"{"tag":"draft"}"#);
    assert_eq!(fx.content.renames.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_update_to_same_name_skips_content_store() {
    let fx = Fixture::new();
    let record = fx.upload("same.txt", b"same").await;

    assert!(fx.coordinator.update(record.id, Some("same"), None).await.unwrap());
    assert!(fx.coordinator.update(record.id, None, None).await.unwrap());

    assert_eq!(fx.coordinator.get(record.id).await.unwrap(), Some(record));
    assert_eq!(fx.content.renames.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let fx = Fixture::new();

    let err = fx
        .coordinator
        .update(FileId(5), Some("whatever"), None)
        .await
        .unwrap_err();

    assert_eq!(err.file_kind(), Some(&FileErrorKind::NotFound(5)));
}

#[tokio::test]
async fn test_rename_onto_existing_name_is_duplicate() {
    let fx = Fixture::new();
    let first = fx.upload("first.txt", b"1").await;
    let second = fx.upload("second.txt", b"2").await;

    let err = fx
        .coordinator
        .update(second.id, Some("first"), None)
        .await
        .unwrap_err();

    assert_eq!(
        err.file_kind(),
        Some(&FileErrorKind::DuplicateName("first.txt".to_string()))
    );
    assert_eq!(
        fx.coordinator.get_all().await.unwrap(),
        vec![first, second]
    );
    assert_eq!(fx.blob("first.txt"), b"1");
    assert_eq!(fx.blob("second.txt"), b"2");
}

#[tokio::test]
async fn test_rename_failure_keeps_old_name() {
    let fx = Fixture::new();
    let record = fx.upload("old.txt", b"old").await;
    fx.content.fail_renames.store(true, Ordering::SeqCst);

    let err = fx
        .coordinator
        .update(record.id, Some("new"), Some(r#"{"x":1}"#))
        .await
        .unwrap_err();

    assert!(matches!(err.file_kind(), Some(FileErrorKind::StorageWrite(_))));
    assert_eq!(fx.coordinator.get(record.id).await.unwrap(), Some(record));
    assert_eq!(fx.blobs(), vec!["old.txt".to_string()]);
}

#[tokio::test]
async fn test_rename_commit_failure_renames_blob_back() {
    let fx = Fixture::new();
    let record = fx.upload("before.txt", b"bytes").await;
    fx.fail_commits.store(true, Ordering::SeqCst);

    assert!(fx.coordinator.update(record.id, Some("after"), None).await.is_err());

    assert_eq!(fx.coordinator.get(record.id).await.unwrap(), Some(record));
    assert_eq!(fx.blobs(), vec!["before.txt".to_string()]);
    assert_eq!(fx.content.renames.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rename_to_invalid_name_is_rejected() {
    let fx = Fixture::new();
    let record = fx.upload("ok.txt", b"ok").await;

    let err = fx
        .coordinator
        .update(record.id, Some("nested/dir"), None)
        .await
        .unwrap_err();

    assert!(matches!(err.file_kind(), Some(FileErrorKind::InvalidName(_))));
    assert_eq!(fx.blobs(), vec!["ok.txt".to_string()]);
}

#[tokio::test]
async fn test_get_all_is_ordered_by_id() {
    let fx = Fixture::new();
    let b = fx.upload("b.txt", b"b").await;
    let a = fx.upload("a.txt", b"a").await;

    let all = fx.coordinator.get_all().await.unwrap();

    assert_eq!(all, vec![b, a]);
    assert!(all[0].id < all[1].id);
}
