//! File coordinator for Tandem.
//!
//! Every stored file exists twice: as a record in a transactional
//! [`RecordStore`](tandem_interface::RecordStore) and as a blob in a
//! [`ContentStore`](tandem_interface::ContentStore). [`FileCoordinator`] is the
//! only component that mutates both, and it does so so that each operation
//! either lands in both stores or in neither.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tandem_coordinator::{FileCoordinator, InMemoryRecordStore};
//! use tandem_interface::Upload;
//! use tandem_storage::FileSystemStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::TempDir::new()?;
//! let coordinator = FileCoordinator::new(
//!     Arc::new(InMemoryRecordStore::new()),
//!     Arc::new(FileSystemStorage::open(dir.path())?),
//! );
//!
//! let upload = Upload::from_bytes("IMG_0042.PNG", "image/png", vec![0x89, 0x50]);
//! let record = coordinator.upload(upload, Some("cover"), None).await?;
//! assert_eq!(record.filename, "cover.png");
//!
//! coordinator.update(record.id, Some("banner"), None).await?;
//! coordinator.delete(record.id).await?;
//! assert!(coordinator.get_all().await?.is_empty());
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod in_memory;
mod locks;

pub use coordinator::FileCoordinator;
pub use in_memory::InMemoryRecordStore;
pub use locks::{NameGuard, NameLocks};
