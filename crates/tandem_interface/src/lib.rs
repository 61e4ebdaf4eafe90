//! Trait definitions for the two stores behind the Tandem file coordinator.
//!
//! - [`RecordStore`] / [`RecordTransaction`]: transactional metadata persistence
//! - [`ContentStore`]: named blob persistence
//! - [`Upload`]: an inbound byte stream with its reported name and content type

mod content;
mod record;
mod upload;

pub use content::ContentStore;
pub use record::{RecordStore, RecordTransaction};
pub use upload::{ByteSource, Upload};
