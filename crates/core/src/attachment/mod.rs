//! Attachment upload and cleanup for complaints.
//!
//! - `types` - Files picked by the resident and batch upload results
//! - `store` - Uploads and deletes blobs through the storage service
//! - `error` - Per-file upload and delete failures

mod error;
mod store;
mod types;

pub use error::{DeleteError, UploadError};
pub use store::AttachmentStore;
pub use types::{FileSelection, PendingFile, UploadBatch};
