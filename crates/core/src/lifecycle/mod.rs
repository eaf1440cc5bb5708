//! Submit, resolve and delete flows across attachments and records.

mod error;
mod service;


pub use error::{DeleteError, DeleteOutcome, SubmitError, UpdateError};
pub use service::ComplaintLifecycle;
