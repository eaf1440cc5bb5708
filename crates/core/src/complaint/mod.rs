//! Complaint records and form validation.
//!
//! - `types` - Complaint, Attachment, form input and partial updates
//! - `error` - Validation errors

mod error;
mod types;

#[cfg(test)]
mod ordering_props;

pub use error::ValidationError;
pub use types::{
    Attachment, Complaint, ComplaintForm, ComplaintPatch, NewComplaint, sort_newest_first,
};
