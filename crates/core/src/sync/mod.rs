//! Keeps the in-memory complaint list in step with the repository.

mod controller;
mod error;
mod set;

pub use controller::SyncController;
pub use error::SyncError;
pub use set::ComplaintSet;
