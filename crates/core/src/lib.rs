//! Core complaint board logic for Grievance.
//!
//! This crate contains the sync core with ZERO database dependencies. The
//! document database is reached through the `DocumentBackend` trait, which the
//! db crate implements.
//!
//! # Modules
//!
//! - `complaint` - Complaint records and form validation
//! - `storage` - Object storage through OpenDAL
//! - `attachment` - Attachment uploads and cleanup
//! - `repository` - Remote and local complaint persistence
//! - `sync` - Subscription owner and in-memory complaint list
//! - `lifecycle` - Submit, resolve and delete flows
//! - `notify` - Rendering, notice and confirmation collaborators
//! - `session` - Startup backend selection and teardown

pub mod attachment;
pub mod complaint;
pub mod lifecycle;
pub mod notify;
pub mod repository;
pub mod session;
pub mod storage;
pub mod sync;

pub use session::{Session, SessionSettings};
