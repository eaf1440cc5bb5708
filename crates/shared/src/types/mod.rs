//! Common types used across the application.

pub mod id;
pub mod notice;

pub use id::ComplaintId;
pub use notice::NoticeLevel;
