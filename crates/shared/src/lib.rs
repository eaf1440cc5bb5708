//! Shared types, errors, and configuration for Grievance.
//!
//! This crate provides common types used across all other crates:
//! - Opaque complaint identifiers
//! - Notice severities for the notification sink
//! - Startup error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
