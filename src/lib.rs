pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod query;
pub mod security_events;
pub mod validation;

pub use audit::{GalleryLog, IntegrityKey, LogEntry, VerificationReport};
pub use error::{GalleryLogError, Result};
