//! Gallery Log
//!
//! Tamper-evident, append-only access log. Every entry carries an
//! HMAC-SHA256 digest over its content and the digest of the entry before
//! it, so edits, deletions and reordering are caught on verification.

pub mod codec;
pub mod entry;
pub mod logger;
pub mod mac;
pub mod verify;

pub use entry::{build_next, Action, ChainedLine, EntryFields, LogEntry, GENESIS};
pub use logger::GalleryLog;
pub use mac::{constant_time_eq, IntegrityKey};
pub use verify::{
    load_verified, parse_entries, verify, verify_lines, verify_log_file, IntegrityViolation,
    VerificationReport, ViolationReason,
};
