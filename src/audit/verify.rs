//! Gallery Log Verification
//!
//! Replays the chain from genesis. Each line must link to the previously
//! validated digest and carry a digest that matches the recomputed MAC of
//! its own content. Verification stops at the first violation.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::audit::codec::{
    self, FIELD_ACTION, FIELD_ACTOR, FIELD_DIGEST, FIELD_PREV, FIELD_ROOM, FIELD_TIME,
};
use crate::audit::entry::{LogEntry, GENESIS};
use crate::audit::logger::GalleryLog;
use crate::audit::mac::{self, IntegrityKey};
use crate::error::{GalleryLogError, Result};

/// Why a line failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// No extractable digest field.
    MissingDigest,
    /// No extractable prev field.
    MissingPrev,
    /// A content field is missing, or the line carries unauthenticated text.
    Malformed,
    /// `prev` does not match the previous entry's digest.
    ChainBreak,
    /// Stored digest does not match the recomputed MAC.
    DigestMismatch,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ViolationReason::MissingDigest => "missing digest",
            ViolationReason::MissingPrev => "missing prev link",
            ViolationReason::Malformed => "malformed entry",
            ViolationReason::ChainBreak => "chain break",
            ViolationReason::DigestMismatch => "digest mismatch",
        };
        f.write_str(text)
    }
}

/// First failing line, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub index: usize,
    pub reason: ViolationReason,
}

/// Verification result with detailed information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub entry_count: usize,
    pub verified: usize,
    pub failure: Option<IntegrityViolation>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }

    /// Convert a failed report into [`GalleryLogError::IntegrityError`].
    pub fn into_result(self) -> Result<Self> {
        match self.failure {
            None => Ok(self),
            Some(violation) => Err(GalleryLogError::IntegrityError {
                index: violation.index,
                reason: violation.reason,
            }),
        }
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!("Log integrity OK ({} entries)", self.entry_count),
            Some(v) => format!(
                "Log integrity FAILED at entry {} of {}: {}",
                v.index + 1,
                self.entry_count,
                v.reason
            ),
        }
    }
}

/// Check one line against the expected link. Returns the validated digest.
fn check_line<'a>(
    line: &'a str,
    expected_prev: &str,
    key: &IntegrityKey,
) -> std::result::Result<&'a str, ViolationReason> {
    if !codec::is_record_text(line) {
        return Err(ViolationReason::Malformed);
    }

    let stored_digest =
        codec::extract_field(line, FIELD_DIGEST).ok_or(ViolationReason::MissingDigest)?;
    let prev = codec::extract_field(line, FIELD_PREV).ok_or(ViolationReason::MissingPrev)?;

    if prev != expected_prev {
        return Err(ViolationReason::ChainBreak);
    }

    let field = |name: &str| codec::extract_field(line, name).ok_or(ViolationReason::Malformed);
    let unsigned = codec::serialize_unsigned(
        field(FIELD_ACTOR)?,
        field(FIELD_ACTION)?,
        field(FIELD_ROOM)?,
        field(FIELD_TIME)?,
        prev,
    );

    // A failing MAC primitive cannot vouch for the line.
    let recomputed =
        mac::mac_hex(key, unsigned.as_bytes()).map_err(|_| ViolationReason::DigestMismatch)?;

    if !mac::constant_time_eq(recomputed.as_bytes(), stored_digest.as_bytes()) {
        return Err(ViolationReason::DigestMismatch);
    }

    // Nothing may sit outside the authenticated fields.
    let canonical = codec::finalize(&unsigned, stored_digest);
    if line != canonical.trim_end_matches('\n') {
        return Err(ViolationReason::Malformed);
    }
    Ok(stored_digest)
}

/// Verify a sequence of stored lines against `key`.
///
/// An empty sequence is valid.
pub fn verify_lines<S: AsRef<str>>(lines: &[S], key: &IntegrityKey) -> VerificationReport {
    let mut expected_prev = GENESIS;
    let mut failure = None;

    for (index, line) in lines.iter().enumerate() {
        match check_line(line.as_ref(), expected_prev, key) {
            Ok(digest) => expected_prev = digest,
            Err(reason) => {
                warn!("Log verification failed at entry {}: {}", index, reason);
                failure = Some(IntegrityViolation { index, reason });
                break;
            }
        }
    }

    let verified = match failure {
        Some(violation) => violation.index,
        None => {
            debug!("Log verification successful: {} entries", lines.len());
            lines.len()
        }
    };

    VerificationReport {
        entry_count: lines.len(),
        verified,
        failure,
    }
}

/// Boolean form of [`verify_lines`].
pub fn verify<S: AsRef<str>>(lines: &[S], key: &IntegrityKey) -> bool {
    verify_lines(lines, key).is_valid()
}

/// Verify the store at `path`.
pub fn verify_log_file(path: impl AsRef<Path>, key: &IntegrityKey) -> Result<VerificationReport> {
    let path = path.as_ref();
    info!("Verifying gallery log file: {:?}", path);

    let lines = GalleryLog::new(path).read_lines()?;
    Ok(verify_lines(&lines, key))
}

/// Read the store, verify it and return the parsed entries.
///
/// Fails with [`GalleryLogError::IntegrityError`] unless the whole chain
/// verifies, so callers never aggregate over untrusted records.
pub fn load_verified(log: &GalleryLog, key: &IntegrityKey) -> Result<Vec<LogEntry>> {
    let lines = log.read_lines()?;
    verify_lines(&lines, key).into_result()?;
    parse_entries(&lines)
}

/// Parse already verified lines. A line that does not parse is reported
/// as [`ViolationReason::Malformed`] at its index, never skipped.
pub fn parse_entries<S: AsRef<str>>(lines: &[S]) -> Result<Vec<LogEntry>> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            codec::parse_line(line.as_ref()).ok_or(GalleryLogError::IntegrityError {
                index,
                reason: ViolationReason::Malformed,
            })
        })
        .collect()
}
