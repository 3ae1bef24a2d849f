//! Input Validation
//!
//! Bounds and charset checks applied to every field before it may reach
//! the chain builder. Only [`validate_entry`] produces [`EntryFields`].

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::audit::entry::{Action, EntryFields};
use crate::error::{GalleryLogError, Result};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_ROOM_LEN: usize = 64;

/// Lexical timestamp form stored in the log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("name pattern is valid"))
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$")
            .expect("timestamp pattern is valid")
    })
}

/// Non-empty, at most `max_len` bytes, only `[A-Za-z0-9_-]`.
pub fn is_valid_name(s: &str, max_len: usize) -> bool {
    !s.is_empty() && s.len() <= max_len && name_pattern().is_match(s)
}

pub fn parse_action(s: &str) -> Result<Action> {
    s.parse()
}

/// `YYYY-MM-DDTHH:MM:SSZ` naming a real UTC instant.
pub fn is_valid_timestamp(ts: &str) -> bool {
    timestamp_pattern().is_match(ts) && NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok()
}

/// Validate raw CLI fields into [`EntryFields`].
///
/// Errors name the offending field, never its value.
pub fn validate_entry(actor: &str, action: &str, room: &str, timestamp: &str) -> Result<EntryFields> {
    if !is_valid_name(actor, MAX_NAME_LEN) {
        debug!("Rejected actor field");
        return Err(GalleryLogError::invalid_field("actor"));
    }
    let action = parse_action(action)?;
    if !is_valid_name(room, MAX_ROOM_LEN) {
        debug!("Rejected room field");
        return Err(GalleryLogError::invalid_field("room"));
    }
    if !is_valid_timestamp(timestamp) {
        debug!("Rejected time field");
        return Err(GalleryLogError::invalid_field("time"));
    }

    Ok(EntryFields::new_unchecked(
        actor.to_string(),
        action,
        room.to_string(),
        timestamp.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert!(is_valid_name("guard1", MAX_NAME_LEN));
        assert!(is_valid_name("night_guard-2", MAX_NAME_LEN));
        assert!(is_valid_name(&"A".repeat(64), MAX_NAME_LEN));
        assert!(!is_valid_name(&"A".repeat(65), MAX_NAME_LEN));
        assert!(!is_valid_name(&"A".repeat(300), MAX_NAME_LEN));
        assert!(!is_valid_name("", MAX_NAME_LEN));
    }

    #[test]
    fn test_name_charset() {
        assert!(!is_valid_name("guard 1", MAX_NAME_LEN));
        assert!(!is_valid_name("guard\"1", MAX_NAME_LEN));
        assert!(!is_valid_name("guard\n1", MAX_NAME_LEN));
        assert!(!is_valid_name("gäst", MAX_NAME_LEN));
        assert!(!is_valid_name("a,\"prev\":\"x", MAX_NAME_LEN));
    }

    #[test]
    fn test_actions() {
        assert_eq!(parse_action("enter").unwrap(), Action::Enter);
        assert_eq!(parse_action("exit").unwrap(), Action::Exit);
        assert!(parse_action("dance").is_err());
    }

    #[test]
    fn test_timestamps() {
        assert!(is_valid_timestamp("2025-10-30T12:00:00Z"));
        assert!(!is_valid_timestamp("30-10-2025 12:00"));
        assert!(!is_valid_timestamp("2025-10-30T12:00:00"));
        assert!(!is_valid_timestamp("2025-10-30T12:00:00+00:00"));
        assert!(!is_valid_timestamp("2025-13-30T12:00:00Z"));
        assert!(!is_valid_timestamp("2025-02-30T12:00:00Z"));
    }

    #[test]
    fn test_validate_entry() {
        let fields = validate_entry("guard1", "enter", "GalleryA", "2025-10-30T12:00:00Z").unwrap();
        assert_eq!(fields.actor(), "guard1");
        assert_eq!(fields.action(), Action::Enter);
        assert_eq!(fields.room(), "GalleryA");
        assert_eq!(fields.timestamp(), "2025-10-30T12:00:00Z");

        let err = validate_entry("guard1", "enter", "Gallery A", "2025-10-30T12:00:00Z").unwrap_err();
        assert!(matches!(err, GalleryLogError::ValidationError(_)));
        assert!(err.to_string().contains("room"));
        assert!(!err.to_string().contains("Gallery A"));
    }
}
