//! Record Codec
//!
//! Line-oriented encoding of log entries. Each stored line is a flat,
//! single-line record with six fields in a fixed order:
//!
//! ```text
//! {"actor":"guard1","action":"enter","room":"GalleryA","time":"2025-10-30T12:00:00Z","prev":"GENESIS","digest":"<hex>"}
//! ```
//!
//! Field names and order are part of the on-disk format; changing them
//! breaks verification of existing stores. The tag is stored under
//! `digest`, so stores whose tag field is named `hmac` do not verify here.

use crate::audit::entry::LogEntry;

pub const FIELD_ACTOR: &str = "actor";
pub const FIELD_ACTION: &str = "action";
pub const FIELD_ROOM: &str = "room";
pub const FIELD_TIME: &str = "time";
pub const FIELD_PREV: &str = "prev";
pub const FIELD_DIGEST: &str = "digest";

/// Canonical unsigned payload: everything the digest covers.
pub fn serialize_unsigned(
    actor: &str,
    action: &str,
    room: &str,
    timestamp: &str,
    prev: &str,
) -> String {
    format!(
        "{{\"{}\":\"{}\",\"{}\":\"{}\",\"{}\":\"{}\",\"{}\":\"{}\",\"{}\":\"{}\"",
        FIELD_ACTOR,
        actor,
        FIELD_ACTION,
        action,
        FIELD_ROOM,
        room,
        FIELD_TIME,
        timestamp,
        FIELD_PREV,
        prev
    )
}

/// Close an unsigned payload with its digest and a line terminator.
pub fn finalize(unsigned: &str, digest_hex: &str) -> String {
    format!("{},\"{}\":\"{}\"}}\n", unsigned, FIELD_DIGEST, digest_hex)
}

/// Locate `"name":"value"` in `line` and return `value`.
///
/// Returns `None` when the key is missing, the value is unterminated
/// or the value is empty. Never panics on malformed input.
pub fn extract_field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("\"{}\":\"", name);
    let start = line.find(&needle)? + needle.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Whether `line` has the character set of a stored record: non-empty and
/// printable ASCII only, with no whitespace or control bytes.
pub fn is_record_text(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_graphic())
}

/// Extract all six fields of a stored line.
pub fn parse_line(line: &str) -> Option<LogEntry> {
    Some(LogEntry {
        actor: extract_field(line, FIELD_ACTOR)?.to_string(),
        action: extract_field(line, FIELD_ACTION)?.to_string(),
        room: extract_field(line, FIELD_ROOM)?.to_string(),
        timestamp: extract_field(line, FIELD_TIME)?.to_string(),
        prev: extract_field(line, FIELD_PREV)?.to_string(),
        digest: extract_field(line, FIELD_DIGEST)?.to_string(),
    })
}
