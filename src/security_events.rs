//! Security Event Trail
//!
//! Best-effort record of security-relevant events (rejected tokens, bad
//! input, failed writes). Lines look like
//! `2025-11-05T18:20:00Z logappend INVALID_TOKEN`. Recording never fails
//! the operation that triggered it.

use chrono::Utc;
use fs2::FileExt;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::validation::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    InvalidToken,
    InvalidInput,
    WriteFail,
    IntegrityFail,
    Exception,
}

impl SecurityEvent {
    pub fn code(&self) -> &'static str {
        match self {
            SecurityEvent::InvalidToken => "INVALID_TOKEN",
            SecurityEvent::InvalidInput => "INVALID_INPUT",
            SecurityEvent::WriteFail => "WRITE_FAIL",
            SecurityEvent::IntegrityFail => "INTEGRITY_FAIL",
            SecurityEvent::Exception => "EXCEPTION",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone)]
pub struct SecurityAuditor {
    path: PathBuf,
}

impl SecurityAuditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one event line. Failures are logged and dropped.
    pub fn record(&self, tool: &str, event: SecurityEvent) {
        match self.try_record(tool, event) {
            Ok(()) => debug!("Recorded security event {} for {}", event, tool),
            Err(e) => warn!("Security event sink unavailable: {}", e),
        }
    }

    fn try_record(&self, tool: &str, event: SecurityEvent) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        let line = format!(
            "{} {} {}\n",
            Utc::now().format(TIMESTAMP_FORMAT),
            tool,
            event.code()
        );

        FileExt::lock_exclusive(&file)?;
        let written = file.write_all(line.as_bytes()).and_then(|_| file.sync_all());
        let unlocked = FileExt::unlock(&file);
        written.and(unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_appends_event_lines() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("audit.log");
        let auditor = SecurityAuditor::new(&path);

        auditor.record("logappend", SecurityEvent::InvalidToken);
        auditor.record("logread", SecurityEvent::IntegrityFail);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" logappend INVALID_TOKEN"));
        assert!(lines[1].ends_with(" logread INTEGRITY_FAIL"));
        assert!(lines[0].contains('T') && lines[0].split(' ').next().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_unavailable_sink_does_not_panic() {
        let temp_dir = tempdir().unwrap();
        let auditor = SecurityAuditor::new(temp_dir.path().join("missing/dir/audit.log"));
        auditor.record("logappend", SecurityEvent::WriteFail);
    }
}
