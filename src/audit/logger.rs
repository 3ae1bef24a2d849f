//! Gallery Logger
//!
//! Append engine for the chained gallery log. Every append takes an
//! exclusive advisory lock on the store, re-reads the chain tip from disk,
//! builds the next line and writes it in one piece with fsync before the
//! lock is released.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::audit::codec;
use crate::audit::entry::{build_next, EntryFields, LogEntry, GENESIS};
use crate::audit::mac::IntegrityKey;
use crate::error::{GalleryLogError, Result};

/// Scoped advisory lock on the store file, released on drop.
struct StoreLock<'a> {
    file: &'a File,
}

impl<'a> StoreLock<'a> {
    fn exclusive(file: &'a File) -> Result<Self> {
        FileExt::lock_exclusive(file).map_err(GalleryLogError::lock_failed)?;
        Ok(Self { file })
    }

    fn shared(file: &'a File) -> Result<Self> {
        FileExt::lock_shared(file).map_err(GalleryLogError::lock_failed)?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.file) {
            warn!("Failed to release log store lock: {}", e);
        }
    }
}

/// Append-only, hash-chained gallery log stored as a text file.
///
/// Holds no in-memory chain state; the tip is always read back from disk.
#[derive(Debug, Clone)]
pub struct GalleryLog {
    log_path: PathBuf,
}

impl GalleryLog {
    /// Create a handle for the store at `log_path`. The file is created on
    /// first append.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Append a new chained entry.
    ///
    /// Either the whole line reaches stable storage or the store is left
    /// byte-for-byte as it was.
    pub fn append(&self, fields: &EntryFields, key: &IntegrityKey) -> Result<LogEntry> {
        self.append_with(fields, key, write_line)
    }

    fn append_with<W>(&self, fields: &EntryFields, key: &IntegrityKey, write: W) -> Result<LogEntry>
    where
        W: Fn(&File, &[u8]) -> io::Result<()>,
    {
        let file = self.open_for_append()?;
        let _lock = StoreLock::exclusive(&file)?;

        let original_len = file.metadata()?.len();
        let prev = read_tip(&file)?;
        let chained = build_next(fields, &prev, key)?;

        if let Err(e) = write(&file, chained.line.as_bytes()) {
            error!("Failed to write log entry, rolling back: {}", e);
            rollback(&file, original_len);
            return Err(GalleryLogError::write_failed(e));
        }

        let entry = chained.to_entry(fields, &prev);
        debug!("Appended log entry: {}", entry.summary());
        Ok(entry)
    }

    /// Digest of the last stored entry, or [`GENESIS`] for an empty store.
    pub fn last_digest(&self) -> Result<String> {
        let file = match self.open_for_read()? {
            Some(file) => file,
            None => return Ok(GENESIS.to_string()),
        };
        let _lock = StoreLock::shared(&file)?;
        read_tip(&file)
    }

    /// All stored lines in append order, one per `\n`-terminated record.
    ///
    /// Lines are returned as stored: blank lines, carriage returns and
    /// invalid UTF-8 (replaced with U+FFFD) are left for the verifier to
    /// reject at their index. A missing store reads as empty.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        let file = match self.open_for_read()? {
            Some(file) => file,
            None => return Ok(Vec::new()),
        };
        let _lock = StoreLock::shared(&file)?;
        let contents = read_all(&file)?;

        let lines: Vec<String> = split_records(&contents)
            .into_iter()
            .enumerate()
            .map(|(index, record)| match std::str::from_utf8(record) {
                Ok(line) => line.to_string(),
                Err(_) => {
                    warn!("Log line {} is not valid UTF-8", index + 1);
                    String::from_utf8_lossy(record).into_owned()
                }
            })
            .collect();

        info!("Loaded {} log lines from {:?}", lines.len(), self.log_path);
        Ok(lines)
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GalleryLogError::StorageError(format!("Failed to create log directory: {}", e))
                })?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true).read(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(&self.log_path).map_err(|e| {
            GalleryLogError::StorageError(format!("Failed to open log file: {}", e))
        })
    }

    fn open_for_read(&self) -> Result<Option<File>> {
        match File::open(&self.log_path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GalleryLogError::StorageError(format!(
                "Failed to open log file: {}",
                e
            ))),
        }
    }
}

fn read_all(mut file: &File) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Split raw store contents into records. Only the terminator of the last
/// record is dropped; every other segment, empty or not, is a record.
fn split_records(contents: &[u8]) -> Vec<&[u8]> {
    if contents.is_empty() {
        return Vec::new();
    }
    let body = contents.strip_suffix(b"\n").unwrap_or(contents);
    body.split(|&b| b == b'\n').collect()
}

/// Read the digest of the last stored line. Caller holds the lock.
fn read_tip(file: &File) -> Result<String> {
    let contents = read_all(file)?;

    if contents.is_empty() {
        return Ok(GENESIS.to_string());
    }
    if !contents.ends_with(b"\n") {
        return Err(GalleryLogError::StorageError(
            "Log store ends with an unterminated line".to_string(),
        ));
    }

    split_records(&contents)
        .last()
        .and_then(|record| std::str::from_utf8(record).ok())
        .filter(|line| codec::is_record_text(line))
        .and_then(|line| codec::extract_field(line, codec::FIELD_DIGEST))
        .map(str::to_string)
        .ok_or_else(|| {
            GalleryLogError::StorageError(
                "Last log entry has no digest; refusing to extend the chain".to_string(),
            )
        })
}

/// Write one fully buffered line and force it to disk.
fn write_line(mut file: &File, line: &[u8]) -> io::Result<()> {
    file.write_all(line)?;
    file.sync_all()
}

fn rollback(file: &File, len: u64) {
    if let Err(e) = file.set_len(len).and_then(|_| file.sync_all()) {
        error!("Failed to roll back partial log write: {}", e);
    }
}
