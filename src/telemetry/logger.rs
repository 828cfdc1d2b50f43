//! # Session Log Writer
//!
//! Streams one session's records to disk as a single JSON array.
//!
//! A session file goes through three states:
//!
//! 1. absent
//! 2. open: `[` followed by comma-separated records, no closing bracket
//! 3. sealed: `]` appended, the file is valid JSON and is never reopened
//!
//! Records are appended one at a time and flushed immediately, so memory use
//! does not grow with the session. A crash leaves an unterminated array
//! behind; readers have to tolerate that.
//!
//! A failed append abandons the file the same way: it is dropped without a
//! seal, since a partial record may already be on disk, and the next append
//! starts a new file.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::Result;

use super::extractor::precision_timestamp;

/// Extension of every session log
pub const LOG_FILE_EXTENSION: &str = "json";

/// The currently open session file
#[derive(Debug)]
struct OpenLog {
    path: PathBuf,
    file: File,
}

/// Append-only JSON array writer, one file per session
#[derive(Debug)]
pub struct SessionLog {
    log_dir: PathBuf,
    current: Option<OpenLog>,
    /// Next record is the first one in the current file
    fresh: bool,
    records_written: u64,
}

impl SessionLog {
    /// Create a writer for `log_dir`; nothing touches the disk until `open`
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            current: None,
            fresh: true,
            records_written: 0,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the open file, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|log| log.path.as_path())
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Records appended to the open file so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Open a new session file named after the current epoch milliseconds
    ///
    /// Creates the log directory if needed. If a file is already open it is
    /// sealed first. If `{ms}.json` already exists the next free millisecond
    /// is used instead, so a sealed file is never reopened.
    ///
    /// # Returns
    ///
    /// * `Result<PathBuf>` - Path of the newly opened file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or file cannot be created
    pub async fn open(&mut self) -> Result<PathBuf> {
        self.close().await?;

        fs::create_dir_all(&self.log_dir).await?;

        let mut millis = epoch_millis();
        let (path, mut file) = loop {
            let path = self.file_path(millis);
            match OpenOptions::new().append(true).create_new(true).open(&path).await {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("{} already exists, trying next millisecond", path.display());
                    millis += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        file.write_all(b"[").await?;
        file.flush().await?;

        info!("Opened session log {}", path.display());
        self.current = Some(OpenLog { path: path.clone(), file });
        self.fresh = true;
        self.records_written = 0;

        Ok(path)
    }

    /// Append one record, opening a file first if none is open
    ///
    /// The first record of a file is written bare, every later one with a
    /// leading comma.
    pub async fn append<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let json = serde_json::to_string(record)?;

        if self.current.is_none() {
            self.open().await?;
        }

        let mut chunk = String::with_capacity(json.len() + 1);
        if !self.fresh {
            chunk.push(',');
        }
        chunk.push_str(&json);

        if let Some(log) = self.current.as_mut() {
            if let Err(e) = write_chunk(&mut log.file, chunk.as_bytes()).await {
                self.abandon();
                return Err(e.into());
            }
        }

        self.fresh = false;
        self.records_written += 1;
        Ok(())
    }

    /// Seal the open file with `]`
    ///
    /// Does nothing when no file is open, so it is safe to call repeatedly.
    ///
    /// # Returns
    ///
    /// * `Result<Option<PathBuf>>` - Path of the sealed file, `None` if nothing was open
    pub async fn close(&mut self) -> Result<Option<PathBuf>> {
        let Some(mut log) = self.current.take() else {
            return Ok(None);
        };

        log.file.write_all(b"]").await?;
        log.file.flush().await?;
        log.file.sync_all().await?;

        info!(
            "Sealed session log {} ({} records)",
            log.path.display(),
            self.records_written
        );
        self.fresh = true;

        Ok(Some(log.path))
    }

    /// Drop the open file without sealing it
    fn abandon(&mut self) {
        if let Some(log) = self.current.take() {
            warn!("Abandoning session log {} after a failed write", log.path.display());
        }
        self.fresh = true;
    }

    fn file_path(&self, millis: u64) -> PathBuf {
        self.log_dir.join(format!("{}.{}", millis, LOG_FILE_EXTENSION))
    }
}

/// Current epoch milliseconds, rounded to the nearest millisecond
fn epoch_millis() -> u64 {
    precision_timestamp().round() as u64
}

async fn write_chunk(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}
