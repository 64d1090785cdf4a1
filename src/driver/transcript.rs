//! Diagnostic capture files for a wallet session.
//!
//! Two append-only artifacts survive every session: the child's raw stderr,
//! and a transcript of every command written and every chunk read back. The
//! transcript is the primary artifact to inspect when a test fails, so each
//! record is flushed as soon as it is written.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prefix written before each command in the transcript, so writes are
/// distinguishable from the raw response bytes that follow.
const WRITE_PREFIX: &[u8] = b"writing command: ";

/// Create the persistent stderr capture file for a wallet child.
///
/// The file is kept after the session ends.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created in `dir`.
pub fn stderr_sink(dir: &Path) -> std::io::Result<(File, PathBuf)> {
    keep_temp_file(dir, "wallet_stderr_")
}

/// Transcript of every write/read transaction on one session.
#[derive(Debug)]
pub struct Transcript {
    file: File,
    path: PathBuf,
}

impl Transcript {
    /// Create a persistent transcript file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create_in(dir: &Path) -> std::io::Result<Self> {
        let (file, path) = keep_temp_file(dir, "wallet_commands_responses_")?;
        Ok(Self { file, path })
    }

    /// Record a command line written to the child.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the transcript cannot be written.
    pub fn record_write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(WRITE_PREFIX)?;
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    /// Record a chunk of response bytes read from the child.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the transcript cannot be written.
    pub fn record_read(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    /// Record a driver-side annotation, e.g. a read timeout.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the transcript cannot be written.
    pub fn annotate(&mut self, note: &str) -> std::io::Result<()> {
        self.file.write_all(note.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()
    }

    /// Path of the transcript file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a named temp file in `dir` that is kept on drop.
fn keep_temp_file(dir: &Path, prefix: &str) -> std::io::Result<(File, PathBuf)> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempfile_in(dir)?
        .keep()
        .map_err(|err| err.error)
}
