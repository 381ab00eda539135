//! Skip/restart decision for destination files that already exist.
//!
//! A file whose on-disk size equals the server-reported size is treated as
//! complete. Anything else is deleted and fetched again from byte 0. Size
//! equality is the only completeness proof: a truncated file that happens to
//! match the reported length is misclassified as complete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::DownloadError;

/// What is on disk at the destination path right before a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileState {
    /// Destination path.
    pub path: PathBuf,
    /// Size of the existing file, `None` when nothing is there.
    pub existing_size: Option<u64>,
}

impl LocalFileState {
    /// Reads the current state of `path`. Never cached.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if metadata fails for a reason other
    /// than the file not existing.
    pub async fn read(path: &Path) -> Result<Self, DownloadError> {
        let existing_size = match tokio::fs::metadata(path).await {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(DownloadError::io(path, e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            existing_size,
        })
    }

    /// Decides what to do given the expected total size (0 when unknown).
    #[must_use]
    pub fn decide(&self, expected_size: u64) -> ResumeDecision {
        match self.existing_size {
            None => ResumeDecision::Fresh,
            Some(found) if found == expected_size => ResumeDecision::Skip,
            Some(found) => ResumeDecision::Restart {
                expected: expected_size,
                found,
            },
        }
    }
}

/// Outcome of the resumability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    /// Nothing on disk, download normally.
    Fresh,
    /// Existing file matches the expected size, do not transfer.
    Skip,
    /// Existing file has the wrong size, delete it and download from scratch.
    Restart {
        /// Size reported by the server.
        expected: u64,
        /// Size found on disk.
        found: u64,
    },
}

/// Removes a stale partial file ahead of a restart.
pub(crate) async fn discard_stale(path: &Path) -> Result<(), DownloadError> {
    debug!(path = %path.display(), "removing stale file");
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}
