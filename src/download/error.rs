//! Error types for the download module.
//!
//! [`DownloadError`] covers one file transfer. [`TaskError`] is what a single
//! batch item can fail with, and [`EngineError`] is reserved for failures that
//! stop a batch before any item runs.

use std::path::PathBuf;

use thiserror::Error;

use super::constants::MAX_CHUNK_SIZE;
use crate::parser::ParseError;

/// Errors that can occur while transferring one file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (stat, delete, create, write).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL: {url}")]
    InvalidEndpoint {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>) -> Self {
        Self::InvalidEndpoint { url: url.into() }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs a
// url or path the source error does not carry.

/// Why a single batch item failed.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The link did not contain a file identifier.
    #[error(transparent)]
    Extraction(#[from] ParseError),

    /// The transfer itself failed.
    #[error(transparent)]
    Transfer(#[from] DownloadError),

    /// The admission gate was closed before a slot was granted.
    #[error("admission gate closed before the download could start")]
    GateClosed,

    /// The task panicked before producing a result.
    #[error("download task panicked: {0}")]
    Panicked(String),
}

/// Errors that prevent a batch from running at all.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error("invalid concurrency value {value}: must be between 1 and 100")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Invalid chunk size provided.
    #[error("invalid chunk size {value}: must be between 1 and {MAX_CHUNK_SIZE} bytes")]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The destination directory could not be created.
    #[error("failed to create destination directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
