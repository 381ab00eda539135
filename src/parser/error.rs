//! Error types for link collection and identifier extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading share links.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No known share-link pattern matched the URL.
    #[error("no file identifier found in '{url}'\n  Suggestion: {suggestion}")]
    NoFileId {
        /// The URL that did not match any pattern
        url: String,
        /// How to fix the issue
        suggestion: &'static str,
    },

    /// The input document could not be read.
    #[error("failed to read links from {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Creates a `NoFileId` error for a URL no pattern recognised.
    #[must_use]
    pub fn no_file_id(url: &str) -> Self {
        Self::NoFileId {
            url: url.to_string(),
            suggestion: "Use a /file/d/<id>, uc?id=<id> or open?id=<id> share link",
        }
    }

    /// Creates an IO error for the input document.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
