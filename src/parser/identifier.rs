//! File identifier extraction from share links.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Share-link shapes, tried in order. The first capture group is the identifier.
#[allow(clippy::expect_used)]
static FILE_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"https?://drive\.google\.com/file/d/([a-zA-Z0-9_-]+)/?")
            .expect("path-style pattern is valid"),
        Regex::new(r"https?://drive\.google\.com/uc\?id=([a-zA-Z0-9_-]+)")
            .expect("uc?id pattern is valid"),
        Regex::new(r"https?://drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)")
            .expect("open?id pattern is valid"),
    ]
});

/// Opaque token naming a file on the host service.
///
/// Only ASCII alphanumerics, `_` and `-` are allowed, so an identifier is
/// always safe to use as a bare filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    /// Wraps a token, rejecting anything outside the identifier alphabet.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let valid = !token.is_empty()
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        valid.then_some(Self(token))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the file identifier embedded in a share link.
///
/// Returns `None` when no known pattern matches; that is a "not this service"
/// signal, not an error.
///
/// # Examples
///
/// ```
/// use drive_downloader::parser::extract_file_id;
///
/// let id = extract_file_id("https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing");
/// assert_eq!(id.unwrap().as_str(), "1AbC_d-9");
/// assert!(extract_file_id("https://example.com/file.pdf").is_none());
/// ```
#[must_use]
pub fn extract_file_id(url: &str) -> Option<FileId> {
    let id = FILE_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .and_then(|m| FileId::new(m.as_str()));
    trace!(url, id = ?id, "file id extraction");
    id
}
