//! Link collection from local documents.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::error::ParseError;

/// Scheme prefix followed by any run of non-whitespace.
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("link regex is valid"));

/// Finds every `http(s)://` link in `text`, line by line, in encounter order.
///
/// Duplicates are kept. No validation beyond the scheme prefix is done.
///
/// # Examples
///
/// ```
/// use drive_downloader::parser::extract_links;
///
/// let links = extract_links("see http://a.example/x and https://b.example/y");
/// assert_eq!(links, ["http://a.example/x", "https://b.example/y"]);
/// ```
#[must_use]
pub fn extract_links(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| LINK_PATTERN.find_iter(line))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Reads a document and returns every link it contains.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read as UTF-8 text.
#[instrument(fields(path = %path.display()))]
pub fn collect_links(path: &Path) -> Result<Vec<String>, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    let links = extract_links(&text);
    debug!(count = links.len(), "collected links");
    Ok(links)
}

/// Keeps only links containing `host` as a substring.
#[must_use]
pub fn filter_by_host(links: Vec<String>, host: &str) -> Vec<String> {
    links.into_iter().filter(|link| link.contains(host)).collect()
}
