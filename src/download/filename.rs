//! Destination filename resolution.
//!
//! The name comes from the `Content-Disposition` response header when it
//! carries one, otherwise the file identifier itself is used.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::FileId;

#[allow(clippy::expect_used)]
static QUOTED_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="(.+?)""#).expect("filename regex is valid"));

/// Picks the on-disk filename for a response.
///
/// Falls back to the identifier when the header is absent, carries no
/// filename, or the filename sanitizes to nothing usable.
#[must_use]
pub(crate) fn resolve_filename(content_disposition: Option<&str>, file_id: &FileId) -> String {
    content_disposition
        .and_then(parse_content_disposition)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.trim_matches('_').is_empty())
        .unwrap_or_else(|| file_id.to_string())
}

/// Parses Content-Disposition header to extract filename.
///
/// Tried in order:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename*=UTF-8''example.pdf` (RFC 5987)
/// - `attachment; filename=example.pdf`
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(captures) = QUOTED_FILENAME.captures(header)
        && let Some(name) = captures.get(1)
    {
        return Some(name.as_str().to_string());
    }

    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // Format: charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + 9..].trim();
        if !value.starts_with('"') {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters. Names that would resolve to
/// a relative or absolute path component have their dots rewritten.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
