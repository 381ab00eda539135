//! User-Agent string for download requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/drive-downloader";

/// Default User-Agent for download requests (identifies the tool).
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("drive-downloader/{version} (bulk-fetch; +{PROJECT_UA_URL})")
}
