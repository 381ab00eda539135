//! Single-file downloader for the host service.
//!
//! This module provides the [`DriveClient`] which fetches one file by its
//! identifier, decides whether an existing copy can be kept, and streams the
//! body to disk in fixed-size chunks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONFIRM_TOKEN, DEFAULT_ENDPOINT};
use super::error::DownloadError;
use super::filename::resolve_filename;
use super::progress::{NoProgress, TransferProgress, TransferTracker};
use super::resume::{LocalFileState, ResumeDecision, discard_stale};
use crate::parser::FileId;
use crate::user_agent;

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedFile {
    /// The body was streamed to disk.
    Downloaded {
        /// Final output path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A file of the expected size was already present; nothing was transferred.
    AlreadyComplete {
        /// Existing file path.
        path: PathBuf,
    },
}

impl FetchedFile {
    /// Path of the file on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::AlreadyComplete { path } => path,
        }
    }
}

/// Fetches one file into a directory.
///
/// [`DriveClient`] is the production implementation; the bulk orchestrator
/// only depends on this trait so tests can substitute a fake transport.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Downloads `file_id` into `dest_dir`, writing `chunk_size` bytes per call.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network, HTTP status, or filesystem failure.
    async fn fetch(
        &self,
        file_id: &FileId,
        dest_dir: &Path,
        chunk_size: usize,
        progress: &dyn TransferProgress,
    ) -> Result<FetchedFile, DownloadError>;
}

/// HTTP client for the host service's download endpoint.
///
/// Created once and shared by every task of a batch so connections are pooled.
///
/// # Example
///
/// ```no_run
/// use drive_downloader::download::DriveClient;
/// use drive_downloader::parser::extract_file_id;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DriveClient::new();
/// let id = extract_file_id("https://drive.google.com/file/d/abc123/view").unwrap();
/// let path = client.download(&id, Path::new("./downloads"), 512).await?;
/// println!("Downloaded to: {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    endpoint: Url,
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveClient {
    /// Creates a client for the default endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL")
    }

    /// Creates a client for a custom endpoint (mirrors, test servers).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute http(s) URL.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration.
    #[allow(clippy::expect_used)]
    pub fn with_endpoint(endpoint: &str) -> Result<Self, DownloadError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| DownloadError::invalid_endpoint(endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_endpoint(endpoint.as_str()));
        }

        let client = Client::builder()
            .user_agent(user_agent::default_download_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");

        Ok(Self { client, endpoint })
    }

    /// Builds the request URL: the endpoint plus `id` and `confirm` parameters.
    ///
    /// `confirm=t` bypasses the virus-scan interstitial page the host serves
    /// instead of the file for anything above its scan-size threshold.
    #[must_use]
    pub fn download_url(&self, file_id: &FileId) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("id", file_id.as_str())
            .append_pair("confirm", CONFIRM_TOKEN);
        url
    }

    /// Downloads a file without progress reporting and returns its path.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (DNS, connection refused, TLS, dropped connection)
    /// - The server returns a non-success status
    /// - Reading, deleting, or writing the destination file fails
    #[must_use = "download result contains the path to the downloaded file"]
    pub async fn download(
        &self,
        file_id: &FileId,
        dest_dir: &Path,
        chunk_size: usize,
    ) -> Result<PathBuf, DownloadError> {
        let fetched = self.fetch(file_id, dest_dir, chunk_size, &NoProgress).await?;
        Ok(fetched.path().to_path_buf())
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl FileFetcher for DriveClient {
    #[instrument(skip(self, dest_dir, progress), fields(file_id = %file_id))]
    async fn fetch(
        &self,
        file_id: &FileId,
        dest_dir: &Path,
        chunk_size: usize,
        progress: &dyn TransferProgress,
    ) -> Result<FetchedFile, DownloadError> {
        let url = self.download_url(file_id);
        debug!(url = %url, "requesting file");

        let response = self.send(&url).await?;

        // Header bytes may be raw UTF-8; decode lossily.
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        debug!(content_disposition = ?content_disposition, "response headers");
        let filename = resolve_filename(content_disposition.as_deref(), file_id);
        let file_path = dest_dir.join(&filename);

        // Missing length means "unknown" and is compared as 0.
        let expected_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let local = LocalFileState::read(&file_path).await?;
        match local.decide(expected_size) {
            ResumeDecision::Skip => {
                info!(path = %file_path.display(), "file already downloaded");
                return Ok(FetchedFile::AlreadyComplete { path: file_path });
            }
            ResumeDecision::Restart { expected, found } => {
                info!(
                    path = %file_path.display(),
                    expected,
                    found,
                    "file exists but size does not match, restarting"
                );
                discard_stale(&file_path).await?;
            }
            ResumeDecision::Fresh => {}
        }

        let tracker = progress.begin(&filename, (expected_size > 0).then_some(expected_size));
        let result = stream_to_file(
            response,
            url.as_str(),
            &file_path,
            chunk_size.max(1),
            tracker.as_ref(),
        )
        .await;
        tracker.finish();
        let bytes = result?;

        debug!(path = %file_path.display(), bytes, "transfer finished");
        Ok(FetchedFile::Downloaded {
            path: file_path,
            bytes,
        })
    }
}

/// Streams the response body to `file_path` through a buffered writer,
/// reporting progress after every `chunk_size` bytes.
///
/// A failure mid-stream leaves the partial file in place; its size will not
/// match on the next run, which restarts it.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    chunk_size: usize,
    tracker: &dyn TransferTracker,
) -> Result<u64, DownloadError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(received) = stream.next().await {
        let received = received.map_err(|e| DownloadError::network(url, e))?;

        for piece in received.chunks(chunk_size) {
            writer
                .write_all(piece)
                .await
                .map_err(|e| DownloadError::io(file_path, e))?;
            bytes_written += piece.len() as u64;
            tracker.set_position(bytes_written);
        }
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_id(token: &str) -> FileId {
        FileId::new(token).unwrap()
    }

    fn client_for(server: &MockServer) -> DriveClient {
        DriveClient::with_endpoint(&format!("{}/download?export=download", server.uri())).unwrap()
    }

    /// Records every position update so tests can inspect chunking.
    #[derive(Default)]
    struct RecordingProgress {
        positions: std::sync::Arc<Mutex<Vec<u64>>>,
    }

    struct RecordingTracker {
        positions: std::sync::Arc<Mutex<Vec<u64>>>,
    }

    impl TransferProgress for RecordingProgress {
        fn begin(&self, _label: &str, _total: Option<u64>) -> Box<dyn TransferTracker> {
            Box::new(RecordingTracker {
                positions: std::sync::Arc::clone(&self.positions),
            })
        }
    }

    impl TransferTracker for RecordingTracker {
        fn set_position(&self, bytes: u64) {
            self.positions.lock().unwrap().push(bytes);
        }

        fn finish(&self) {}
    }

    #[test]
    fn test_download_url_appends_id_and_confirm() {
        let client = DriveClient::new();
        let url = client.download_url(&file_id("abc_123"));
        assert_eq!(
            url.as_str(),
            "https://drive.usercontent.google.com/download?export=download&id=abc_123&confirm=t"
        );
    }

    #[test]
    fn test_with_endpoint_rejects_invalid_urls() {
        assert!(matches!(
            DriveClient::with_endpoint("not a url"),
            Err(DownloadError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            DriveClient::with_endpoint("ftp://host/download"),
            Err(DownloadError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_uses_content_disposition_filename() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .and(query_param("id", "abc"))
            .and(query_param("confirm", "t"))
            .and(query_param("export", "download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", r#"attachment; filename="paper.pdf""#)
                    .set_body_bytes(b"PDF content"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch(&file_id("abc"), temp_dir.path(), 512, &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            fetched,
            FetchedFile::Downloaded {
                path: temp_dir.path().join("paper.pdf"),
                bytes: 11,
            }
        );
        assert_eq!(std::fs::read(fetched.path()).unwrap(), b"PDF content");
    }

    #[tokio::test]
    async fn test_fetch_keeps_non_ascii_header_filename() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "Content-Disposition",
                        "attachment; filename=\"naïve résumé.pdf\"",
                    )
                    .set_body_bytes(b"cv"),
            )
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch(&file_id("cvId"), temp_dir.path(), 512, &NoProgress)
            .await
            .unwrap();

        assert_eq!(fetched.path(), temp_dir.path().join("naïve résumé.pdf").as_path());
        assert_eq!(std::fs::read(fetched.path()).unwrap(), b"cv");
        assert!(!temp_dir.path().join("cvId").exists());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_identifier_filename() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw bytes"))
            .mount(&server)
            .await;

        let path = client_for(&server)
            .download(&file_id("noNameId"), temp_dir.path(), 512)
            .await
            .unwrap();

        assert_eq!(path, temp_dir.path().join("noNameId"));
        assert_eq!(std::fs::read(&path).unwrap(), b"raw bytes");
    }

    #[tokio::test]
    async fn test_fetch_skips_when_existing_size_matches() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("same.bin");
        // Same length as the body, different bytes: only size is compared.
        std::fs::write(&existing, b"XXXXX").unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", r#"attachment; filename="same.bin""#)
                    .set_body_bytes(b"hello"),
            )
            .mount(&server)
            .await;

        let progress = RecordingProgress::default();
        let fetched = client_for(&server)
            .fetch(&file_id("sameId"), temp_dir.path(), 512, &progress)
            .await
            .unwrap();

        assert_eq!(fetched, FetchedFile::AlreadyComplete { path: existing.clone() });
        assert_eq!(std::fs::read(&existing).unwrap(), b"XXXXX");
        assert!(progress.positions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_restarts_when_existing_size_differs() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("partial.bin");
        std::fs::write(&existing, b"hel").unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", r#"attachment; filename="partial.bin""#)
                    .set_body_bytes(b"hello world"),
            )
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch(&file_id("partialId"), temp_dir.path(), 512, &NoProgress)
            .await
            .unwrap();

        assert!(matches!(fetched, FetchedFile::Downloaded { bytes: 11, .. }));
        assert_eq!(std::fs::read(&existing).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_fetch_reports_cumulative_bytes_per_chunk() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 10]))
            .mount(&server)
            .await;

        let progress = RecordingProgress::default();
        client_for(&server)
            .fetch(&file_id("chunked"), temp_dir.path(), 4, &progress)
            .await
            .unwrap();

        let positions = progress.positions.lock().unwrap().clone();
        assert_eq!(positions.last(), Some(&10));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(
            positions.windows(2).all(|w| w[1] - w[0] <= 4),
            "each write must be at most one chunk: {positions:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_large_body_intact_in_small_chunks() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let body: Vec<u8> = (0..10_240u32).map(|i| (i % 251) as u8).collect();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let progress = RecordingProgress::default();
        let fetched = client_for(&server)
            .fetch(&file_id("bigId"), temp_dir.path(), 512, &progress)
            .await
            .unwrap();

        assert_eq!(
            fetched,
            FetchedFile::Downloaded {
                path: temp_dir.path().join("bigId"),
                bytes: 10_240,
            }
        );
        assert_eq!(std::fs::read(fetched.path()).unwrap(), body);
        let positions = progress.positions.lock().unwrap().clone();
        assert!(positions.len() >= 20, "expected one update per chunk: {positions:?}");
        assert_eq!(positions.last(), Some(&10_240));
        assert!(positions.windows(2).all(|w| w[1] - w[0] <= 512));
    }

    #[tokio::test]
    async fn test_fetch_waits_for_slow_responses() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_secs(2))
                    .set_body_bytes(b"late"),
            )
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch(&file_id("slowId"), temp_dir.path(), 512, &NoProgress)
            .await
            .unwrap();

        assert!(matches!(fetched, FetchedFile::Downloaded { bytes: 4, .. }));
        assert_eq!(std::fs::read(fetched.path()).unwrap(), b"late");
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_not_retried() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .fetch(&file_id("broken"), temp_dir.path(), 512, &NoProgress)
            .await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!temp_dir.path().join("broken").exists());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_network_error() {
        let temp_dir = TempDir::new().unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let client = DriveClient::with_endpoint("http://127.0.0.1:9/download").unwrap();

        let result = client
            .fetch(&file_id("offline"), temp_dir.path(), 512, &NoProgress)
            .await;

        assert!(matches!(result, Err(DownloadError::Network { .. })));
    }
}
