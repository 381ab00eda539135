//! Share-link downloads: one file at a time, or a whole batch concurrently.
//!
//! # Features
//!
//! - Streaming downloads written chunk by chunk
//! - Filename taken from the Content-Disposition header, falling back to the file id
//! - Size-based skip/restart for files already on disk
//! - Bounded concurrency with per-item outcomes in input order
//! - Pluggable progress reporting
//!
//! # Example
//!
//! ```no_run
//! use drive_downloader::download::DriveClient;
//! use drive_downloader::parser::extract_file_id;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DriveClient::new();
//! let id = extract_file_id("https://drive.google.com/file/d/abc123/view").ok_or("no id")?;
//! let path = client.download(&id, Path::new("./downloads"), 512).await?;
//! println!("Downloaded: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod filename;
mod progress;
mod resume;

pub use client::{DriveClient, FetchedFile, FileFetcher};
pub use constants::{DEFAULT_CHUNK_SIZE, DEFAULT_ENDPOINT, MAX_CHUNK_SIZE};
pub use engine::{BatchReport, BulkDownloader, DEFAULT_CONCURRENCY, DownloadOutcome, DownloadStats};
pub use error::{DownloadError, EngineError, TaskError};
pub use progress::{NoProgress, ProgressBars, TransferProgress, TransferTracker};
pub use resume::{LocalFileState, ResumeDecision};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
