//! Drive Downloader Core Library
//!
//! Bulk-downloads files shared through cloud-drive links. Links are harvested
//! from a local document (exported bookmarks, notes, ...), each link is
//! reduced to the file identifier it embeds, and every file is fetched
//! concurrently under a fixed admission limit.
//!
//! # Architecture
//!
//! - [`parser`] - Link collection and file-identifier extraction
//! - [`download`] - Single-file downloader and the bulk orchestrator
//! - [`config`] - Optional TOML configuration file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod parser;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, VerbositySetting};
pub use download::{
    BatchReport, BulkDownloader, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_ENDPOINT,
    DownloadError, DownloadOutcome, DownloadStats, DriveClient, EngineError, FetchedFile,
    FileFetcher, NoProgress, ProgressBars, TaskError, TransferProgress,
};
pub use parser::{FileId, ParseError, collect_links, extract_file_id, extract_links, filter_by_host};
