//! Bulk orchestrator for concurrent share-link downloads.
//!
//! This module provides the [`BulkDownloader`] which turns a list of share
//! links into one download task per link, bounded by a semaphore-based
//! admission gate.
//!
//! # Overview
//!
//! Every task is spawned up front. A task must hold a gate permit while it
//! extracts its identifier and transfers the file; the permit is released
//! when the task ends, whatever the outcome. Failures are captured per task
//! and never abort siblings or the batch. There is no retry: a failed item
//! stays failed for this run, and re-running the batch relies on the size
//! check to skip files that already completed.
//!
//! # Example
//!
//! ```no_run
//! use drive_downloader::download::{BulkDownloader, DriveClient};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = BulkDownloader::new(Arc::new(DriveClient::new()), 3, 512)?;
//! let urls = vec!["https://drive.google.com/file/d/abc123/view".to_string()];
//! let report = engine.bulk_download(&urls, Path::new("./downloads")).await?;
//! println!("{:?}", report.successes());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::client::{FetchedFile, FileFetcher};
use super::constants::MAX_CHUNK_SIZE;
use super::error::{EngineError, TaskError};
use super::progress::{NoProgress, TransferProgress};
use crate::parser::{ParseError, extract_file_id};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Statistics from a download batch run.
///
/// Atomic counters updated by the download tasks as they finish.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files transferred in this run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of files found already complete on disk.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Total number of items processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.skipped() + self.failed()
    }

    fn record(&self, outcome: &DownloadOutcome) {
        let counter = match outcome {
            DownloadOutcome::Downloaded { .. } => &self.completed,
            DownloadOutcome::AlreadyComplete { .. } => &self.skipped,
            DownloadOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Result of one batch item.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was transferred.
    Downloaded {
        /// Input share link.
        url: String,
        /// Output path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A complete copy was already on disk.
    AlreadyComplete {
        /// Input share link.
        url: String,
        /// Existing path.
        path: PathBuf,
    },
    /// Extraction or transfer failed.
    Failed {
        /// Input share link.
        url: String,
        /// Why it failed.
        error: TaskError,
    },
}

impl DownloadOutcome {
    fn from_result(url: String, result: Result<FetchedFile, TaskError>) -> Self {
        match result {
            Ok(FetchedFile::Downloaded { path, bytes }) => Self::Downloaded { url, path, bytes },
            Ok(FetchedFile::AlreadyComplete { path }) => Self::AlreadyComplete { url, path },
            Err(error) => Self::Failed { url, error },
        }
    }

    /// The share link this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Downloaded { url, .. }
            | Self::AlreadyComplete { url, .. }
            | Self::Failed { url, .. } => url,
        }
    }

    /// `true` unless the item failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Output path for successful items.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Downloaded { path, .. } | Self::AlreadyComplete { path, .. } => Some(path),
            Self::Failed { .. } => None,
        }
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    outcomes: Vec<DownloadOutcome>,
    stats: DownloadStats,
}

impl BatchReport {
    /// One flag per input link, same order as the input.
    #[must_use]
    pub fn successes(&self) -> Vec<bool> {
        self.outcomes.iter().map(DownloadOutcome::is_success).collect()
    }

    /// Every outcome, same order as the input.
    #[must_use]
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// Aggregate counters.
    #[must_use]
    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    /// `true` when no item failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed() == 0
    }

    /// Number of items in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// `true` for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Bounded-concurrency downloader for a list of share links.
///
/// # Concurrency Model
///
/// - Each link runs in its own Tokio task, all spawned at once
/// - A semaphore permit is acquired before the task touches the network
/// - Permits are released automatically when tasks complete (RAII), including on failure
/// - Outcomes are collected by awaiting tasks in submission order
///
/// Nothing prevents two links from resolving to the same destination file;
/// tasks do not lock paths against each other.
pub struct BulkDownloader {
    fetcher: Arc<dyn FileFetcher>,
    progress: Arc<dyn TransferProgress>,
    concurrency: usize,
    chunk_size: usize,
}

impl fmt::Debug for BulkDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkDownloader")
            .field("concurrency", &self.concurrency)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl BulkDownloader {
    /// Creates a downloader with the given transport, concurrency limit and
    /// chunk size. Progress is discarded until [`with_progress`](Self::with_progress).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] outside 1-100 and
    /// [`EngineError::InvalidChunkSize`] outside 1 byte to 16 MiB.
    #[instrument(level = "debug", skip(fetcher))]
    pub fn new(
        fetcher: Arc<dyn FileFetcher>,
        concurrency: usize,
        chunk_size: usize,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        if !(1..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(EngineError::InvalidChunkSize { value: chunk_size });
        }

        debug!(concurrency, chunk_size, "creating bulk downloader");

        Ok(Self {
            fetcher,
            progress: Arc::new(NoProgress),
            concurrency,
            chunk_size,
        })
    }

    /// Reports transfer progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn TransferProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Downloads every link into `dest_dir` and waits for all of them.
    ///
    /// The directory is created if missing. The report holds one outcome per
    /// link in input order; a failing link shows up as
    /// [`DownloadOutcome::Failed`] at its own position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CreateDir`] if the destination cannot be
    /// created. Individual download failures do NOT cause this method to error.
    #[instrument(skip(self, urls), fields(items = urls.len(), dest_dir = %dest_dir.display()))]
    pub async fn bulk_download(
        &self,
        urls: &[String],
        dest_dir: &Path,
    ) -> Result<BatchReport, EngineError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| EngineError::CreateDir {
                path: dest_dir.to_path_buf(),
                source,
            })?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let stats = Arc::new(DownloadStats::new());

        info!(items = urls.len(), "starting bulk download");

        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let url = url.clone();
                let semaphore = Arc::clone(&semaphore);
                let fetcher = Arc::clone(&self.fetcher);
                let progress = Arc::clone(&self.progress);
                let stats = Arc::clone(&stats);
                let dest_dir = dest_dir.to_path_buf();
                let chunk_size = self.chunk_size;

                tokio::spawn(async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => {
                            info!(url = %url, "starting download");
                            download_one(
                                fetcher.as_ref(),
                                &url,
                                &dest_dir,
                                chunk_size,
                                progress.as_ref(),
                            )
                            .await
                        }
                        Err(_) => Err(TaskError::GateClosed),
                    };

                    let outcome = DownloadOutcome::from_result(url, result);
                    log_outcome(&outcome);
                    stats.record(&outcome);
                    outcome
                })
            })
            .collect();

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut outcomes = Vec::with_capacity(handles.len());
        for (url, handle) in urls.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = DownloadOutcome::Failed {
                        url: url.clone(),
                        error: TaskError::Panicked(e.to_string()),
                    };
                    log_outcome(&outcome);
                    stats.record(&outcome);
                    outcome
                }
            };
            outcomes.push(outcome);
        }

        info!(
            items = urls.len(),
            completed = stats.completed(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            "finished bulk download"
        );

        // Every task has been joined, so this is the last reference.
        let stats = Arc::try_unwrap(stats).unwrap_or_else(|shared| DownloadStats {
            completed: AtomicUsize::new(shared.completed()),
            skipped: AtomicUsize::new(shared.skipped()),
            failed: AtomicUsize::new(shared.failed()),
        });

        Ok(BatchReport { outcomes, stats })
    }
}

/// Extracts the identifier and fetches one file. Runs inside a gate slot.
async fn download_one(
    fetcher: &dyn FileFetcher,
    url: &str,
    dest_dir: &Path,
    chunk_size: usize,
    progress: &dyn TransferProgress,
) -> Result<FetchedFile, TaskError> {
    let file_id = extract_file_id(url).ok_or_else(|| ParseError::no_file_id(url))?;
    debug!(url, file_id = %file_id, "extracted file id");
    Ok(fetcher
        .fetch(&file_id, dest_dir, chunk_size, progress)
        .await?)
}

fn log_outcome(outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Downloaded { url, path, bytes } => {
            info!(url = %url, path = %path.display(), bytes, "download completed");
        }
        DownloadOutcome::AlreadyComplete { url, path } => {
            info!(url = %url, path = %path.display(), "download completed (already on disk)");
        }
        DownloadOutcome::Failed { url, error } => {
            warn!(url = %url, error = %error, "download failed");
        }
    }
}
