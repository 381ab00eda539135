//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use drive_downloader::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_ENDPOINT, FileConfig, VerbositySetting,
};

/// Document scanned for links when no input is given.
pub const DEFAULT_INPUT: &str = "bookmarks.html";

/// Directory downloads land in when neither flag nor config names one.
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Links must contain this to be downloaded.
pub const DEFAULT_HOST_FILTER: &str = "drive.google.com";

/// Bulk-download files shared through cloud-drive links.
///
/// Scans a document (exported bookmarks, notes, any text) for links, keeps
/// the ones pointing at the drive host and downloads every file concurrently.
#[derive(Parser, Debug)]
#[command(name = "drive-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Document to scan for share links
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Output directory [default: downloads]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100) [default: 3]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Write and progress granularity in bytes [default: 512]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16_777_216))]
    pub chunk_size: Option<u32>,

    /// Only download links containing this host [default: drive.google.com]
    #[arg(long = "host")]
    pub host_filter: Option<String>,

    /// Download endpoint of the host service
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub chunk_size: usize,
    pub host_filter: String,
    pub endpoint: String,
    pub quiet: bool,
    pub log_level: &'static str,
}

impl Args {
    /// Merges with the config file. Flags win, then the file, then defaults.
    pub fn resolve(&self, file: Option<&FileConfig>) -> RunSettings {
        let file = file.cloned().unwrap_or_default();

        let log_level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => match file.verbosity {
                    Some(VerbositySetting::Quiet) => "error",
                    Some(VerbositySetting::Verbose) => "debug",
                    Some(VerbositySetting::Debug) => "trace",
                    Some(VerbositySetting::Default) | None => "info",
                },
                1 => "debug",
                _ => "trace",
            }
        };

        RunSettings {
            input: self.input.clone(),
            output_dir: self
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            concurrency: self
                .concurrency
                .map(usize::from)
                .or(file.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            chunk_size: self
                .chunk_size
                .and_then(|n| usize::try_from(n).ok())
                .or(file.chunk_size)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            host_filter: self
                .host_filter
                .clone()
                .or(file.host_filter)
                .unwrap_or_else(|| DEFAULT_HOST_FILTER.to_string()),
            endpoint: self
                .endpoint
                .clone()
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            quiet: log_level == "error",
            log_level,
        }
    }
}
