//! Constants for the download module (endpoint, chunking, limits).

/// Default download endpoint of the host service.
pub const DEFAULT_ENDPOINT: &str = "https://drive.usercontent.google.com/download?export=download";

/// Query value that skips the host's virus-scan interstitial for large files.
pub const CONFIRM_TOKEN: &str = "t";

/// Default write/progress chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
