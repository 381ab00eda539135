//! Input parsing for share links.
//!
//! Two stages feed the downloader:
//!
//! 1. [`collect_links`] scans a local document for anything shaped like an
//!    `http(s)://` link. Filtering to the target host is left to the caller
//!    ([`filter_by_host`]).
//! 2. [`extract_file_id`] reduces one share link to the [`FileId`] it embeds.
//!
//! # Example
//!
//! ```
//! use drive_downloader::parser::{extract_file_id, extract_links, filter_by_host};
//!
//! let text = "notes https://drive.google.com/file/d/abc123/view and https://example.com";
//! let links = filter_by_host(extract_links(text), "drive.google.com");
//! assert_eq!(links.len(), 1);
//! assert_eq!(extract_file_id(&links[0]).unwrap().as_str(), "abc123");
//! ```

mod error;
mod identifier;
mod links;

pub use error::ParseError;
pub use identifier::{FileId, extract_file_id};
pub use links::{collect_links, extract_links, filter_by_host};
