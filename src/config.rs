//! Optional TOML configuration file with downloader defaults.
//!
//! Every key is optional. Values given on the command line win over the
//! file, and the file wins over built-in defaults.
//!
//! ```toml
//! output_dir = "downloads"
//! concurrency = 4
//! chunk_size = 8192
//! host_filter = "drive.google.com"
//! verbosity = "verbose"
//! ```

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::MAX_CHUNK_SIZE;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A key parsed but its value is out of range.
    #[error("invalid config value for `{key}`: {value}. Expected {expected}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Offending value, rendered.
        value: String,
        /// Accepted range or format.
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            expected,
        }
    }
}

/// TOML-backed file configuration for downloader defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<usize>,
    /// Write and progress granularity in bytes.
    pub chunk_size: Option<usize>,
    /// Substring a link must contain to be downloaded.
    pub host_filter: Option<String>,
    /// Download endpoint of the host service.
    pub endpoint: Option<String>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            return Err(ConfigError::invalid("concurrency", concurrency, "range 1..=100"));
        }

        if let Some(chunk_size) = self.chunk_size
            && !(1..=MAX_CHUNK_SIZE).contains(&chunk_size)
        {
            return Err(ConfigError::invalid(
                "chunk_size",
                chunk_size,
                "range 1..=16777216",
            ));
        }

        if let Some(host) = &self.host_filter
            && host.trim().is_empty()
        {
            return Err(ConfigError::invalid("host_filter", "\"\"", "a non-empty string"));
        }

        if let Some(endpoint) = &self.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::invalid("endpoint", endpoint, "an http(s) URL"));
        }

        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values. `origin` only
    /// labels the error.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw, path)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Loads the default config file when it exists.
    ///
    /// Returns `Ok(None)` when no base directory is known or no file is
    /// present there.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let Some(path) = resolve_default_config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file found");
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/drive-downloader/config.toml`
/// 2. `$HOME/.config/drive-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("drive-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("drive-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
