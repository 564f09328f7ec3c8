//! Optional TOML configuration file.
//!
//! Passed with `--config <path>` (or `SCENE_RELAY_CONFIG`).  Every key is
//! optional; missing keys take the built-in defaults, and CLI flags or
//! environment variables override whatever the file says.
//!
//! ```toml
//! [http]
//! bind = "127.0.0.1"
//! port = 5005
//!
//! [remote]
//! host = "localhost"
//! port = 9876
//! connect_timeout_secs = 5
//! read_timeout_secs = 120
//! max_response_bytes = 67108864
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HTTP_PORT, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_READ_TIMEOUT,
    DEFAULT_REMOTE_HOST, DEFAULT_REMOTE_PORT,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub remote: RemoteSection,
}

/// `[http]` – where the bridge listens.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

/// `[remote]` – the scripting endpoint and exchange bounds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    #[serde(default = "default_remote_host")]
    pub host: String,
    #[serde(default = "default_remote_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

// ── Default value functions (used by serde) ──────────────────────────────────

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_remote_host() -> String {
    DEFAULT_REMOTE_HOST.to_string()
}
fn default_remote_port() -> u16 {
    DEFAULT_REMOTE_PORT
}
fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT.as_secs()
}
fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_http_port(),
        }
    }
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            port: default_remote_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FileConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for invalid TOML, wrong value types or unknown
    /// keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the file at `path`.
    ///
    /// Unlike an absent `--config` flag, a path that does not exist is an
    /// error: the operator asked for that file explicitly.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
