//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! `main.rs` builds it from CLI flags, environment variables and an optional
//! TOML file; tests build it directly.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) lets the bridge be embedded in tests with a
//! loopback stub remote.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Default HTTP listener port.
pub const DEFAULT_HTTP_PORT: u16 = 5005;

/// Default remote host.  A hostname, not an IP: resolution happens per connect.
pub const DEFAULT_REMOTE_HOST: &str = "localhost";

/// Default remote scripting port.
pub const DEFAULT_REMOTE_PORT: u16 = 9876;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Remote commands such as asset downloads and code execution can take a long
/// time before the first byte comes back.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on one buffered response (screenshots arrive base64-encoded).
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

/// Where the remote scripting endpoint listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Hostname or IP address.
    pub host: String,
    pub port: u16,
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for RemoteTarget {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_HOST, DEFAULT_REMOTE_PORT)
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Bounds applied to every exchange with the remote.
///
/// The remote protocol has no framing, so without these a silent or chatty
/// remote could block a request forever or grow the buffer without limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeLimits {
    /// Maximum time to establish the TCP connection.
    pub connect_timeout: Duration,
    /// Maximum time for the write plus the whole read loop.
    pub read_timeout: Duration,
    /// Maximum number of response bytes to buffer.
    pub max_response_bytes: usize,
}

impl Default for ExchangeLimits {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// All runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The address and port the HTTP server binds to.
    ///
    /// `0.0.0.0` accepts callers on any interface; `127.0.0.1` restricts the
    /// bridge to local callers.
    pub http_bind_addr: SocketAddr,

    /// The remote scripting endpoint.
    pub remote: RemoteTarget,

    /// Timeouts and buffer bounds for each exchange.
    pub limits: ExchangeLimits,
}

impl Default for BridgeConfig {
    /// | Field            | Default           |
    /// |------------------|-------------------|
    /// | http_bind_addr   | `0.0.0.0:5005`    |
    /// | remote           | `localhost:9876`  |
    /// | connect_timeout  | 5 seconds         |
    /// | read_timeout     | 120 seconds       |
    /// | max_response     | 64 MiB            |
    fn default() -> Self {
        Self {
            http_bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)),
            remote: RemoteTarget::default(),
            limits: ExchangeLimits::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_port_is_5005() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.http_bind_addr.port(), 5005);
    }

    #[test]
    fn test_default_http_bind_is_unspecified() {
        let cfg = BridgeConfig::default();
        assert!(cfg.http_bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_default_remote_is_localhost_9876() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.remote.to_string(), "localhost:9876");
    }

    #[test]
    fn test_default_limits() {
        let limits = ExchangeLimits::default();
        assert_eq!(limits.connect_timeout, Duration::from_secs(5));
        assert_eq!(limits.read_timeout, Duration::from_secs(120));
        assert_eq!(limits.max_response_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_remote_target_display_with_ip() {
        let target = RemoteTarget::new("10.0.0.5", 9000);
        assert_eq!(target.to_string(), "10.0.0.5:9000");
    }
}
