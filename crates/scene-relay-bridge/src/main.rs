//! Scene relay bridge: entry point.
//!
//! This binary exposes the commands of a 3D tool's scripting endpoint as HTTP
//! routes.  Each HTTP call becomes one JSON command sent over a fresh TCP
//! connection to the remote, and the remote's JSON answer is returned as the
//! HTTP response body.
//!
//! # Usage
//!
//! ```text
//! scene-relay-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>              Optional TOML configuration file
//!   --http-bind <IP>             HTTP listener address [default: 0.0.0.0]
//!   --http-port <PORT>           HTTP listener port [default: 5005]
//!   --remote-host <HOST>         Remote hostname or IP [default: localhost]
//!   --remote-port <PORT>         Remote scripting port [default: 9876]
//!   --connect-timeout <SECS>     Connect timeout [default: 5]
//!   --read-timeout <SECS>        Response timeout [default: 120]
//!   --max-response-bytes <N>     Response size limit [default: 67108864]
//! ```
//!
//! # Where settings come from
//!
//! For every setting the first source that provides it wins:
//!
//! 1. the command-line flag;
//! 2. the `SCENE_RELAY_*` environment variable of the same name
//!    (e.g. `SCENE_RELAY_REMOTE_PORT`);
//! 3. the TOML file given with `--config` / `SCENE_RELAY_CONFIG`;
//! 4. the built-in default.
//!
//! Flags and environment variables are handled by `clap`; that is why the
//! fields of [`Cli`] are `Option`s with no `default_value`: a `None` means
//! "fall through to the config file".

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scene_relay_bridge::domain::{BridgeConfig, ExchangeLimits, RemoteTarget};
use scene_relay_bridge::infrastructure::config_file::FileConfig;
use scene_relay_bridge::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// HTTP relay for a 3D scene scripting endpoint.
///
/// Forwards one JSON command per HTTP request to the remote over TCP and
/// returns the remote's response.
#[derive(Debug, Default, Parser)]
#[command(
    name = "scene-relay-bridge",
    about = "HTTP-to-TCP command relay for a 3D scene scripting endpoint",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SCENE_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// IP address the HTTP server binds to.
    ///
    /// `0.0.0.0` accepts callers on any interface; `127.0.0.1` only local ones.
    #[arg(long, env = "SCENE_RELAY_HTTP_BIND")]
    http_bind: Option<String>,

    /// TCP port for the HTTP server.
    #[arg(long, env = "SCENE_RELAY_HTTP_PORT")]
    http_port: Option<u16>,

    /// Hostname or IP address of the remote scripting endpoint.
    #[arg(long, env = "SCENE_RELAY_REMOTE_HOST")]
    remote_host: Option<String>,

    /// TCP port of the remote scripting endpoint.
    #[arg(long, env = "SCENE_RELAY_REMOTE_PORT")]
    remote_port: Option<u16>,

    /// Seconds to wait for the TCP connection to the remote.
    #[arg(long, env = "SCENE_RELAY_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// Seconds to wait for a complete response after sending a command.
    #[arg(long, env = "SCENE_RELAY_READ_TIMEOUT")]
    read_timeout: Option<u64>,

    /// Largest response, in bytes, the bridge will buffer.
    #[arg(long, env = "SCENE_RELAY_MAX_RESPONSE_BYTES")]
    max_response_bytes: Option<usize>,
}

impl Cli {
    /// Loads the config file (if any) and merges it with the CLI values.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the merged values are invalid.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => FileConfig::default(),
        };
        self.merge(file)
    }

    /// Applies CLI/env values over `file`.
    fn merge(self, file: FileConfig) -> anyhow::Result<BridgeConfig> {
        let bind_ip: IpAddr = match &self.http_bind {
            Some(bind) => bind
                .parse()
                .with_context(|| format!("invalid HTTP bind address: '{bind}'"))?,
            None => file.http.bind,
        };
        let http_port = self.http_port.unwrap_or(file.http.port);

        let remote = RemoteTarget::new(
            self.remote_host.unwrap_or(file.remote.host),
            self.remote_port.unwrap_or(file.remote.port),
        );
        if remote.host.trim().is_empty() {
            bail!("remote host must not be empty");
        }

        let connect_secs = self.connect_timeout.unwrap_or(file.remote.connect_timeout_secs);
        let read_secs = self.read_timeout.unwrap_or(file.remote.read_timeout_secs);
        let max_response_bytes = self
            .max_response_bytes
            .unwrap_or(file.remote.max_response_bytes);
        if connect_secs == 0 || read_secs == 0 {
            bail!("connect and read timeouts must be at least 1 second");
        }
        if max_response_bytes == 0 {
            bail!("max response size must be greater than zero");
        }

        Ok(BridgeConfig {
            http_bind_addr: SocketAddr::new(bind_ip, http_port),
            remote,
            limits: ExchangeLimits {
                connect_timeout: Duration::from_secs(connect_secs),
                read_timeout: Duration::from_secs(read_secs),
                max_response_bytes,
            },
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` controls the level
///    (default `info`).
/// 2. CLI arguments and environment variables are parsed with `clap`.
/// 3. The config file, if any, is loaded and merged into a [`BridgeConfig`].
/// 4. [`run_server`] binds the HTTP port and serves until Ctrl+C, then lets
///    in-flight requests finish.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_bridge_config()?;

    info!(
        "scene relay bridge starting: http={}, remote={}, read_timeout={:?}",
        config.http_bind_addr, config.remote, config.limits.read_timeout
    );

    run_server(config, shutdown_signal()).await?;

    info!("scene relay bridge stopped");
    Ok(())
}

/// Resolves when Ctrl+C (SIGINT on Unix) is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            tracing::error!("failed to listen for Ctrl+C signal: {e}");
            // Without a signal handler the server runs until killed.
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_are_unset_by_default() {
        // Arrange: parse with no arguments
        let cli = Cli::parse_from(["scene-relay-bridge"]);

        // Assert: nothing set, so the config file and defaults decide
        assert_eq!(cli.http_port, None);
        assert_eq!(cli.remote_host, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_cli_remote_port_override() {
        let cli = Cli::parse_from(["scene-relay-bridge", "--remote-port", "9000"]);
        assert_eq!(cli.remote_port, Some(9000));
    }

    #[test]
    fn test_cli_invalid_port_is_rejected() {
        let result = Cli::try_parse_from(["scene-relay-bridge", "--http-port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_defaults_match_built_in_config() {
        // Act
        let config = Cli::default().merge(FileConfig::default()).unwrap();

        // Assert
        let expected = BridgeConfig::default();
        assert_eq!(config.http_bind_addr, expected.http_bind_addr);
        assert_eq!(config.remote, expected.remote);
        assert_eq!(config.limits, expected.limits);
    }

    #[test]
    fn test_merge_file_values_apply_when_flags_absent() {
        // Arrange
        let file = FileConfig::parse(
            "[http]\nbind = \"127.0.0.1\"\nport = 8080\n[remote]\nhost = \"render-box\"\nread_timeout_secs = 30\n",
        )
        .unwrap();

        // Act
        let config = Cli::default().merge(file).unwrap();

        // Assert
        assert_eq!(config.http_bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.remote.to_string(), "render-box:9876");
        assert_eq!(config.limits.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_merge_flags_override_file() {
        // Arrange
        let file = FileConfig::parse("[remote]\nhost = \"render-box\"\nport = 7000\n").unwrap();
        let cli = Cli::parse_from([
            "scene-relay-bridge",
            "--remote-host",
            "10.0.0.5",
            "--read-timeout",
            "10",
        ]);

        // Act
        let config = cli.merge(file).unwrap();

        // Assert: host from the flag, port still from the file
        assert_eq!(config.remote.to_string(), "10.0.0.5:7000");
        assert_eq!(config.limits.read_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_merge_invalid_http_bind_returns_error() {
        let cli = Cli {
            http_bind: Some("not.an.ip".to_string()),
            ..Cli::default()
        };

        let result = cli.merge(FileConfig::default());

        assert!(result.is_err());
    }

    #[test]
    fn test_merge_zero_read_timeout_returns_error() {
        let cli = Cli {
            read_timeout: Some(0),
            ..Cli::default()
        };
        assert!(cli.merge(FileConfig::default()).is_err());
    }

    #[test]
    fn test_merge_empty_remote_host_returns_error() {
        let cli = Cli {
            remote_host: Some("  ".to_string()),
            ..Cli::default()
        };
        assert!(cli.merge(FileConfig::default()).is_err());
    }

    #[test]
    fn test_into_bridge_config_missing_file_returns_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here/scene-relay.toml")),
            ..Cli::default()
        };

        let err = cli.into_bridge_config().unwrap_err();

        assert!(err.to_string().contains("failed to load config file"));
    }
}
