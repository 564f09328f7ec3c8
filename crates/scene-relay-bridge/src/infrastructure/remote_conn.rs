//! TCP client for the remote scripting endpoint.
//!
//! Every command is one *exchange* on a brand-new connection:
//!
//! ```text
//! connect ──▶ write {"type": ..., "params": {...}} ──▶ read until one JSON value parses ──▶ close
//! ```
//!
//! # Streaming the response
//!
//! The remote writes a single JSON value and gives no length prefix, so the
//! only way to know the response is complete is to try parsing it.  Bytes are
//! read in chunks of [`READ_CHUNK_SIZE`] and appended to a buffer.  A
//! [`ResponseScanner`] follows string and nesting state across chunks; once
//! it reports that a top-level value may have ended,
//! [`scene_relay_core::decode_response`] decides between:
//!
//! - complete → stop reading, even if the remote keeps the socket open;
//! - incomplete prefix → read another chunk;
//! - malformed → give up immediately.
//!
//! Each byte is scanned once and the full parse normally runs once, so a
//! large screenshot costs linear time rather than one re-parse per chunk.
//!
//! The loop is bounded by [`ExchangeLimits`]: a read timeout covering the
//! write and every read, and a maximum buffered size.
//!
//! # Ownership of the socket
//!
//! [`ProtocolClient`] holds only its target and limits.  The socket lives in a
//! [`RemoteConnection`] local to one exchange, so concurrent calls never share
//! a stream and the socket is closed on every exit path when the connection
//! is dropped.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use scene_relay_core::{
    decode_response, encode_command, CommandEnvelope, CommandType, Params, ProtocolError,
    ResponseEnvelope, ResponseScanner,
};

use crate::application::relay_service::CommandExecutor;
use crate::domain::config::{ExchangeLimits, RemoteTarget};

/// Bytes requested from the socket per `read()` call.
pub const READ_CHUNK_SIZE: usize = 8192;

// ── Error type ────────────────────────────────────────────────────────────────

/// Everything that can go wrong during one exchange.
///
/// The `Display` text becomes the `message` of the error envelope returned to
/// the caller.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to connect to remote at {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to remote at {target} after {timeout:?}")]
    ConnectTimeout { target: String, timeout: Duration },

    #[error("failed to encode command: {0}")]
    Encode(#[from] ProtocolError),

    #[error("failed to send command: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to read response: {0}")]
    Read(#[source] std::io::Error),

    #[error("no complete response within {0:?}")]
    ReadTimeout(Duration),

    #[error("response exceeded {limit} bytes without completing")]
    ResponseTooLarge { limit: usize },

    /// The buffer can never become valid JSON.
    #[error("invalid response from remote: {source}")]
    Malformed {
        #[source]
        source: ProtocolError,
        raw: String,
    },

    #[error("connection closed before any response was received")]
    ClosedEmpty,

    #[error("connection closed after {received} bytes without a complete response")]
    ClosedEarly { received: usize, raw: String },
}

impl ExchangeError {
    /// Converts the error into the `{"status": "error", ...}` envelope handed
    /// back to callers.  Partial bytes, when there were any, go under `raw`.
    pub fn into_envelope(self) -> ResponseEnvelope {
        let raw = match &self {
            ExchangeError::Malformed { raw, .. } | ExchangeError::ClosedEarly { raw, .. } => {
                Some(raw.clone())
            }
            _ => None,
        };
        let envelope = ResponseEnvelope::error(self.to_string());
        match raw {
            Some(raw) => envelope.with_detail("raw", Value::from(raw)),
            None => envelope,
        }
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

/// One open connection to the remote, used for exactly one exchange.
///
/// There is no way to reconnect or reuse a `RemoteConnection`:
/// [`disconnect`](Self::disconnect) consumes it, and dropping it closes the
/// socket.
pub struct RemoteConnection {
    stream: TcpStream,
    exchange_id: Uuid,
}

impl RemoteConnection {
    /// Opens a new TCP connection to `target`.
    ///
    /// The host is resolved on every call, so `localhost` and DNS names work.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::Connect`] if the remote refuses or cannot be reached,
    /// [`ExchangeError::ConnectTimeout`] if the handshake takes longer than
    /// `connect_timeout`.
    pub async fn connect(
        target: &RemoteTarget,
        connect_timeout: Duration,
        exchange_id: Uuid,
    ) -> Result<Self, ExchangeError> {
        let attempt = TcpStream::connect((target.host.as_str(), target.port));
        let stream = match timeout(connect_timeout, attempt).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ExchangeError::Connect {
                    target: target.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ExchangeError::ConnectTimeout {
                    target: target.to_string(),
                    timeout: connect_timeout,
                })
            }
        };

        debug!(exchange = %exchange_id, %target, "connected to remote");
        Ok(Self {
            stream,
            exchange_id,
        })
    }

    /// Writes `request` and reads back exactly one JSON value.
    ///
    /// Not bounded in time; the caller wraps it in the read timeout.
    pub async fn round_trip(
        &mut self,
        request: &[u8],
        max_response_bytes: usize,
    ) -> Result<ResponseEnvelope, ExchangeError> {
        self.stream
            .write_all(request)
            .await
            .map_err(ExchangeError::Write)?;
        debug!(exchange = %self.exchange_id, bytes = request.len(), "command sent");

        // Accumulates bytes across read() calls until one JSON value is complete.
        let mut recv_buf: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
        // Temporary buffer for each individual `read()`.
        let mut read_tmp = vec![0u8; READ_CHUNK_SIZE];
        // Sees each byte once and says when a full parse is worth trying.
        let mut scanner = ResponseScanner::new();

        loop {
            // A read may return fewer than READ_CHUNK_SIZE bytes; that is normal.
            let n = self
                .stream
                .read(&mut read_tmp)
                .await
                .map_err(ExchangeError::Read)?;

            if n == 0 {
                // EOF before a complete value: surface whatever was buffered.
                debug!(exchange = %self.exchange_id, buffered = recv_buf.len(), "remote closed the connection");
                if recv_buf.is_empty() {
                    return Err(ExchangeError::ClosedEmpty);
                }
                return Err(ExchangeError::ClosedEarly {
                    received: recv_buf.len(),
                    raw: String::from_utf8_lossy(&recv_buf).into_owned(),
                });
            }

            let chunk = &read_tmp[..n];
            recv_buf.extend_from_slice(chunk);
            scanner.feed(chunk);

            // Only parse the whole buffer when it could end a top-level value;
            // parsing after every chunk would be quadratic in the response size.
            if scanner.may_be_complete() {
                match decode_response(&recv_buf) {
                    Ok(response) => {
                        debug!(exchange = %self.exchange_id, bytes = recv_buf.len(), "response complete");
                        return Ok(response);
                    }
                    // Valid prefix of a longer value: keep reading.
                    Err(e) if e.is_incomplete() => {}
                    // Can never become valid no matter what follows.
                    Err(source) => {
                        return Err(ExchangeError::Malformed {
                            source,
                            raw: String::from_utf8_lossy(&recv_buf).into_owned(),
                        });
                    }
                }
            }

            if recv_buf.len() > max_response_bytes {
                return Err(ExchangeError::ResponseTooLarge {
                    limit: max_response_bytes,
                });
            }
        }
    }

    /// Closes the connection.
    ///
    /// A failed shutdown is only logged: the socket is released when `self`
    /// drops either way.
    pub async fn disconnect(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(exchange = %self.exchange_id, "shutdown after exchange failed: {e}");
        }
        debug!(exchange = %self.exchange_id, "disconnected from remote");
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Sends commands to the remote, one connection per command.
///
/// Cheap to clone and safe to share: it holds no socket.
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    target: RemoteTarget,
    limits: ExchangeLimits,
}

impl ProtocolClient {
    pub fn new(target: RemoteTarget, limits: ExchangeLimits) -> Self {
        Self { target, limits }
    }

    /// Sends `command_type` with `params` and returns the response envelope.
    ///
    /// Never fails: connection and parse problems come back as
    /// `{"status": "error", "message": ...}`.
    pub async fn send_command(&self, command_type: CommandType, params: Params) -> ResponseEnvelope {
        self.send(CommandEnvelope::with_params(command_type, params))
            .await
    }

    /// Like [`send_command`](Self::send_command) for a prebuilt envelope.
    pub async fn send(&self, command: CommandEnvelope) -> ResponseEnvelope {
        match self.exchange(&command).await {
            Ok(response) => response,
            Err(e) => {
                warn!(command = %command.command_type, target = %self.target, "exchange failed: {e}");
                e.into_envelope()
            }
        }
    }

    /// Performs one exchange and reports failures as typed errors.
    ///
    /// The connection is closed before this returns, whether or not the
    /// exchange succeeded.
    pub async fn exchange(
        &self,
        command: &CommandEnvelope,
    ) -> Result<ResponseEnvelope, ExchangeError> {
        let request = encode_command(command)?;
        let exchange_id = Uuid::new_v4();
        debug!(exchange = %exchange_id, command = %command.command_type, "starting exchange");

        let mut conn =
            RemoteConnection::connect(&self.target, self.limits.connect_timeout, exchange_id)
                .await?;

        let read_timeout = self.limits.read_timeout;
        let result = match timeout(
            read_timeout,
            conn.round_trip(&request, self.limits.max_response_bytes),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExchangeError::ReadTimeout(read_timeout)),
        };

        conn.disconnect().await;
        result
    }
}

#[async_trait]
impl CommandExecutor for ProtocolClient {
    async fn execute(&self, command: CommandEnvelope) -> ResponseEnvelope {
        self.send(command).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
