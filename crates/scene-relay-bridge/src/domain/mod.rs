//! Domain layer for scene-relay-bridge.
//!
//! The domain layer contains pure types that have no dependencies on I/O,
//! networking, or external frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - Per-command request records (the JSON bodies HTTP callers send)
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `axum` types
//! - File I/O or environment variable reading

pub mod config;
pub mod requests;

pub use config::{BridgeConfig, ExchangeLimits, RemoteTarget};
pub use requests::RelayRequest;
