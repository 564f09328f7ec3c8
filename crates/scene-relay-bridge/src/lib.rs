//! scene-relay-bridge library crate.
//!
//! This crate exposes a 3D tool's TCP scripting endpoint as plain HTTP routes.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! HTTP caller (JSON bodies)
//!         ↕
//! [scene-relay-bridge]
//!   ├── domain/           Pure types: per-command request records, BridgeConfig
//!   ├── application/      Validation + command shaping, RelayService
//!   └── infrastructure/
//!         ├── http_server/  axum routes, one per command
//!         ├── remote_conn/  Protocol client: one TCP exchange per command
//!         ├── image_files/  Reads local image files
//!         └── config_file/  Optional TOML configuration
//!         ↕
//! Remote scripting endpoint (JSON over raw TCP, default localhost:9876)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `scene-relay-core`, and reaches
//!   the outside world only through the [`application::CommandExecutor`] and
//!   [`application::ImageLoader`] traits.
//! - `infrastructure` implements those traits with `tokio` and serves the
//!   routes with `axum`.

/// Domain layer: pure request and configuration types (no I/O).
pub mod domain;

/// Application layer: validation, command shaping, and the relay service.
pub mod application;

/// Infrastructure layer: HTTP server, TCP protocol client, file access.
pub mod infrastructure;
