//! Application layer for scene-relay-bridge.
//!
//! The application layer knows *what* to do with a request (validate it,
//! shape it into a command envelope, hand it to an executor) but delegates
//! *how* to reach the remote and the filesystem to traits implemented by the
//! infrastructure layer.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or binding listeners
//! - HTTP status codes and routing (handled by `infrastructure::http_server`)

pub mod command_shaping;
pub mod relay_service;

pub use command_shaping::{shape_command, EncodedImage, ImageLoader, ShapeError};
pub use relay_service::{CommandExecutor, RelayOutcome, RelayService};
