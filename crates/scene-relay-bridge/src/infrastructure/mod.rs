//! Infrastructure layer for scene-relay-bridge.
//!
//! The infrastructure layer handles all I/O.
//!
//! # Responsibilities
//!
//! - Opening one TCP connection per command to the remote and reading back
//!   its response (`remote_conn`)
//! - Reading local image files (`image_files`)
//! - Loading the optional TOML config file (`config_file`)
//! - Serving the HTTP routes and shutting down gracefully (`http_server`)
//!
//! # What does NOT belong here?
//!
//! - Validation and params shaping (that is the application layer)
//! - Request record definitions (that is the domain layer)
//! - Merging CLI flags, env vars and the config file (done in `main.rs`)

pub mod config_file;
pub mod http_server;
pub mod image_files;
pub mod remote_conn;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use http_server::{router, run_server, serve_on};
pub use remote_conn::ProtocolClient;
