//! # scene-relay-core
//!
//! Shared library for scene-relay containing the command/response envelope
//! types and the JSON codec spoken to the remote scripting endpoint.
//!
//! This crate has zero dependencies on network sockets or async runtimes.
//! The bridge crate owns all I/O and uses these types at its edges.
//!
//! # Architecture overview (for beginners)
//!
//! scene-relay lets ordinary HTTP callers drive a 3D content-creation tool
//! that exposes a scripting endpoint on a raw TCP socket.  The endpoint speaks
//! a tiny protocol:
//!
//! ```text
//! caller ──HTTP──▶ bridge ──TCP: {"type": "...", "params": {...}}──▶ remote
//! caller ◀─HTTP─── bridge ◀─TCP: {"status": "success", ...}───────── remote
//! ```
//!
//! This crate defines both halves of that exchange:
//!
//! - **`protocol::messages`** – [`CommandType`], [`CommandEnvelope`] and
//!   [`ResponseEnvelope`].
//!
//! - **`protocol::codec`** – Turning envelopes into bytes and back.  The
//!   response side has no length prefix, so [`decode_response`] is also the
//!   function that decides whether a response is *complete yet*.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `scene_relay_core::CommandEnvelope` instead of the full module path.
pub use protocol::codec::{
    decode_command, decode_response, encode_command, ProtocolError, ResponseScanner,
};
pub use protocol::messages::{CommandEnvelope, CommandType, Params, ResponseEnvelope, ResponseStatus};
