//! Protocol module containing envelope types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_command, decode_response, encode_command, ProtocolError, ResponseScanner};
pub use messages::*;
