//! JSON codec for the remote command protocol.
//!
//! Wire format (both directions):
//! ```text
//! <one UTF-8 JSON value>
//! ```
//! There is no length prefix and no delimiter.  A response is complete as soon
//! as the accumulated bytes parse as one JSON value, so the decoder has to
//! tell "not enough bytes yet" apart from "these bytes can never parse".
//!
//! # Known fragility
//!
//! "First successful parse wins" is a compatibility constraint imposed by the
//! remote endpoint, not a framing scheme to copy.  If the remote ever sent a
//! bare scalar such as `123` and the first read only delivered `12`, the
//! decoder would accept `12`.  Object and array responses are safe: a strict
//! prefix of an object can never itself be a complete object.

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{CommandEnvelope, ResponseEnvelope};

/// Errors that can occur during envelope encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The bytes are a valid prefix of a JSON value but the value has not
    /// ended yet.  Read more and try again.
    #[error("incomplete JSON value: {available} bytes buffered so far")]
    Incomplete { available: usize },

    /// The bytes can never become a valid value, no matter what follows.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The envelope could not be serialized.
    #[error("failed to serialize command: {0}")]
    Serialize(String),
}

impl ProtocolError {
    /// `true` when the caller should keep reading.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ProtocolError::Incomplete { .. })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`CommandEnvelope`] as compact UTF-8 JSON.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serialization fails, which in
/// practice only happens for maps with non-string keys.
///
/// # Examples
///
/// ```rust
/// use scene_relay_core::{encode_command, CommandEnvelope, CommandType};
///
/// let bytes = encode_command(&CommandEnvelope::new(CommandType::GetSceneInfo)).unwrap();
/// assert_eq!(bytes, br#"{"type":"get_scene_info","params":{}}"#);
/// ```
pub fn encode_command(command: &CommandEnvelope) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(command).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Decodes a [`CommandEnvelope`] from the full contents of `bytes`.
///
/// This is the remote's side of the exchange; the bridge only needs it for
/// stub endpoints in tests and tooling.
///
/// # Errors
///
/// - [`ProtocolError::Incomplete`] if `bytes` is a truncated JSON value.
/// - [`ProtocolError::MalformedPayload`] for syntax errors, unknown command
///   names, or a `params` field that is not an object.
pub fn decode_command(bytes: &[u8]) -> Result<CommandEnvelope, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|e| classify(e, bytes.len()))
}

/// Attempts to decode one complete response from the accumulated `bytes`.
///
/// Any JSON value is accepted, not only objects: the relay hands the remote's
/// answer back unchanged.
///
/// # Errors
///
/// - [`ProtocolError::Incomplete`] while `bytes` is an unfinished value
///   (including an empty or whitespace-only buffer).
/// - [`ProtocolError::MalformedPayload`] if `bytes` has a syntax error or
///   trailing data after the first value.
///
/// # Examples
///
/// ```rust
/// use scene_relay_core::decode_response;
///
/// assert!(decode_response(br#"{"status":"succ"#).unwrap_err().is_incomplete());
/// assert!(decode_response(br#"{"status":"success"}"#).unwrap().is_success());
/// ```
pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, ProtocolError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Ok(ResponseEnvelope::from_value(value)),
        Err(e) => {
            let err = classify(e, bytes.len());
            if err.is_incomplete() {
                trace!("response not complete yet ({} bytes)", bytes.len());
            }
            Err(err)
        }
    }
}

// ── Incremental boundary scanner ──────────────────────────────────────────────

/// Tracks JSON nesting across chunks so the read loop only runs a full
/// [`decode_response`] when the buffer could end a top-level value.
///
/// Re-parsing the whole buffer after every chunk costs O(n²) for an n-byte
/// response.  The scanner looks at each byte once: it follows string
/// literals (including `\"` escapes) and `{`/`[` depth, and reports a
/// candidate boundary whenever it is back at depth 0 outside a string after
/// seeing a value byte.  It never decides validity on its own; that is still
/// `decode_response`'s job.
///
/// ```rust
/// use scene_relay_core::ResponseScanner;
///
/// let mut scanner = ResponseScanner::new();
/// scanner.feed(br#"{"status":"succ"#);
/// assert!(!scanner.may_be_complete());
/// scanner.feed(br#"ess"}"#);
/// assert!(scanner.may_be_complete());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
    seen_value: bool,
    boundary: bool,
}

impl ResponseScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the next chunk of the response.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.boundary = false;
        for &byte in chunk {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        self.boundary = true;
                    }
                }
                continue;
            }

            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => {}
                b'"' => {
                    self.seen_value = true;
                    self.in_string = true;
                }
                b'{' | b'[' => {
                    self.seen_value = true;
                    self.depth += 1;
                }
                b'}' | b']' => {
                    // A stray closer at depth 0 is left for the parser to reject.
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        self.boundary = true;
                    }
                }
                _ => {
                    self.seen_value = true;
                    // Bare scalars (`true`, `42`) can end at any byte.
                    if self.depth == 0 {
                        self.boundary = true;
                    }
                }
            }
        }
    }

    /// `true` when the bytes fed so far may hold one complete value: a
    /// top-level value ended somewhere in the last chunk, or the scanner sits
    /// at depth 0 outside a string.
    pub fn may_be_complete(&self) -> bool {
        self.seen_value && (self.boundary || (self.depth == 0 && !self.in_string))
    }
}

fn classify(err: serde_json::Error, available: usize) -> ProtocolError {
    if err.is_eof() {
        ProtocolError::Incomplete { available }
    } else {
        ProtocolError::MalformedPayload(err.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{CommandType, Params};
    use serde_json::json;

    #[test]
    fn test_encode_command_writes_type_and_params() {
        // Arrange
        let mut params = Params::new();
        params.insert("name".to_string(), json!("Cube"));
        let command = CommandEnvelope::with_params(CommandType::GetObjectInfo, params);

        // Act
        let bytes = encode_command(&command).unwrap();

        // Assert
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"type": "get_object_info", "params": {"name": "Cube"}}));
    }

    #[test]
    fn test_encoded_command_is_valid_utf8() {
        let mut params = Params::new();
        params.insert("code".to_string(), json!("print('héllo → wörld')"));
        let bytes = encode_command(&CommandEnvelope::with_params(CommandType::ExecuteCode, params))
            .unwrap();

        assert!(std::str::from_utf8(&bytes).is_ok());
    }

    #[test]
    fn test_decode_response_complete_object() {
        let response = decode_response(br#"{"status":"success","result":{"objects":[]}}"#).unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_decode_response_empty_buffer_is_incomplete() {
        assert_eq!(
            decode_response(b""),
            Err(ProtocolError::Incomplete { available: 0 })
        );
    }

    #[test]
    fn test_decode_response_whitespace_only_is_incomplete() {
        assert!(decode_response(b"  \n").unwrap_err().is_incomplete());
    }

    #[test]
    fn test_decode_response_every_strict_prefix_of_object_is_incomplete() {
        // Arrange: a response with nested containers and an escaped string.
        let full = br#"{"status":"success","result":{"name":"Cube \"A\"","location":[0,1.5,-2]}}"#;

        // Act / Assert: no prefix may be mistaken for a complete response.
        for end in 0..full.len() {
            let result = decode_response(&full[..end]);
            assert!(
                matches!(result, Err(ProtocolError::Incomplete { .. })),
                "prefix of length {end} must be incomplete, got {result:?}"
            );
        }
        assert!(decode_response(full).is_ok());
    }

    #[test]
    fn test_decode_response_truncated_multibyte_char_is_incomplete() {
        let full = r#"{"message":"ü"}"#.as_bytes();
        // Cut inside the two-byte encoding of 'ü'.
        let cut = full.iter().position(|b| *b == 0xC3).unwrap() + 1;

        assert!(decode_response(&full[..cut]).unwrap_err().is_incomplete());
    }

    #[test]
    fn test_decode_response_syntax_error_is_malformed() {
        let result = decode_response(b"{\"status\" 42}");
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_response_trailing_value_is_malformed() {
        let result = decode_response(br#"{"status":"success"}{"status":"success"}"#);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_response_accepts_trailing_whitespace() {
        assert!(decode_response(b"{\"status\":\"error\",\"message\":\"x\"}\n").is_ok());
    }

    #[test]
    fn test_decode_command_rejects_non_object_params() {
        let result = decode_command(br#"{"type":"get_scene_info","params":[1]}"#);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    // ── ResponseScanner ───────────────────────────────────────────────────────

    #[test]
    fn test_scanner_large_response_signals_only_on_final_chunk() {
        // Arrange: a 4 MiB screenshot-like body, fed in read-loop sized chunks
        let image = "A".repeat(4 * 1024 * 1024);
        let body = serde_json::to_vec(&json!({"status": "success", "result": {"image": image}}))
            .unwrap();
        let chunks: Vec<&[u8]> = body.chunks(8192).collect();
        let mut scanner = ResponseScanner::new();

        // Act: count how often a full parse would be attempted
        let mut candidates = 0;
        for chunk in &chunks {
            scanner.feed(chunk);
            if scanner.may_be_complete() {
                candidates += 1;
            }
        }

        // Assert: one parse for the whole response, not one per chunk
        assert_eq!(candidates, 1);
        assert!(scanner.may_be_complete());
        assert!(decode_response(&body).unwrap().is_success());
    }

    #[test]
    fn test_scanner_ignores_braces_and_escaped_quotes_inside_strings() {
        let mut scanner = ResponseScanner::new();

        scanner.feed(br#"{"code":"d = {\"k\": [1]}"#);
        assert!(!scanner.may_be_complete());

        scanner.feed(br#""}"#);
        assert!(scanner.may_be_complete());
    }

    #[test]
    fn test_scanner_escape_split_across_chunks() {
        let mut scanner = ResponseScanner::new();

        scanner.feed(br#"{"m":"a\"#);
        scanner.feed(br#""}"#);
        // The quote was escaped, so the string and the object are still open.
        assert!(!scanner.may_be_complete());

        scanner.feed(br#""}"#);
        assert!(scanner.may_be_complete());
    }

    #[test]
    fn test_scanner_whitespace_only_is_not_complete() {
        let mut scanner = ResponseScanner::new();
        scanner.feed(b" \r\n\t");
        assert!(!scanner.may_be_complete());
    }

    #[test]
    fn test_scanner_flags_trailing_value_in_same_chunk() {
        // Complete object followed by the start of another: the parser must
        // get a chance to reject it.
        let mut scanner = ResponseScanner::new();
        scanner.feed(br#"{"status":"success"}{"x""#);
        assert!(scanner.may_be_complete());
    }

    #[test]
    fn test_scanner_every_strict_prefix_of_nested_object_is_not_complete() {
        let full = br#"{"status":"success","result":{"name":"Cube \"A\"","location":[0,1.5,-2]}}"#;
        for end in 1..full.len() {
            let mut scanner = ResponseScanner::new();
            scanner.feed(&full[..end]);
            assert!(!scanner.may_be_complete(), "prefix of length {end}");
        }
    }

    #[test]
    fn test_decode_command_truncated_is_incomplete() {
        assert!(decode_command(br#"{"type":"get_sce"#).unwrap_err().is_incomplete());
    }
}
