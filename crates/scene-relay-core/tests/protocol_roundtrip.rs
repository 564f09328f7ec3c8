//! Integration tests for the scene-relay-core codec.
//!
//! These tests exercise the public API the way the bridge and a stub remote
//! use it together: the bridge encodes a command, the remote decodes it, the
//! remote answers, and the bridge feeds the answer to `decode_response` chunk
//! by chunk.

use scene_relay_core::{
    decode_command, decode_response, encode_command, CommandEnvelope, CommandType, Params,
    ProtocolError,
};
use serde_json::{json, Value};

/// Encodes a command on the "bridge" side and decodes it on the "remote" side.
fn over_the_wire(command: &CommandEnvelope) -> CommandEnvelope {
    let bytes = encode_command(command).expect("encode must succeed");
    decode_command(&bytes).expect("decode must succeed")
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params fixture must be an object, got {other}"),
    }
}

#[test]
fn test_roundtrip_command_preserves_type_and_params() {
    let original = CommandEnvelope::with_params(
        CommandType::DownloadPolyhavenAsset,
        params(json!({
            "asset_id": "rock_01",
            "asset_type": "textures",
            "resolution": "2k",
        })),
    );

    let decoded = over_the_wire(&original);

    assert_eq!(decoded.command_type, CommandType::DownloadPolyhavenAsset);
    assert_eq!(decoded.params, original.params);
}

#[test]
fn test_roundtrip_key_order_is_irrelevant_to_equality() {
    // The remote may rebuild the map in any order; comparison is by key.
    let original = CommandEnvelope::with_params(
        CommandType::SearchSketchfabModels,
        params(json!({"query": "chair", "count": 5, "downloadable": false})),
    );
    let reordered: CommandEnvelope = serde_json::from_value(json!({
        "params": {"downloadable": false, "count": 5, "query": "chair"},
        "type": "search_sketchfab_models",
    }))
    .unwrap();

    let decoded = over_the_wire(&original);

    assert_eq!(
        Value::Object(decoded.params),
        Value::Object(reordered.params)
    );
}

#[test]
fn test_roundtrip_nested_image_payload() {
    // Image submissions carry [suffix, base64] pairs.
    let original = CommandEnvelope::with_params(
        CommandType::CreateRodinJob,
        params(json!({
            "images": [[".png", "iVBORw0KGgo="], [".jpg", "/9j/4AAQ"]],
            "bbox_condition": [1.0, 1.0, 2.0],
        })),
    );

    assert_eq!(over_the_wire(&original), original);
}

#[test]
fn test_every_command_type_survives_the_wire() {
    for command_type in CommandType::ALL {
        let decoded = over_the_wire(&CommandEnvelope::new(command_type));
        assert_eq!(decoded.command_type, command_type);
        assert!(decoded.params.is_empty());
    }
}

#[test]
fn test_response_split_in_two_chunks_only_parses_once_complete() {
    // Arrange: the remote's answer arrives in two reads.
    let body = br#"{"status":"success","result":{"name":"Cube","location":[0,0,0]}}"#;
    let (first, second) = body.split_at(17);
    let mut buffer = Vec::new();

    // Act: first chunk alone
    buffer.extend_from_slice(first);
    let after_first = decode_response(&buffer);

    // Act: both chunks
    buffer.extend_from_slice(second);
    let after_second = decode_response(&buffer).expect("full body must parse");

    // Assert
    assert_eq!(
        after_first,
        Err(ProtocolError::Incomplete {
            available: first.len()
        })
    );
    assert_eq!(
        after_second.as_value(),
        &json!({"status": "success", "result": {"name": "Cube", "location": [0, 0, 0]}})
    );
}

#[test]
fn test_remote_error_envelope_is_preserved_verbatim() {
    let body = br#"{"status":"error","message":"Object not found: Sphere","extra":1}"#;

    let response = decode_response(body).unwrap();

    assert!(!response.is_success());
    assert_eq!(response.message(), Some("Object not found: Sphere"));
    assert_eq!(response.as_value()["extra"], json!(1));
}
