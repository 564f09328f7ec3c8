//! Envelope types exchanged with the remote scripting endpoint.
//!
//! A request is a [`CommandEnvelope`] (`{"type": ..., "params": {...}}`) and
//! the answer is a single JSON value, normally `{"status": "success"|"error", ...}`,
//! wrapped in a [`ResponseEnvelope`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped parameter mapping carried inside a [`CommandEnvelope`].
///
/// Per-command parameters are typed at the bridge boundary and only flattened
/// into this map when the envelope is built.
pub type Params = Map<String, Value>;

// ── Command type codes ────────────────────────────────────────────────────────

/// All command names understood by the remote endpoint.
///
/// The wire representation is the snake_case string in `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    // Scene inspection and scripting
    GetSceneInfo,
    GetObjectInfo,
    GetViewportScreenshot,
    ExecuteCode,
    // Poly Haven asset catalog
    GetPolyhavenStatus,
    GetPolyhavenCategories,
    SearchPolyhavenAssets,
    DownloadPolyhavenAsset,
    SetTexture,
    // Hyper3D Rodin generation workflow
    #[serde(rename = "get_hyper3d_status")]
    GetHyper3dStatus,
    CreateRodinJob,
    PollRodinJobStatus,
    ImportGeneratedAsset,
    // Sketchfab model catalog
    GetSketchfabStatus,
    SearchSketchfabModels,
    DownloadSketchfabModel,
}

impl CommandType {
    /// Every command, in declaration order.
    pub const ALL: [CommandType; 16] = [
        CommandType::GetSceneInfo,
        CommandType::GetObjectInfo,
        CommandType::GetViewportScreenshot,
        CommandType::ExecuteCode,
        CommandType::GetPolyhavenStatus,
        CommandType::GetPolyhavenCategories,
        CommandType::SearchPolyhavenAssets,
        CommandType::DownloadPolyhavenAsset,
        CommandType::SetTexture,
        CommandType::GetHyper3dStatus,
        CommandType::CreateRodinJob,
        CommandType::PollRodinJobStatus,
        CommandType::ImportGeneratedAsset,
        CommandType::GetSketchfabStatus,
        CommandType::SearchSketchfabModels,
        CommandType::DownloadSketchfabModel,
    ];

    /// Returns the wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::GetSceneInfo => "get_scene_info",
            CommandType::GetObjectInfo => "get_object_info",
            CommandType::GetViewportScreenshot => "get_viewport_screenshot",
            CommandType::ExecuteCode => "execute_code",
            CommandType::GetPolyhavenStatus => "get_polyhaven_status",
            CommandType::GetPolyhavenCategories => "get_polyhaven_categories",
            CommandType::SearchPolyhavenAssets => "search_polyhaven_assets",
            CommandType::DownloadPolyhavenAsset => "download_polyhaven_asset",
            CommandType::SetTexture => "set_texture",
            CommandType::GetHyper3dStatus => "get_hyper3d_status",
            CommandType::CreateRodinJob => "create_rodin_job",
            CommandType::PollRodinJobStatus => "poll_rodin_job_status",
            CommandType::ImportGeneratedAsset => "import_generated_asset",
            CommandType::GetSketchfabStatus => "get_sketchfab_status",
            CommandType::SearchSketchfabModels => "search_sketchfab_models",
            CommandType::DownloadSketchfabModel => "download_sketchfab_model",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Command envelope ──────────────────────────────────────────────────────────

/// The `{type, params}` request written to the remote, one per connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Which command the remote should run.
    #[serde(rename = "type")]
    pub command_type: CommandType,
    /// Command-specific parameters; serialized as `{}` when empty.
    #[serde(default)]
    pub params: Params,
}

impl CommandEnvelope {
    /// Builds an envelope with no parameters.
    pub fn new(command_type: CommandType) -> Self {
        Self {
            command_type,
            params: Params::new(),
        }
    }

    /// Builds an envelope from an already-assembled parameter map.
    pub fn with_params(command_type: CommandType, params: Params) -> Self {
        Self {
            command_type,
            params,
        }
    }
}

// ── Response envelope ─────────────────────────────────────────────────────────

/// The `status` discriminator of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// One complete JSON value returned by the remote (or synthesized locally
/// when the exchange failed).
///
/// The value is kept verbatim: the bridge forwards remote responses without
/// touching their fields, so this is a transparent wrapper rather than a
/// typed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseEnvelope(Value);

impl ResponseEnvelope {
    /// Wraps a raw JSON value.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Builds the locally-generated `{"status": "error", "message": ...}` shape.
    pub fn error(message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("status".to_string(), Value::from("error"));
        body.insert("message".to_string(), Value::from(message.into()));
        Self(Value::Object(body))
    }

    /// Adds an extra top-level field.  No-op when the value is not an object.
    pub fn with_detail(mut self, key: &str, detail: Value) -> Self {
        if let Value::Object(body) = &mut self.0 {
            body.insert(key.to_string(), detail);
        }
        self
    }

    /// Parsed `status` field, or `None` if absent or not one of the two
    /// known values.
    pub fn status(&self) -> Option<ResponseStatus> {
        self.0
            .get("status")
            .cloned()
            .and_then(|s| serde_json::from_value(s).ok())
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some(ResponseStatus::Success)
    }

    /// The `message` field of an error response, if any.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
