//! Per-command request records accepted by the HTTP surface.
//!
//! Every POST route takes a JSON object body.  Each body has its own record
//! type below, and [`RelayRequest`] is the tagged union over all of them:
//! the façade works with typed fields and only flattens them into an untyped
//! [`scene_relay_core::Params`] map when the command envelope is built.
//!
//! # Why is every field an `Option`?
//!
//! Required-field checks produce specific messages (`"code is required"`)
//! and treat empty strings as missing.  Serde would reject a missing field
//! with a generic error, so presence is checked in the application layer
//! instead.
//!
//! Unknown fields are ignored.  Fields whose shape belongs to the remote
//! (`categories`, `bbox_condition`) are kept as raw JSON and passed through.

use scene_relay_core::CommandType;
use serde::Deserialize;
use serde_json::Value;

/// Screenshot size used when the caller does not supply `max_size`.
pub const DEFAULT_SCREENSHOT_MAX_SIZE: u32 = 800;

// ── Request bodies ────────────────────────────────────────────────────────────

/// Body of `POST /get_object_info`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObjectInfoRequest {
    pub object_name: Option<String>,
}

/// Body of `POST /get_viewport_screenshot`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScreenshotRequest {
    /// Longest edge of the returned image in pixels.
    pub max_size: Option<u32>,
}

/// Body of `POST /execute_blender_code`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecuteCodeRequest {
    pub code: Option<String>,
}

/// Body of `POST /get_polyhaven_categories`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolyhavenCategoriesRequest {
    /// `"hdris"`, `"textures"`, `"models"` or `"all"`; not validated here.
    pub asset_type: Option<String>,
}

/// Body of `POST /search_polyhaven_assets`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchPolyhavenRequest {
    pub asset_type: Option<String>,
    pub categories: Option<Value>,
}

/// Body of `POST /download_polyhaven_asset`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadPolyhavenRequest {
    pub asset_id: Option<String>,
    pub asset_type: Option<String>,
    pub resolution: Option<String>,
    pub file_format: Option<String>,
}

/// Body of `POST /set_texture`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SetTextureRequest {
    pub object_name: Option<String>,
    /// Poly Haven texture asset id, previously downloaded on the remote.
    pub texture_id: Option<String>,
}

/// Body of `POST /generate_hyper3d_model_via_text`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextModelRequest {
    pub text_prompt: Option<String>,
    pub bbox_condition: Option<Value>,
}

/// Body of `POST /generate_hyper3d_model_via_images`.
///
/// Local paths win over URLs when both are given.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageModelRequest {
    /// Paths on the bridge host's filesystem.
    pub input_image_paths: Option<Vec<String>>,
    pub input_image_urls: Option<Vec<String>>,
    pub bbox_condition: Option<Value>,
}

/// Body of `POST /poll_rodin_job_status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollJobRequest {
    pub request_id: Option<String>,
    pub subscription_key: Option<String>,
}

/// Body of `POST /import_generated_asset`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportAssetRequest {
    /// Name to give the imported object in the scene.
    pub name: Option<String>,
    pub request_id: Option<String>,
    pub task_uuid: Option<String>,
}

/// Body of `POST /search_sketchfab_models`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSketchfabRequest {
    pub query: Option<String>,
    pub categories: Option<Value>,
    pub count: Option<u32>,
    /// Forwarded whenever present, `false` included.
    pub downloadable: Option<bool>,
}

/// Body of `POST /download_sketchfab_model`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadSketchfabRequest {
    pub uid: Option<String>,
}

// ── Tagged union ──────────────────────────────────────────────────────────────

/// One external call, already routed to its command.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayRequest {
    SceneInfo,
    ObjectInfo(ObjectInfoRequest),
    ViewportScreenshot(ScreenshotRequest),
    ExecuteCode(ExecuteCodeRequest),
    PolyhavenStatus,
    PolyhavenCategories(PolyhavenCategoriesRequest),
    SearchPolyhavenAssets(SearchPolyhavenRequest),
    DownloadPolyhavenAsset(DownloadPolyhavenRequest),
    SetTexture(SetTextureRequest),
    Hyper3dStatus,
    ModelFromText(TextModelRequest),
    ModelFromImages(ImageModelRequest),
    PollRodinJob(PollJobRequest),
    ImportGeneratedAsset(ImportAssetRequest),
    SketchfabStatus,
    SearchSketchfabModels(SearchSketchfabRequest),
    DownloadSketchfabModel(DownloadSketchfabRequest),
}

impl RelayRequest {
    /// The protocol command this request is sent as.
    ///
    /// Text- and image-based generation share `create_rodin_job`.
    pub fn command_type(&self) -> CommandType {
        match self {
            RelayRequest::SceneInfo => CommandType::GetSceneInfo,
            RelayRequest::ObjectInfo(_) => CommandType::GetObjectInfo,
            RelayRequest::ViewportScreenshot(_) => CommandType::GetViewportScreenshot,
            RelayRequest::ExecuteCode(_) => CommandType::ExecuteCode,
            RelayRequest::PolyhavenStatus => CommandType::GetPolyhavenStatus,
            RelayRequest::PolyhavenCategories(_) => CommandType::GetPolyhavenCategories,
            RelayRequest::SearchPolyhavenAssets(_) => CommandType::SearchPolyhavenAssets,
            RelayRequest::DownloadPolyhavenAsset(_) => CommandType::DownloadPolyhavenAsset,
            RelayRequest::SetTexture(_) => CommandType::SetTexture,
            RelayRequest::Hyper3dStatus => CommandType::GetHyper3dStatus,
            RelayRequest::ModelFromText(_) | RelayRequest::ModelFromImages(_) => {
                CommandType::CreateRodinJob
            }
            RelayRequest::PollRodinJob(_) => CommandType::PollRodinJobStatus,
            RelayRequest::ImportGeneratedAsset(_) => CommandType::ImportGeneratedAsset,
            RelayRequest::SketchfabStatus => CommandType::GetSketchfabStatus,
            RelayRequest::SearchSketchfabModels(_) => CommandType::SearchSketchfabModels,
            RelayRequest::DownloadSketchfabModel(_) => CommandType::DownloadSketchfabModel,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
