//! Validation and command shaping.
//!
//! [`shape_command`] turns one typed [`RelayRequest`] into the
//! [`CommandEnvelope`] the remote expects, or explains which field is
//! missing.  It is the only place where request records are flattened into
//! the untyped `params` map.
//!
//! # Presence rules
//!
//! A field counts as present when it holds a non-empty value: `""`, `[]`,
//! `{}`, `0`, `false` and `null` are all treated as absent.  Absent optional
//! fields are *omitted* from `params`, never sent as `null`.  The one
//! exception is Sketchfab's `downloadable`, which is forwarded whenever the
//! caller set it, `false` included.
//!
//! # Translation table
//!
//! ```text
//! ObjectInfo          object_name            → get_object_info { name }
//! ViewportScreenshot  max_size? (800)        → get_viewport_screenshot { max_size }
//! ExecuteCode         code                   → execute_code { code }
//! ModelFromText       text_prompt, bbox?     → create_rodin_job { text_prompt, bbox_condition? }
//! ModelFromImages     paths | urls, bbox?    → create_rodin_job { images, bbox_condition? }
//! ...                 (see the match below for the full catalogue)
//! ```

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use thiserror::Error;

use scene_relay_core::{CommandEnvelope, Params};

use crate::domain::requests::{RelayRequest, DEFAULT_SCREENSHOT_MAX_SIZE};

// ── Error type ────────────────────────────────────────────────────────────────

/// Reasons a request is rejected before the remote is contacted.
///
/// The `Display` text is exactly the `message` returned to the caller.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// A single required field is absent or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// At least one of two jointly required fields is absent.
    #[error("{0} and {1} are required")]
    MissingFields(&'static str, &'static str),

    /// Neither of two alternative fields was supplied.
    #[error("Either {0} or {1} is required")]
    MissingAlternative(&'static str, &'static str),

    /// A local image named in `input_image_paths` could not be read.
    #[error("failed to read image '{path}': {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Image loading seam ────────────────────────────────────────────────────────

/// Reads image files named by the caller.
///
/// The infrastructure implementation reads the local filesystem; tests use
/// an in-memory map.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Returns the raw bytes of the file at `path`.
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// One image prepared for a generation job.
///
/// Sent on the wire as a two-element list: `[".png", "<base64>"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// File extension with a leading dot, or empty if the path has none.
    pub suffix: String,
    /// Standard (RFC 4648, padded) base64 of the file contents.
    pub data_base64: String,
}

impl EncodedImage {
    pub fn from_file_bytes(path: &str, bytes: &[u8]) -> Self {
        let suffix = Path::new(path)
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        Self {
            suffix,
            data_base64: STANDARD.encode(bytes),
        }
    }
}

impl From<EncodedImage> for Value {
    fn from(image: EncodedImage) -> Self {
        Value::Array(vec![
            Value::from(image.suffix),
            Value::from(image.data_base64),
        ])
    }
}

// ── Shaping ───────────────────────────────────────────────────────────────────

/// Validates `request` and builds the command envelope for it.
///
/// Image files are only read after all other validation has passed, and a
/// read failure aborts the whole request.
///
/// # Errors
///
/// Returns a [`ShapeError`] describing the first problem found.  The caller
/// must not contact the remote when this fails.
pub async fn shape_command(
    request: &RelayRequest,
    images: &dyn ImageLoader,
) -> Result<CommandEnvelope, ShapeError> {
    let mut params = Params::new();

    match request {
        RelayRequest::SceneInfo
        | RelayRequest::PolyhavenStatus
        | RelayRequest::Hyper3dStatus
        | RelayRequest::SketchfabStatus => {}

        RelayRequest::ObjectInfo(req) => {
            // The remote calls this field `name`.
            let name = required(&req.object_name, "object_name")?;
            put(&mut params, "name", name);
        }

        RelayRequest::ViewportScreenshot(req) => {
            let max_size = req.max_size.unwrap_or(DEFAULT_SCREENSHOT_MAX_SIZE);
            put(&mut params, "max_size", max_size);
        }

        RelayRequest::ExecuteCode(req) => {
            put(&mut params, "code", required(&req.code, "code")?);
        }

        RelayRequest::PolyhavenCategories(req) => {
            put(&mut params, "asset_type", required(&req.asset_type, "asset_type")?);
        }

        RelayRequest::SearchPolyhavenAssets(req) => {
            put_present(&mut params, "asset_type", &req.asset_type);
            put_truthy(&mut params, "categories", &req.categories);
        }

        RelayRequest::DownloadPolyhavenAsset(req) => {
            let (asset_id, asset_type) = required_pair(
                (&req.asset_id, "asset_id"),
                (&req.asset_type, "asset_type"),
            )?;
            put(&mut params, "asset_id", asset_id);
            put(&mut params, "asset_type", asset_type);
            put_present(&mut params, "resolution", &req.resolution);
            put_present(&mut params, "file_format", &req.file_format);
        }

        RelayRequest::SetTexture(req) => {
            let (object_name, texture_id) = required_pair(
                (&req.object_name, "object_name"),
                (&req.texture_id, "texture_id"),
            )?;
            put(&mut params, "object_name", object_name);
            put(&mut params, "texture_id", texture_id);
        }

        RelayRequest::ModelFromText(req) => {
            put(&mut params, "text_prompt", required(&req.text_prompt, "text_prompt")?);
            put_truthy(&mut params, "bbox_condition", &req.bbox_condition);
        }

        RelayRequest::ModelFromImages(req) => {
            let paths = non_empty_list(&req.input_image_paths);
            let urls = non_empty_list(&req.input_image_urls);
            let images_value = match (paths, urls) {
                (Some(paths), _) => load_images(paths, images).await?,
                (None, Some(urls)) => Value::from(urls.to_vec()),
                (None, None) => {
                    return Err(ShapeError::MissingAlternative(
                        "input_image_paths",
                        "input_image_urls",
                    ))
                }
            };
            put(&mut params, "images", images_value);
            put_truthy(&mut params, "bbox_condition", &req.bbox_condition);
        }

        RelayRequest::PollRodinJob(req) => {
            either(
                (&req.request_id, "request_id"),
                (&req.subscription_key, "subscription_key"),
            )?;
            put_present(&mut params, "request_id", &req.request_id);
            put_present(&mut params, "subscription_key", &req.subscription_key);
        }

        RelayRequest::ImportGeneratedAsset(req) => {
            let name = required(&req.name, "name")?;
            either((&req.request_id, "request_id"), (&req.task_uuid, "task_uuid"))?;
            put(&mut params, "name", name);
            put_present(&mut params, "request_id", &req.request_id);
            put_present(&mut params, "task_uuid", &req.task_uuid);
        }

        RelayRequest::SearchSketchfabModels(req) => {
            put(&mut params, "query", required(&req.query, "query")?);
            put_truthy(&mut params, "categories", &req.categories);
            if let Some(count) = req.count.filter(|c| *c > 0) {
                put(&mut params, "count", count);
            }
            if let Some(downloadable) = req.downloadable {
                put(&mut params, "downloadable", downloadable);
            }
        }

        RelayRequest::DownloadSketchfabModel(req) => {
            put(&mut params, "uid", required(&req.uid, "uid")?);
        }
    }

    Ok(CommandEnvelope::with_params(request.command_type(), params))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn load_images(paths: &[String], images: &dyn ImageLoader) -> Result<Value, ShapeError> {
    let mut encoded = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = images
            .read(path)
            .await
            .map_err(|source| ShapeError::ImageRead {
                path: path.clone(),
                source,
            })?;
        encoded.push(Value::from(EncodedImage::from_file_bytes(path, &bytes)));
    }
    Ok(Value::Array(encoded))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ShapeError> {
    present(value).ok_or(ShapeError::MissingField(field))
}

fn required_pair<'a>(
    first: (&'a Option<String>, &'static str),
    second: (&'a Option<String>, &'static str),
) -> Result<(&'a str, &'a str), ShapeError> {
    match (present(first.0), present(second.0)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ShapeError::MissingFields(first.1, second.1)),
    }
}

fn either(
    first: (&Option<String>, &'static str),
    second: (&Option<String>, &'static str),
) -> Result<(), ShapeError> {
    if present(first.0).is_none() && present(second.0).is_none() {
        return Err(ShapeError::MissingAlternative(first.1, second.1));
    }
    Ok(())
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<&[String]> {
    value.as_deref().filter(|list| !list.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn put(params: &mut Params, key: &str, value: impl Into<Value>) {
    params.insert(key.to_string(), value.into());
}

fn put_present(params: &mut Params, key: &str, value: &Option<String>) {
    if let Some(value) = present(value) {
        put(params, key, value);
    }
}

fn put_truthy(params: &mut Params, key: &str, value: &Option<Value>) {
    if let Some(value) = value.as_ref().filter(|v| is_truthy(v)) {
        put(params, key, value.clone());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
