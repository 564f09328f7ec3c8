//! HTTP surface: one route per remote command.
//!
//! # Routes
//!
//! Status and scene queries are `GET` routes with no body.  Everything else
//! is a `POST` route taking a JSON object body, decoded into the matching
//! record from [`crate::domain::requests`].
//!
//! # Status codes
//!
//! | Situation                                   | Status | Body                        |
//! |---------------------------------------------|--------|-----------------------------|
//! | command forwarded (remote success or error) | 200    | remote envelope, verbatim   |
//! | remote unreachable / bad response           | 200    | locally-built error envelope|
//! | missing field, unreadable image             | 400    | `{"status":"error",...}`    |
//! | body is not valid JSON                      | 400    | `{"status":"error",...}`    |
//!
//! An empty `POST` body is treated as `{}`.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info};

use scene_relay_core::ResponseEnvelope;

use crate::application::relay_service::{RelayOutcome, RelayService};
use crate::domain::config::BridgeConfig;
use crate::domain::requests::RelayRequest;
use crate::infrastructure::image_files::FsImageLoader;
use crate::infrastructure::remote_conn::ProtocolClient;

/// Shared by every handler.
#[derive(Clone)]
struct AppState {
    service: Arc<RelayService>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Wires the production relay service: a TCP [`ProtocolClient`] for the
/// configured remote plus filesystem image loading.
pub fn build_service(config: &BridgeConfig) -> Arc<RelayService> {
    let client = ProtocolClient::new(config.remote.clone(), config.limits);
    Arc::new(RelayService::new(Arc::new(client), Arc::new(FsImageLoader)))
}

/// Builds the router with all command routes.
pub fn router(service: Arc<RelayService>) -> Router {
    Router::new()
        // ── Scene ──
        .route("/get_scene_info", get(|State(s): State<AppState>| relay(s, RelayRequest::SceneInfo)))
        .route(
            "/get_object_info",
            post(|State(s): State<AppState>, body: Bytes| relay_body(s, body, RelayRequest::ObjectInfo)),
        )
        .route(
            "/get_viewport_screenshot",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::ViewportScreenshot)
            }),
        )
        .route(
            "/execute_blender_code",
            post(|State(s): State<AppState>, body: Bytes| relay_body(s, body, RelayRequest::ExecuteCode)),
        )
        // ── Poly Haven ──
        .route(
            "/get_polyhaven_status",
            get(|State(s): State<AppState>| relay(s, RelayRequest::PolyhavenStatus)),
        )
        .route(
            "/get_polyhaven_categories",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::PolyhavenCategories)
            }),
        )
        .route(
            "/search_polyhaven_assets",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::SearchPolyhavenAssets)
            }),
        )
        .route(
            "/download_polyhaven_asset",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::DownloadPolyhavenAsset)
            }),
        )
        .route(
            "/set_texture",
            post(|State(s): State<AppState>, body: Bytes| relay_body(s, body, RelayRequest::SetTexture)),
        )
        // ── Hyper3D Rodin ──
        .route(
            "/get_hyper3d_status",
            get(|State(s): State<AppState>| relay(s, RelayRequest::Hyper3dStatus)),
        )
        .route(
            "/generate_hyper3d_model_via_text",
            post(|State(s): State<AppState>, body: Bytes| relay_body(s, body, RelayRequest::ModelFromText)),
        )
        .route(
            "/generate_hyper3d_model_via_images",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::ModelFromImages)
            }),
        )
        .route(
            "/poll_rodin_job_status",
            post(|State(s): State<AppState>, body: Bytes| relay_body(s, body, RelayRequest::PollRodinJob)),
        )
        .route(
            "/import_generated_asset",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::ImportGeneratedAsset)
            }),
        )
        // ── Sketchfab ──
        .route(
            "/get_sketchfab_status",
            get(|State(s): State<AppState>| relay(s, RelayRequest::SketchfabStatus)),
        )
        .route(
            "/search_sketchfab_models",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::SearchSketchfabModels)
            }),
        )
        .route(
            "/download_sketchfab_model",
            post(|State(s): State<AppState>, body: Bytes| {
                relay_body(s, body, RelayRequest::DownloadSketchfabModel)
            }),
        )
        .with_state(AppState { service })
}

/// Binds `config.http_bind_addr` and serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, no
/// permission) or the server fails while running.
pub async fn run_server<F>(config: BridgeConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.http_bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_bind_addr))?;

    serve_on(listener, &config, shutdown).await
}

/// Serves on an already-bound listener.  Used directly by tests that bind
/// port 0.
pub async fn serve_on<F>(listener: TcpListener, config: &BridgeConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener
        .local_addr()
        .context("failed to read HTTP listener address")?;
    info!("HTTP relay listening on {local_addr}, forwarding to {}", config.remote);

    axum::serve(listener, router(build_service(config)))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server terminated with an error")?;

    info!("HTTP relay stopped");
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn relay(state: AppState, request: RelayRequest) -> Response {
    match state.service.handle(request).await {
        RelayOutcome::Forwarded(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        RelayOutcome::Rejected(envelope) => (StatusCode::BAD_REQUEST, Json(envelope)).into_response(),
    }
}

async fn relay_body<T, F>(state: AppState, body: Bytes, wrap: F) -> Response
where
    T: DeserializeOwned + Default,
    F: FnOnce(T) -> RelayRequest,
{
    match parse_body::<T>(&body) {
        Ok(fields) => relay(state, wrap(fields)).await,
        Err(message) => {
            debug!("rejecting request body: {message}");
            (StatusCode::BAD_REQUEST, Json(ResponseEnvelope::error(message))).into_response()
        }
    }
}

/// Decodes a request body.  Empty, whitespace-only and `null` bodies decode
/// as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON body: {e}"))?;
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| format!("invalid request body: {e}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
