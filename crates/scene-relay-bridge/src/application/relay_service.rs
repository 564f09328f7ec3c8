//! Relay service – the use case behind every HTTP route.
//!
//! # How a request flows
//!
//! ```text
//! RelayRequest ──shape_command──▶ CommandEnvelope ──CommandExecutor──▶ ResponseEnvelope
//!       │
//!       └── ShapeError ──▶ Rejected({"status":"error","message":...})
//! ```
//!
//! The service never sees sockets.  It depends on two traits:
//!
//! - [`CommandExecutor`] sends one command to the remote and always returns
//!   an envelope (failures become error envelopes, never `Err`).
//! - [`ImageLoader`] reads local image files for image-based generation.
//!
//! Both are injected as `Arc<dyn ...>` so tests can substitute mocks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use scene_relay_core::{CommandEnvelope, ResponseEnvelope};

use crate::application::command_shaping::{shape_command, ImageLoader};
use crate::domain::requests::RelayRequest;

/// Sends one command to the remote and returns whatever came back.
///
/// Implementations must never fail: transport and parse problems are
/// reported as `{"status": "error", "message": ...}` envelopes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: CommandEnvelope) -> ResponseEnvelope;
}

/// The result of handling one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The command reached the executor; the envelope is its answer, which
    /// may itself be an error envelope.
    Forwarded(ResponseEnvelope),
    /// The request failed validation; nothing was sent.
    Rejected(ResponseEnvelope),
}

impl RelayOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RelayOutcome::Rejected(_))
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        match self {
            RelayOutcome::Forwarded(envelope) | RelayOutcome::Rejected(envelope) => envelope,
        }
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            RelayOutcome::Forwarded(envelope) | RelayOutcome::Rejected(envelope) => envelope,
        }
    }
}

/// Validates requests and forwards them to the remote.
///
/// Holds no per-request state, so one instance is shared by all HTTP
/// handlers.
pub struct RelayService {
    executor: Arc<dyn CommandExecutor>,
    images: Arc<dyn ImageLoader>,
}

impl RelayService {
    pub fn new(executor: Arc<dyn CommandExecutor>, images: Arc<dyn ImageLoader>) -> Self {
        Self { executor, images }
    }

    /// Handles one request end to end.
    pub async fn handle(&self, request: RelayRequest) -> RelayOutcome {
        let command = match shape_command(&request, self.images.as_ref()).await {
            Ok(command) => command,
            Err(e) => {
                warn!(command = %request.command_type(), error = %e, "request rejected");
                return RelayOutcome::Rejected(ResponseEnvelope::error(e.to_string()));
            }
        };

        debug!(
            command = %command.command_type,
            params = command.params.len(),
            "forwarding command"
        );
        let response = self.executor.execute(command).await;

        if !response.is_success() {
            debug!(message = ?response.message(), "remote returned an error envelope");
        }
        RelayOutcome::Forwarded(response)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requests::{ExecuteCodeRequest, ImageModelRequest, ObjectInfoRequest};
    use scene_relay_core::CommandType;
    use serde_json::json;

    struct NoImages;

    #[async_trait]
    impl ImageLoader for NoImages {
        async fn read(&self, _path: &str) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not found"))
        }
    }

    fn service_with(executor: MockCommandExecutor) -> RelayService {
        RelayService::new(Arc::new(executor), Arc::new(NoImages))
    }

    #[tokio::test]
    async fn test_valid_request_is_forwarded_with_shaped_params() {
        // Arrange
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|cmd| {
                cmd.command_type == CommandType::GetObjectInfo
                    && cmd.params.get("name") == Some(&json!("Cube"))
            })
            .times(1)
            .returning(|_| {
                ResponseEnvelope::from_value(json!({"status": "success", "result": {"name": "Cube"}}))
            });
        let service = service_with(executor);

        // Act
        let outcome = service
            .handle(RelayRequest::ObjectInfo(ObjectInfoRequest {
                object_name: Some("Cube".to_string()),
            }))
            .await;

        // Assert
        assert!(!outcome.is_rejected());
        assert_eq!(
            outcome.into_envelope().into_value(),
            json!({"status": "success", "result": {"name": "Cube"}})
        );
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_executor() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().times(0);
        let service = service_with(executor);

        let outcome = service
            .handle(RelayRequest::ExecuteCode(ExecuteCodeRequest::default()))
            .await;

        assert!(outcome.is_rejected());
        assert_eq!(
            outcome.envelope().as_value(),
            &json!({"status": "error", "message": "code is required"})
        );
    }

    #[tokio::test]
    async fn test_unreadable_image_is_rejected_without_executing() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().times(0);
        let service = service_with(executor);

        let outcome = service
            .handle(RelayRequest::ModelFromImages(ImageModelRequest {
                input_image_paths: Some(vec!["/nowhere/front.png".to_string()]),
                ..Default::default()
            }))
            .await;

        assert!(outcome.is_rejected());
        let message = outcome.envelope().message().unwrap_or_default().to_string();
        assert!(message.contains("/nowhere/front.png"), "got: {message}");
    }

    #[tokio::test]
    async fn test_remote_error_envelope_is_forwarded_not_rejected() {
        // Arrange: the executor reports a transport failure as an envelope
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| ResponseEnvelope::error("Connection refused"));
        let service = service_with(executor);

        // Act
        let outcome = service.handle(RelayRequest::SceneInfo).await;

        // Assert
        assert!(!outcome.is_rejected());
        assert_eq!(outcome.envelope().message(), Some("Connection refused"));
    }

    #[tokio::test]
    async fn test_parameterless_command_sends_empty_params() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|cmd| cmd.command_type == CommandType::GetSceneInfo && cmd.params.is_empty())
            .times(1)
            .returning(|_| ResponseEnvelope::from_value(json!({"status": "success", "result": {}})));
        let service = service_with(executor);

        let outcome = service.handle(RelayRequest::SceneInfo).await;

        assert!(outcome.envelope().is_success());
    }
}
