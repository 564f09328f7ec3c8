//! Local filesystem access for image-based generation requests.

use async_trait::async_trait;
use tracing::debug;

use crate::application::command_shaping::ImageLoader;

/// Reads images from the bridge host's filesystem.
///
/// Paths are used exactly as given; relative paths resolve against the
/// bridge's working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let bytes = tokio::fs::read(path).await?;
        debug!(path, bytes = bytes.len(), "read image file");
        Ok(bytes)
    }
}
