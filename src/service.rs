//! Boundary between the orchestrators and the generative media service.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::AppResult,
    media::ReferenceImage,
    models::{AspectRatio, VideoAspectRatio, VideoResolution},
};

#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub aspect_ratio: VideoAspectRatio,
    pub resolution: VideoResolution,
    pub reference: Option<ReferenceImage>,
}

/// Handle of a long-running video generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOperation {
    pub name: String,
    pub done: bool,
    pub video_uri: Option<String>,
    pub error: Option<String>,
}

/// Every call returns media or a categorized [`AppError`](crate::error::AppError).
/// Images come back as base64 data URLs.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Text-to-image, one image.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> AppResult<String>;

    /// Edit-style generation anchored on one or more reference images.
    async fn edit_image(&self, prompt: &str, references: &[ReferenceImage]) -> AppResult<String>;

    /// Structured text generation constrained by a response schema.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> AppResult<String>;

    /// Structured analysis of a single image.
    async fn analyze_image(
        &self,
        prompt: &str,
        image: &ReferenceImage,
        schema: &Value,
    ) -> AppResult<String>;

    async fn generate_text(&self, prompt: &str, system_instruction: &str) -> AppResult<String>;

    async fn start_video(&self, request: &VideoRequest) -> AppResult<VideoOperation>;

    async fn poll_video(&self, operation: &VideoOperation) -> AppResult<VideoOperation>;

    async fn download_video(&self, uri: &str) -> AppResult<Vec<u8>>;
}
