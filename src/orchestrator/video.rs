use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    media::ReferenceImage,
    models::{GeneratedVideo, VideoOptions},
    prompt::compose_video_prompt,
    service::{GenerativeService, VideoRequest},
};

const VIDEO_MIME: &str = "video/mp4";

/// Starts a video generation and polls it until done, then downloads the
/// first sample. `on_progress` receives human-readable status lines.
pub async fn generate_video<P>(
    service: &dyn GenerativeService,
    options: &VideoOptions,
    reference: Option<ReferenceImage>,
    poll_interval: Duration,
    mut on_progress: P,
) -> AppResult<GeneratedVideo>
where
    P: FnMut(&str) + Send,
{
    if options.subject.trim().is_empty() {
        return Err(AppError::validation("video subject must not be empty"));
    }

    let request = VideoRequest {
        prompt: compose_video_prompt(options),
        aspect_ratio: options.aspect_ratio,
        resolution: options.resolution,
        reference,
    };

    on_progress("Starting video generation...");
    let mut operation = service.start_video(&request).await?;
    tracing::info!(operation = %operation.name, "video generation started");

    let mut polls = 0u32;
    while !operation.done {
        on_progress("Generating video, this can take a few minutes...");
        tokio::time::sleep(poll_interval).await;
        polls += 1;
        operation = service.poll_video(&operation).await?;
        tracing::debug!(operation = %operation.name, polls, done = operation.done, "polled video operation");
    }

    if let Some(error) = operation.error {
        tracing::warn!(operation = %operation.name, %error, "video generation failed");
        return Err(AppError::msg(format!("video generation failed: {error}")));
    }
    let uri = operation.video_uri.ok_or_else(|| AppError::no_media(None))?;

    on_progress("Downloading video...");
    let bytes = service.download_video(&uri).await?;
    tracing::info!(polls, bytes = bytes.len(), "video downloaded");

    Ok(GeneratedVideo {
        mime_type: VIDEO_MIME.to_string(),
        bytes,
    })
}
