use std::slice;

use crate::{
    config::StudioConfig,
    error::{AppError, AppResult},
    media::ReferenceImage,
    models::{AspectRatio, PromptLanguage},
    prompt::{build_reference_pose_prompt, build_text_pose_prompt, pose_variants},
    service::GenerativeService,
};

use super::ConcurrencyGroup;

/// Generates one image per pose variant. The batch is all-or-nothing: it
/// returns exactly 4 images or the first error.
pub async fn generate_pose_batch(
    service: &dyn GenerativeService,
    config: &StudioConfig,
    prompt: &str,
    aspect_ratio: AspectRatio,
    reference: Option<&ReferenceImage>,
    language: PromptLanguage,
) -> AppResult<Vec<String>> {
    if prompt.trim().is_empty() {
        return Err(AppError::validation("prompt must not be empty"));
    }

    let group = ConcurrencyGroup::bounded(config.pose_concurrency);
    let poses = pose_variants(language, reference.is_some());
    tracing::info!(
        %aspect_ratio,
        with_reference = reference.is_some(),
        concurrency = config.pose_concurrency,
        "generating pose batch"
    );

    let images = match reference {
        Some(reference) => {
            let normalized = reference.normalized_for(aspect_ratio);
            let normalized = &normalized;
            let jobs = poses
                .iter()
                .enumerate()
                .map(|(index, pose)| async move {
                    tracing::debug!(pose = index, "editing reference for pose");
                    let instruction = build_reference_pose_prompt(language, prompt, pose);
                    service
                        .edit_image(&instruction, slice::from_ref(normalized))
                        .await
                })
                .collect::<Vec<_>>();
            group.join_all(jobs).await
        }
        None => {
            let jobs = poses
                .iter()
                .enumerate()
                .map(|(index, pose)| async move {
                    tracing::debug!(pose = index, "generating pose");
                    let instruction = build_text_pose_prompt(language, prompt, pose);
                    service.generate_image(&instruction, aspect_ratio).await
                })
                .collect::<Vec<_>>();
            group.join_all(jobs).await
        }
    };

    match &images {
        Ok(images) => tracing::info!(count = images.len(), "pose batch finished"),
        Err(error) => tracing::warn!(%error, "pose batch failed"),
    }
    images
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, GenericImageView, ImageOutputFormat, RgbaImage};

    use super::*;
    use crate::{
        error::ErrorKind,
        orchestrator::fake::{FakeService, PIXEL_DATA_URL},
        prompt::POSE_VARIANT_COUNT,
    };

    #[tokio::test]
    async fn text_batch_returns_one_image_per_pose_in_order() {
        let service = FakeService::default();
        let images = generate_pose_batch(
            &service,
            &StudioConfig::default(),
            "A knight.",
            AspectRatio::Square,
            None,
            PromptLanguage::English,
        )
        .await
        .unwrap();

        assert_eq!(images.len(), POSE_VARIANT_COUNT);
        for (image, pose) in images.iter().zip(pose_variants(PromptLanguage::English, false)) {
            assert!(image.starts_with("image[1:1]:A knight. IMPORTANT INSTRUCTION"));
            assert!(image.ends_with(&format!("{pose}.")));
        }
    }

    fn landscape_reference() -> ReferenceImage {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(160, 90))
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        ReferenceImage {
            mime_type: "image/png".into(),
            bytes: buffer.into_inner(),
        }
    }

    #[tokio::test]
    async fn reference_batch_edits_with_the_single_normalized_reference() {
        let service = FakeService::default();
        let reference = landscape_reference();
        let config = StudioConfig {
            pose_concurrency: 4,
            ..Default::default()
        };

        let images = generate_pose_batch(
            &service,
            &config,
            "seorang model memegang botol",
            AspectRatio::Portrait,
            Some(&reference),
            PromptLanguage::Indonesian,
        )
        .await
        .unwrap();

        assert_eq!(images.len(), 4);
        assert!(images.iter().all(|image| image.starts_with("edit:Gunakan gambar referensi")));
        assert_eq!(service.reference_counts(), vec![1; 4]);

        let cropped = reference.center_crop_to(AspectRatio::Portrait).unwrap();
        assert_eq!(
            image::load_from_memory(&cropped.bytes).unwrap().dimensions(),
            (51, 90)
        );
        let sent = service.references();
        assert_eq!(sent.len(), 4);
        for references in &sent {
            assert_eq!(references.as_slice(), slice::from_ref(&cropped));
        }
    }

    #[tokio::test]
    async fn undecodable_reference_is_sent_unchanged_to_every_pose() {
        let service = FakeService::default();
        let reference = ReferenceImage::from_data_url(PIXEL_DATA_URL).unwrap();
        let broken = ReferenceImage {
            bytes: reference.bytes[..8].to_vec(),
            ..reference
        };

        generate_pose_batch(
            &service,
            &StudioConfig::default(),
            "a bottle",
            AspectRatio::Square,
            Some(&broken),
            PromptLanguage::English,
        )
        .await
        .unwrap();

        assert!(service
            .references()
            .iter()
            .all(|references| references.as_slice() == slice::from_ref(&broken)));
    }

    #[tokio::test]
    async fn one_failed_pose_fails_the_whole_batch() {
        let failing_pose = pose_variants(PromptLanguage::English, false)[2].to_string();
        let service = FakeService {
            fail_when_prompt_contains: Some(failing_pose),
            ..Default::default()
        };

        let error = generate_pose_batch(
            &service,
            &StudioConfig::default(),
            "A knight",
            AspectRatio::Square,
            None,
            PromptLanguage::English,
        )
        .await
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::SafetyBlocked);
        // sequential by default, so the fourth pose is never requested
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_any_call() {
        let service = FakeService::default();
        let error = generate_pose_batch(
            &service,
            &StudioConfig::default(),
            "   ",
            AspectRatio::Square,
            None,
            PromptLanguage::English,
        )
        .await
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(service.calls(), 0);
    }
}
