use crate::{
    error::{AppError, AppResult},
    media::ReferenceImage,
    models::{MovementAnalysis, PromptLanguage},
    prompt::{build_movement_analysis_prompt, movement_analysis_schema},
    service::GenerativeService,
};

/// Suggests main action, camera movement and the three segment movements for
/// an uploaded image. Apply the result with [`MovementAnalysis::apply_to`].
pub async fn analyze_movement(
    service: &dyn GenerativeService,
    image: &ReferenceImage,
    language: PromptLanguage,
) -> AppResult<MovementAnalysis> {
    tracing::info!(mime = %image.mime_type, "analyzing image for movement ideas");
    let raw = service
        .analyze_image(
            build_movement_analysis_prompt(language),
            image,
            &movement_analysis_schema(),
        )
        .await?;

    serde_json::from_str(raw.trim())
        .map_err(|err| AppError::malformed(format!("movement analysis could not be parsed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        orchestrator::fake::{FakeService, PIXEL_DATA_URL},
    };

    #[tokio::test]
    async fn parses_the_camel_case_analysis() {
        let service = FakeService {
            json: r#"{"mainAction":"pours coffee","cameraMovement":"slow dolly in","hookMovement":"raises the cup","problemMovement":"wipes a spill","ctaMovement":"points at the bag"}"#.into(),
            ..Default::default()
        };
        let image = ReferenceImage::from_data_url(PIXEL_DATA_URL).unwrap();

        let analysis = analyze_movement(&service, &image, PromptLanguage::English).await.unwrap();
        assert_eq!(analysis.main_action, "pours coffee");
        assert_eq!(analysis.cta_movement, "points at the bag");
        assert!(service.prompts()[0].starts_with("Analyze this image"));
    }

    #[tokio::test]
    async fn incomplete_analysis_is_malformed() {
        let service = FakeService {
            json: r#"{"mainAction":"pours coffee"}"#.into(),
            ..Default::default()
        };
        let image = ReferenceImage::from_data_url(PIXEL_DATA_URL).unwrap();

        let error = analyze_movement(&service, &image, PromptLanguage::Indonesian)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
    }
}
