use crate::{
    config::StudioConfig,
    error::{AppError, AppResult},
    media::ReferenceImage,
    models::{AffiliateRequest, AffiliateResult, AffiliateSet, AffiliateStyle},
    prompt::{build_affiliate_prompt, AFFILIATE_VARIANTS},
    service::GenerativeService,
};

use super::ConcurrencyGroup;

pub const MAX_MODEL_IMAGES: usize = 2;

/// Generates 3 style sets of 4 images each. Any failed image discards the
/// whole result.
pub async fn generate_affiliate_sets(
    service: &dyn GenerativeService,
    config: &StudioConfig,
    request: &AffiliateRequest,
) -> AppResult<AffiliateResult> {
    let references = collect_references(request)?;
    let references = references.as_slice();

    let jobs = AffiliateStyle::ALL
        .iter()
        .flat_map(|style| (0..AFFILIATE_VARIANTS.len()).map(move |variant| (*style, variant)))
        .map(|(style, variant)| async move {
            tracing::debug!(style = style.label(), variant, "generating affiliate image");
            let prompt = build_affiliate_prompt(request, style, variant);
            service.edit_image(&prompt, references).await
        })
        .collect::<Vec<_>>();

    tracing::info!(
        jobs = jobs.len(),
        references = references.len(),
        concurrency = config.affiliate_concurrency,
        "generating affiliate sets"
    );
    let mut images = ConcurrencyGroup::bounded(config.affiliate_concurrency)
        .join_all(jobs)
        .await
        .inspect_err(|error| tracing::warn!(%error, "affiliate batch failed"))?
        .into_iter();

    let sets = AffiliateStyle::ALL
        .iter()
        .map(|style| AffiliateSet {
            style: *style,
            images: images.by_ref().take(AFFILIATE_VARIANTS.len()).collect(),
        })
        .collect();

    Ok(AffiliateResult { sets })
}

/// Main product first, then supporting products, then model images.
fn collect_references(request: &AffiliateRequest) -> AppResult<Vec<ReferenceImage>> {
    if request.main_product_image.trim().is_empty() {
        return Err(AppError::validation("main product image is required"));
    }
    if request.model_images.len() > MAX_MODEL_IMAGES {
        return Err(AppError::validation(format!(
            "at most {MAX_MODEL_IMAGES} model images are allowed, got {}",
            request.model_images.len()
        )));
    }

    let mut references = vec![ReferenceImage::from_data_url(&request.main_product_image)?];
    for supporting in &request.supporting_images {
        references.push(ReferenceImage::from_data_url(&supporting.data_url)?);
    }
    for model in &request.model_images {
        references.push(ReferenceImage::from_data_url(model)?);
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        models::SupportingImage,
        orchestrator::fake::{FakeService, PIXEL_DATA_URL},
    };

    fn request() -> AffiliateRequest {
        AffiliateRequest {
            main_product_image: PIXEL_DATA_URL.into(),
            supporting_images: vec![SupportingImage {
                data_url: PIXEL_DATA_URL.into(),
                description: Some("gift box".into()),
            }],
            model_images: vec![PIXEL_DATA_URL.into()],
            description: "Ceramic tumbler".into(),
            model_type: "Woman".into(),
            model_age: "25-30".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn produces_three_sets_of_four() {
        let service = FakeService::default();
        let result = generate_affiliate_sets(&service, &StudioConfig::default(), &request())
            .await
            .unwrap();

        let styles = result.sets.iter().map(|set| set.style).collect::<Vec<_>>();
        assert_eq!(styles, AffiliateStyle::ALL.to_vec());
        for set in &result.sets {
            assert_eq!(set.images.len(), 4);
            assert!(set.images.iter().all(|image| image.contains(&format!("STYLE: {}", set.style.label()))));
            assert!(set.images[3].contains("Variation 4 of 4"));
        }
        assert_eq!(service.calls(), 12);
        assert_eq!(service.reference_counts(), vec![3; 12]);
    }

    #[tokio::test]
    async fn a_single_failure_discards_every_set() {
        let service = FakeService {
            fail_when_prompt_contains: Some("STYLE: Commercial".into()),
            ..Default::default()
        };
        let error = generate_affiliate_sets(&service, &StudioConfig::default(), &request())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SafetyBlocked);
    }

    #[tokio::test]
    async fn rejects_missing_product_and_extra_models() {
        let service = FakeService::default();

        let mut missing = request();
        missing.main_product_image = String::new();
        let error = generate_affiliate_sets(&service, &StudioConfig::default(), &missing)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);

        let mut crowded = request();
        crowded.model_images = vec![PIXEL_DATA_URL.into(); 3];
        let error = generate_affiliate_sets(&service, &StudioConfig::default(), &crowded)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);

        let mut garbage = request();
        garbage.main_product_image = "not a data url".into();
        assert!(generate_affiliate_sets(&service, &StudioConfig::default(), &garbage)
            .await
            .is_err());

        assert_eq!(service.calls(), 0);
    }
}
