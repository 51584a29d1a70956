use crate::{
    error::{AppError, AppResult},
    models::{AspectRatio, StructuredPromptRequest, StructuredScenePrompt},
    prompt::{build_scene_image_prompt, build_structured_prompt, structured_prompt_schema},
    service::GenerativeService,
};

use super::ConcurrencyGroup;

const SEGMENT_COUNT: usize = 3;
const STEPS_PER_SCENE: usize = 3;

/// Scene JSON plus the derived illustrations. Image derivation fails on its
/// own channel and never invalidates `prompt`.
#[derive(Debug)]
pub struct StructuredOutcome {
    pub prompt: StructuredScenePrompt,
    pub images: AppResult<Vec<String>>,
}

/// Rejects custom selectors whose free text was left empty.
pub fn validate_structured_request(request: &StructuredPromptRequest) -> AppResult<()> {
    if request.concept.is_missing_custom() {
        return Err(AppError::validation("custom video concept must not be empty"));
    }

    let movements = [
        ("Hook", &request.hook_movement),
        ("Problem-Solve", &request.problem_movement),
        ("CTA", &request.cta_movement),
    ];
    for (segment, movement) in movements {
        if movement.is_missing_custom() {
            return Err(AppError::validation(format!(
                "custom {segment} movement must not be empty"
            )));
        }
    }

    Ok(())
}

pub async fn generate_structured_prompt(
    service: &dyn GenerativeService,
    request: &StructuredPromptRequest,
) -> AppResult<StructuredOutcome> {
    validate_structured_request(request)?;

    tracing::info!(
        style = request.dialogue_style.as_str(),
        "requesting structured scene prompt"
    );
    let raw = service
        .generate_json(&build_structured_prompt(request), &structured_prompt_schema())
        .await?;
    let prompt = parse_structured_response(&raw)?;

    let images = derive_scene_images(service, &prompt, request).await;
    if let Err(error) = &images {
        tracing::warn!(%error, "scene image derivation failed");
    }

    Ok(StructuredOutcome { prompt, images })
}

/// Parses the model output, tolerating a surrounding markdown code fence.
pub fn parse_structured_response(raw: &str) -> AppResult<StructuredScenePrompt> {
    if raw.trim().is_empty() {
        return Err(AppError::no_media(None));
    }

    let cleaned = strip_code_fence(raw);

    let prompt: StructuredScenePrompt = serde_json::from_str(cleaned)
        .map_err(|err| AppError::malformed(format!("scene JSON could not be parsed: {err}")))?;
    check_scene_shape(&prompt)?;
    Ok(prompt)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        // drop the language tag line, e.g. ```json
        Some((_, body)) => body,
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn check_scene_shape(prompt: &StructuredScenePrompt) -> AppResult<()> {
    let blocks = prompt.blocks();
    if blocks.len() != SEGMENT_COUNT {
        return Err(AppError::malformed(format!(
            "expected {SEGMENT_COUNT} scene blocks, got {}",
            blocks.len()
        )));
    }

    for (index, block) in blocks.iter().enumerate() {
        let expected = index as u32 + 1;
        for scene in &block.scenes {
            if scene.scene_number != expected {
                return Err(AppError::malformed(format!(
                    "block {expected} carries scene number {}",
                    scene.scene_number
                )));
            }
            if scene.steps.len() != STEPS_PER_SCENE {
                return Err(AppError::malformed(format!(
                    "scene {expected} has {} steps instead of {STEPS_PER_SCENE}",
                    scene.steps.len()
                )));
            }
        }
    }

    let first = blocks[0].appearance();
    if blocks.iter().any(|block| block.appearance() != first) {
        return Err(AppError::malformed(
            "character appearance differs between scene blocks",
        ));
    }

    Ok(())
}

async fn derive_scene_images(
    service: &dyn GenerativeService,
    prompt: &StructuredScenePrompt,
    request: &StructuredPromptRequest,
) -> AppResult<Vec<String>> {
    let image_prompts = prompt
        .blocks()
        .iter()
        .filter_map(|block| build_scene_image_prompt(block, &request.subject, &request.video_style))
        .collect::<Vec<_>>();
    if image_prompts.is_empty() {
        return Err(AppError::msg(
            "no scene in the structured prompt could be illustrated",
        ));
    }

    let aspect_ratio: AspectRatio = request.aspect_ratio.into();
    let jobs = image_prompts
        .iter()
        .map(|image_prompt| service.generate_image(image_prompt, aspect_ratio))
        .collect::<Vec<_>>();
    ConcurrencyGroup::unbounded().join_all(jobs).await
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        error::ErrorKind,
        models::{Choice, VideoAspectRatio},
        orchestrator::fake::FakeService,
    };

    fn block(number: u32, appearance: &str, steps: usize) -> Value {
        let steps = (1..=steps)
            .map(|i| json!({ "step_number": i, "description": format!("step {i}") }))
            .collect::<Vec<_>>();
        json!({
            "video_title": "Morning Brew",
            "video_style": "Cinematic",
            "characters": [{ "name": "Sari", "appearance": appearance }],
            "scenes": [{
                "scene_number": number,
                "description": format!("scene {number}"),
                "steps": steps,
                "audio": { "music": "lofi", "voice": { "language": "Bahasa Indonesia", "tone": "warm", "dialogue": "Klik keranjang kiri bawah" } }
            }]
        })
    }

    fn valid_json() -> String {
        json!([block(1, "yellow hijab", 3), block(2, "yellow hijab", 3), block(3, "yellow hijab", 3)]).to_string()
    }

    fn request() -> StructuredPromptRequest {
        StructuredPromptRequest {
            subject: "a barista".into(),
            action: "pours coffee".into(),
            concept: Choice::preset("Morning routine"),
            hook_movement: Choice::preset("Lifts the cup"),
            problem_movement: Choice::preset("Wipes the spill"),
            cta_movement: Choice::preset("Points at the bag"),
            dialogue_language: "Bahasa Indonesia".into(),
            video_style: "Sinematik".into(),
            aspect_ratio: VideoAspectRatio::Portrait,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn blank_custom_movement_never_reaches_the_service() {
        let service = FakeService {
            json: valid_json(),
            ..Default::default()
        };
        let mut request = request();
        request.problem_movement = Choice::custom("");

        let error = generate_structured_prompt(&service, &request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(service.calls(), 0);

        let mut request = self::request();
        request.concept = Choice::custom("  ");
        assert!(generate_structured_prompt(&service, &request).await.is_err());
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn returns_three_blocks_and_one_image_per_scene() {
        let service = FakeService {
            json: format!("```json\n{}\n```", valid_json()),
            ..Default::default()
        };

        let outcome = generate_structured_prompt(&service, &request()).await.unwrap();
        assert_eq!(outcome.prompt.blocks().len(), 3);
        let images = outcome.images.unwrap();
        assert_eq!(images.len(), 3);
        assert!(images[0].starts_with("image[9:16]:A Cinematic visual of yellow hijab. Scene description: scene 1."));
        assert!(images[2].contains("Key actions: step 1, step 2, step 3."));
        assert_eq!(service.calls(), 4);
    }

    #[tokio::test]
    async fn image_failure_keeps_the_scene_json() {
        let service = FakeService {
            json: valid_json(),
            fail_when_prompt_contains: Some("scene 2".into()),
            ..Default::default()
        };

        let outcome = generate_structured_prompt(&service, &request()).await.unwrap();
        assert_eq!(outcome.prompt.blocks().len(), 3);
        assert_eq!(outcome.images.unwrap_err().kind(), ErrorKind::SafetyBlocked);
    }

    #[tokio::test]
    async fn blocks_without_scenes_are_not_illustrated() {
        let mut blocks = vec![block(1, "a", 3), block(2, "a", 3), block(3, "a", 3)];
        blocks[1]["scenes"] = json!([]);
        let service = FakeService {
            json: Value::Array(blocks).to_string(),
            ..Default::default()
        };

        let outcome = generate_structured_prompt(&service, &request()).await.unwrap();
        assert_eq!(outcome.images.unwrap().len(), 2);
    }

    #[test]
    fn rejects_wrong_shapes() {
        let two = json!([block(1, "a", 3), block(2, "a", 3)]).to_string();
        let misnumbered = json!([block(1, "a", 3), block(3, "a", 3), block(3, "a", 3)]).to_string();
        let short = json!([block(1, "a", 3), block(2, "a", 2), block(3, "a", 3)]).to_string();
        let drifting = json!([block(1, "a", 3), block(2, "b", 3), block(3, "a", 3)]).to_string();

        for raw in [two, misnumbered, short, drifting, "not json".to_string()] {
            let error = parse_structured_response(&raw).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedResponse, "{raw}");
        }
        assert_eq!(
            parse_structured_response("  ").unwrap_err().kind(),
            ErrorKind::NoMediaReturned
        );
    }

    #[test]
    fn strips_plain_and_tagged_fences() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[2]```"), "[2]");
        assert_eq!(strip_code_fence(" [3] "), "[3]");
        assert_eq!(strip_code_fence("```json [4]```"), "[4]");
        assert_eq!(strip_code_fence("```[5]```"), "[5]");
    }

    #[test]
    fn single_line_fenced_reply_is_parsed() {
        let tagged = format!("```json {}```", valid_json());
        let bare = format!("```{}```", valid_json());
        for raw in [tagged, bare] {
            assert_eq!(parse_structured_response(&raw).unwrap().blocks().len(), 3);
        }
    }

    #[test]
    fn empty_fence_is_malformed_not_missing_media() {
        for raw in ["```json\n```", "``````"] {
            assert_eq!(
                parse_structured_response(raw).unwrap_err().kind(),
                ErrorKind::MalformedResponse,
                "{raw}"
            );
        }
    }

    #[test]
    fn appearance_must_match_exactly() {
        let padded = json!([block(1, "a", 3), block(2, "a ", 3), block(3, "a", 3)]).to_string();
        assert_eq!(
            parse_structured_response(&padded).unwrap_err().kind(),
            ErrorKind::MalformedResponse
        );
    }
}
