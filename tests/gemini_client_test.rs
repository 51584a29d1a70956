use std::time::Duration;

use genova_studio_lib::error::{AppError, ErrorKind};
use genova_studio_lib::gemini::{GeminiClient, GeminiConfig};
use genova_studio_lib::media::ReferenceImage;
use genova_studio_lib::models::{AspectRatio, VideoOptions};
use genova_studio_lib::orchestrator;
use genova_studio_lib::service::GenerativeService;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig::with_base_url("test-key", server.uri()))
}

#[tokio::test]
async fn imagen_prediction_becomes_a_data_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "instances": [{ "prompt": "a red bicycle" }],
            "parameters": { "sampleCount": 1, "aspectRatio": "16:9", "outputMimeType": "image/jpeg" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "bytesBase64Encoded": "QUJD", "mimeType": "image/jpeg" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = client_for(&server)
        .generate_image("a red bicycle", AspectRatio::Landscape)
        .await
        .expect("image");

    assert_eq!(image, "data:image/jpeg;base64,QUJD");
}

#[tokio::test]
async fn filtered_prediction_is_a_safety_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "raiFilteredReason": "Unable to show generated images." }]
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate_image("something", AspectRatio::Square)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::SafetyBlocked);
}

#[tokio::test]
async fn entity_not_found_forces_reauthorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate_image("a cat", AspectRatio::Square)
        .await
        .unwrap_err();

    assert!(error.requires_reauthorization());
    assert!(error.to_string().contains("Requested entity was not found."));
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = GeminiConfig::with_base_url("unused", server.uri());
    config.api_key = None;

    let error = GeminiClient::new(config)
        .generate_text("hello", "be brief")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AuthorizationFailed);
}

#[tokio::test]
async fn edit_returning_only_text_reports_the_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseModalities": ["IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": { "parts": [{ "text": "I can't change that photo." }] }
            }]
        })))
        .mount(&server)
        .await;

    let reference = ReferenceImage::from_data_url(PIXEL_DATA_URL).unwrap();
    let error = client_for(&server)
        .edit_image("make it blue", &[reference])
        .await
        .unwrap_err();

    match error {
        AppError::NoMedia { text } => assert_eq!(text.as_deref(), Some("I can't change that photo.")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn edit_sends_references_before_the_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "inlineData": { "mimeType": "image/png" } },
                { "text": "make it blue" }
            ] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "RURJVA==" } }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reference = ReferenceImage::from_data_url(PIXEL_DATA_URL).unwrap();
    let image = client_for(&server)
        .edit_image("make it blue", &[reference])
        .await
        .expect("edited image");
    assert_eq!(image, "data:image/png;base64,RURJVA==");
}

#[tokio::test]
async fn structured_output_requests_json_with_schema() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json", "responseSchema": { "type": "OBJECT" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":true}" }] } }]
        })))
        .mount(&server)
        .await;

    let text = client_for(&server)
        .generate_json("describe", &json!({ "type": "OBJECT" }))
        .await
        .expect("json text");
    assert_eq!(text, "{\"ok\":true}");
}

#[tokio::test]
async fn recitation_finish_reason_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "RECITATION" }]
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .generate_json("lyrics", &json!({ "type": "OBJECT" }))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::RecitationBlocked);
}

#[tokio::test]
async fn video_is_polled_and_downloaded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "parameters": { "aspectRatio": "16:9", "resolution": "1080p", "numberOfVideos": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "operations/op-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": format!("{}/files/clip.mp4", server.uri()) } }
            ] } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/clip.mp4"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4".to_vec()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = VideoOptions {
        subject: "a cat".into(),
        action: "jumps over a fence".into(),
        ..Default::default()
    };

    let mut progress = Vec::new();
    let video = orchestrator::generate_video(&client, &options, None, Duration::from_millis(5), |line| {
        progress.push(line.to_string())
    })
    .await
    .expect("video");

    assert_eq!(video.mime_type, "video/mp4");
    assert_eq!(video.bytes, b"fake-mp4".to_vec());
    assert!(!progress.is_empty());
}
