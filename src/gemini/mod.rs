use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    media::ReferenceImage,
    models::AspectRatio,
    service::{GenerativeService, VideoOperation, VideoRequest},
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_model: String,
    pub edit_model: String,
    pub text_model: String,
    pub video_model: String,
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_value("GEMINI_API_KEY").or_else(|| env_value("API_KEY")),
            base_url: env_value("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_model: env_value("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            edit_model: env_value("GEMINI_EDIT_MODEL")
                .unwrap_or_else(|| DEFAULT_EDIT_MODEL.to_string()),
            text_model: env_value("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            video_model: env_value("GEMINI_VIDEO_MODEL")
                .unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
        }
    }

    /// Defaults pointed at `base_url`, for local servers and tests.
    pub fn with_base_url<K: Into<String>, U: Into<String>>(api_key: K, base_url: U) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: base_url.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }

    fn require_api_key(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Authorization("GEMINI_API_KEY is missing. Add it to .env".to_string())
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url.trim_end_matches('/'))
    }

    fn operation_url(&self, name: &str) -> String {
        let name = name.trim().trim_start_matches('/');
        if name.starts_with("http://") || name.starts_with("https://") {
            return name.to_string();
        }
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentPayload {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
struct PredictPayload<I: Serialize, P: Serialize> {
    instances: Vec<I>,
    parameters: P,
}

#[derive(Debug, Serialize)]
struct ImagenInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
    output_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
struct VeoInstance<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VeoImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: &'static str,
    resolution: &'static str,
    number_of_videos: u32,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    async fn post_json<T: Serialize>(&self, url: &str, payload: &T) -> AppResult<Value> {
        let payload_value = serde_json::to_value(payload)?;
        tracing::debug!(
            target: "genova_studio_lib::gemini",
            %url,
            payload = %sanitize_payload(payload_value.clone()),
            "sending request"
        );

        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, self.config.require_api_key()?)
            .header("Content-Type", "application/json")
            .json(&payload_value)
            .send()
            .await?;
        read_json_response(response).await
    }

    async fn get_json(&self, url: &str) -> AppResult<Value> {
        let response = self
            .http_client
            .get(url)
            .header(API_KEY_HEADER, self.config.require_api_key()?)
            .send()
            .await?;
        read_json_response(response).await
    }

    async fn generate_content(&self, model: &str, payload: GenerateContentPayload) -> AppResult<Value> {
        self.post_json(&self.config.model_url(model, "generateContent"), &payload)
            .await
    }

    async fn generate_structured(&self, parts: Vec<Part>, schema: &Value) -> AppResult<String> {
        let response = self
            .generate_content(
                &self.config.text_model,
                GenerateContentPayload {
                    contents: vec![Content { parts }],
                    system_instruction: None,
                    generation_config: Some(GenerationConfig {
                        response_mime_type: Some("application/json"),
                        response_schema: Some(schema.clone()),
                        ..Default::default()
                    }),
                },
            )
            .await?;

        extract_text(&response).ok_or_else(|| classify_missing_media(&response))
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> AppResult<String> {
        let payload = PredictPayload {
            instances: vec![ImagenInstance { prompt }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.as_str(),
                output_mime_type: "image/jpeg",
            },
        };
        let response = self
            .post_json(&self.config.model_url(&self.config.image_model, "predict"), &payload)
            .await?;

        extract_prediction_image(&response)
    }

    async fn edit_image(&self, prompt: &str, references: &[ReferenceImage]) -> AppResult<String> {
        let mut parts = references
            .iter()
            .map(|image| Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64_data(),
                },
            })
            .collect::<Vec<_>>();
        parts.push(Part::Text {
            text: prompt.to_string(),
        });

        let response = self
            .generate_content(
                &self.config.edit_model,
                GenerateContentPayload {
                    contents: vec![Content { parts }],
                    system_instruction: None,
                    generation_config: Some(GenerationConfig {
                        response_modalities: Some(vec!["IMAGE"]),
                        ..Default::default()
                    }),
                },
            )
            .await?;

        extract_image_data_urls(&response)
            .into_iter()
            .next()
            .ok_or_else(|| classify_missing_media(&response))
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> AppResult<String> {
        self.generate_structured(
            vec![Part::Text {
                text: prompt.to_string(),
            }],
            schema,
        )
        .await
    }

    async fn analyze_image(
        &self,
        prompt: &str,
        image: &ReferenceImage,
        schema: &Value,
    ) -> AppResult<String> {
        self.generate_structured(
            vec![
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.base64_data(),
                    },
                },
                Part::Text {
                    text: prompt.to_string(),
                },
            ],
            schema,
        )
        .await
    }

    async fn generate_text(&self, prompt: &str, system_instruction: &str) -> AppResult<String> {
        let response = self
            .generate_content(
                &self.config.text_model,
                GenerateContentPayload {
                    contents: vec![Content {
                        parts: vec![Part::Text {
                            text: prompt.to_string(),
                        }],
                    }],
                    system_instruction: Some(Content {
                        parts: vec![Part::Text {
                            text: system_instruction.to_string(),
                        }],
                    }),
                    generation_config: None,
                },
            )
            .await?;

        Ok(extract_text(&response).unwrap_or_default())
    }

    async fn start_video(&self, request: &VideoRequest) -> AppResult<VideoOperation> {
        let payload = PredictPayload {
            instances: vec![VeoInstance {
                prompt: &request.prompt,
                image: request.reference.as_ref().map(|image| VeoImage {
                    bytes_base64_encoded: image.base64_data(),
                    mime_type: image.mime_type.clone(),
                }),
            }],
            parameters: VeoParameters {
                aspect_ratio: request.aspect_ratio.as_str(),
                resolution: request.resolution.as_str(),
                number_of_videos: 1,
            },
        };
        let response = self
            .post_json(
                &self.config.model_url(&self.config.video_model, "predictLongRunning"),
                &payload,
            )
            .await?;

        parse_operation(&response)
    }

    async fn poll_video(&self, operation: &VideoOperation) -> AppResult<VideoOperation> {
        let response = self.get_json(&self.config.operation_url(&operation.name)).await?;
        parse_operation(&response)
    }

    async fn download_video(&self, uri: &str) -> AppResult<Vec<u8>> {
        let response = self
            .http_client
            .get(uri)
            .header(API_KEY_HEADER, self.config.require_api_key()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(parse_gemini_http_error(status, &body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

async fn read_json_response(response: reqwest::Response) -> AppResult<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(parse_gemini_http_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

const AUTH_STATUSES: [&str; 3] = ["UNAUTHENTICATED", "PERMISSION_DENIED", "NOT_FOUND"];

/// Maps `{"error": {"code", "message", "status"}}` bodies onto the error taxonomy.
fn parse_gemini_http_error(status: StatusCode, body: &str) -> AppError {
    let json = serde_json::from_str::<Value>(body).ok();
    let error_status = json
        .as_ref()
        .and_then(|json| json.pointer("/error/status"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = json
        .as_ref()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    let auth_status = error_status
        .as_deref()
        .is_some_and(|s| AUTH_STATUSES.contains(&s));
    if auth_status
        || matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        )
    {
        return AppError::Authorization(format!(
            "{} {status}: {message}",
            error_status.as_deref().unwrap_or("HTTP")
        ));
    }

    AppError::msg(format!("Gemini request failed ({status}): {message}"))
}

fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)?;
    let merged = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    let trimmed = merged.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extract_image_data_urls(response: &Value) -> Vec<String> {
    let mut images = Vec::new();
    let Some(parts) = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return images;
    };

    for part in parts {
        let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
            continue;
        };
        let mime = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("image/png");
        if let Some(data) = inline.get("data").and_then(Value::as_str) {
            images.push(format!("data:{mime};base64,{data}"));
        }
    }

    images
}

fn extract_prediction_image(response: &Value) -> AppResult<String> {
    let prediction = response.pointer("/predictions/0");
    if let Some(bytes) = prediction
        .and_then(|p| p.get("bytesBase64Encoded"))
        .and_then(Value::as_str)
    {
        let mime = prediction
            .and_then(|p| p.get("mimeType"))
            .and_then(Value::as_str)
            .unwrap_or("image/jpeg");
        return Ok(format!("data:{mime};base64,{bytes}"));
    }

    if prediction
        .and_then(|p| p.get("raiFilteredReason"))
        .is_some()
    {
        return Err(AppError::SafetyBlocked);
    }

    Err(AppError::no_media(None))
}

/// Explains why a content response carried no media (or no text).
fn classify_missing_media(response: &Value) -> AppError {
    let text = extract_text(response);

    if let Some(candidate) = response.pointer("/candidates/0") {
        let finish_reason = candidate.get("finishReason").and_then(Value::as_str);
        return match finish_reason {
            Some("SAFETY" | "IMAGE_SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII") => {
                AppError::SafetyBlocked
            }
            Some("RECITATION" | "IMAGE_RECITATION") => AppError::RecitationBlocked,
            Some("OTHER" | "IMAGE_OTHER") => AppError::StoppedUnexpectedly(
                candidate
                    .get("finishMessage")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            ),
            _ => AppError::no_media(text),
        };
    }

    match response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        Some(_) => AppError::SafetyBlocked,
        None => AppError::no_media(text),
    }
}

fn parse_operation(response: &Value) -> AppResult<VideoOperation> {
    let name = response
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::malformed("video operation without a name"))?
        .to_string();
    let done = response.get("done").and_then(Value::as_bool).unwrap_or(false);
    let error = response.get("error").map(|error| {
        error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string())
    });
    let video_uri = response.get("response").and_then(extract_video_uri);

    Ok(VideoOperation {
        name,
        done,
        video_uri,
        error,
    })
}

fn extract_video_uri(operation_response: &Value) -> Option<String> {
    let paths = [
        "/generateVideoResponse/generatedSamples/0/video/uri",
        "/generatedVideos/0/video/uri",
        "/videos/0/uri",
    ];
    paths
        .iter()
        .find_map(|path| operation_response.pointer(path).and_then(Value::as_str))
        .map(str::to_string)
}

/// Replaces inline base64 payloads so request bodies can be logged.
fn sanitize_payload(payload: Value) -> Value {
    fn walk(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    if matches!(key.as_str(), "data" | "bytesBase64Encoded") {
                        if let Value::String(text) = value {
                            *value = json!(format!("[omitted {} base64 chars]", text.len()));
                            continue;
                        }
                    }
                    walk(value);
                }
            }
            Value::Array(array) => {
                for value in array.iter_mut() {
                    walk(value);
                }
            }
            _ => {}
        }
    }

    let mut sanitized = payload;
    walk(&mut sanitized);
    sanitized
}
