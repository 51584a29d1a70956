use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A form selector that either picks a preset or carries free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Choice<T> {
    Preset(T),
    Custom(String),
}

impl<T: Default> Default for Choice<T> {
    fn default() -> Self {
        Self::Preset(T::default())
    }
}

impl<T: AsRef<str>> Choice<T> {
    pub fn resolve(&self) -> &str {
        match self {
            Self::Preset(value) => value.as_ref(),
            Self::Custom(text) => text.as_str(),
        }
    }

    pub fn is_missing_custom(&self) -> bool {
        matches!(self, Self::Custom(text) if text.trim().is_empty())
    }
}

impl Choice<String> {
    pub fn preset<S: Into<String>>(value: S) -> Self {
        Self::Preset(value.into())
    }

    pub fn custom<S: Into<String>>(text: S) -> Self {
        Self::Custom(text.into())
    }

    /// Converts a selector value plus its paired free-text field, where `sentinel`
    /// marks "use the free text".
    pub fn from_selector(selected: &str, custom_text: &str, sentinel: &str) -> Self {
        if selected == sentinel {
            Self::Custom(custom_text.to_string())
        } else {
            Self::Preset(selected.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PromptLanguage {
    #[default]
    #[serde(rename = "id")]
    Indonesian,
    #[serde(rename = "en")]
    English,
}

impl FromStr for PromptLanguage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" | "indonesian" | "bahasa" => Ok(Self::Indonesian),
            "en" | "english" => Ok(Self::English),
            other => Err(AppError::validation(format!(
                "unsupported prompt language: {other}. allowed: id/en"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ImageResolution {
    #[default]
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "4K")]
    FourK,
    #[serde(rename = "8K")]
    EightK,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }

    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        match self {
            Self::Square => 1.0,
            Self::Landscape => 16.0 / 9.0,
            Self::Portrait => 9.0 / 16.0,
            Self::Standard => 4.0 / 3.0,
            Self::StandardPortrait => 3.0 / 4.0,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BlurLevel {
    #[default]
    #[serde(alias = "Tidak ada")]
    None,
    #[serde(alias = "Rendah")]
    Low,
    #[serde(alias = "Sedang")]
    Medium,
    #[serde(alias = "Tinggi")]
    High,
}

/// Form options of the image tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageOptions {
    pub subject: String,
    pub style: String,
    pub details: String,
    pub environment: Choice<String>,
    pub environment_details: String,
    pub palette: String,
    pub resolution: ImageResolution,
    pub aspect_ratio: AspectRatio,
    pub blur: BlurLevel,
    pub camera_angle: String,
    pub lighting_style: String,
    pub time_of_day: String,
    pub remove_background: bool,
    pub has_reference_image: bool,
    /// Unset defers to the configured language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<PromptLanguage>,
}

impl ImageOptions {
    pub fn prompt_language(&self) -> PromptLanguage {
        self.language.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VideoResolution {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
}

impl VideoResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd720 => "720p",
            Self::Hd1080 => "1080p",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VideoAspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl From<VideoAspectRatio> for AspectRatio {
    fn from(value: VideoAspectRatio) -> Self {
        match value {
            VideoAspectRatio::Landscape => AspectRatio::Landscape,
            VideoAspectRatio::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrationOptions {
    pub language: String,
    pub voice_gender: String,
    pub speaking_style: String,
    pub mood: String,
}

/// Form options of the video tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoOptions {
    pub subject: String,
    pub action: String,
    pub style: String,
    pub environment: String,
    pub time_of_day: String,
    pub camera_movement: String,
    pub lighting_style: String,
    pub palette: String,
    pub details: String,
    /// Present when sound is enabled.
    pub narration: Option<NarrationOptions>,
    /// Present when dialogue is enabled.
    pub dialogue: Option<String>,
    pub resolution: VideoResolution,
    pub aspect_ratio: VideoAspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<PromptLanguage>,
}

impl VideoOptions {
    pub fn prompt_language(&self) -> PromptLanguage {
        self.language.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DialogueStyle {
    #[default]
    Affiliate,
    Comedy,
    Conversational,
    Narrative,
    Enthusiastic,
    Formal,
    Whispering,
}

impl DialogueStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Affiliate => "Affiliate",
            Self::Comedy => "Comedy",
            Self::Conversational => "Conversational",
            Self::Narrative => "Narrative",
            Self::Enthusiastic => "Enthusiastic",
            Self::Formal => "Formal",
            Self::Whispering => "Whispering",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DialogueTempo {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl DialogueTempo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Medium => "Medium",
            Self::Fast => "Fast",
        }
    }
}

/// Inputs of the Hook / Problem-Solve / CTA generator.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredPromptRequest {
    pub subject: String,
    pub action: String,
    pub concept: Choice<String>,
    pub hook_movement: Choice<String>,
    pub problem_movement: Choice<String>,
    pub cta_movement: Choice<String>,
    pub hook_dialogue: Option<String>,
    pub problem_dialogue: Option<String>,
    pub cta_dialogue: Option<String>,
    pub dialogue_style: DialogueStyle,
    pub dialogue_language: String,
    pub dialogue_tempo: DialogueTempo,
    /// Fallback visual style for derived scene images.
    pub video_style: String,
    pub aspect_ratio: VideoAspectRatio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneCharacter {
    pub name: String,
    pub appearance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneStep {
    pub step_number: u32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneVoice {
    pub language: String,
    pub tone: String,
    pub dialogue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneAudio {
    #[serde(default)]
    pub music: String,
    pub voice: SceneVoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scene {
    pub scene_number: u32,
    pub description: String,
    pub steps: Vec<SceneStep>,
    pub audio: SceneAudio,
}

/// One standalone scene prompt of the 3-part video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneBlock {
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub video_style: String,
    #[serde(default)]
    pub characters: Vec<SceneCharacter>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl SceneBlock {
    pub fn appearance(&self) -> Option<&str> {
        self.characters
            .first()
            .map(|c| c.appearance.as_str())
            .filter(|a| !a.trim().is_empty())
    }
}

/// Hook, Problem-Solve and CTA blocks, in that order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StructuredScenePrompt(pub Vec<SceneBlock>);

impl StructuredScenePrompt {
    pub fn blocks(&self) -> &[SceneBlock] {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovementAnalysis {
    pub main_action: String,
    pub camera_movement: String,
    pub hook_movement: String,
    pub problem_movement: String,
    pub cta_movement: String,
}

impl MovementAnalysis {
    /// Overwrites the movement fields of the forms with the analysis result.
    pub fn apply_to(&self, form: &mut StructuredPromptRequest, video: &mut VideoOptions) {
        video.action = self.main_action.clone();
        video.camera_movement = self.camera_movement.clone();
        form.action = self.main_action.clone();
        form.hook_movement = Choice::custom(self.hook_movement.clone());
        form.problem_movement = Choice::custom(self.problem_movement.clone());
        form.cta_movement = Choice::custom(self.cta_movement.clone());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SupportingImage {
    pub data_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AffiliateRequest {
    pub main_product_image: String,
    pub supporting_images: Vec<SupportingImage>,
    pub model_images: Vec<String>,
    pub description: String,
    pub model_type: String,
    pub model_age: String,
    pub hijab: bool,
    pub aspect_ratio: AspectRatio,
    pub ad_type: String,
    pub narration_language: String,
    pub narration_accent: String,
    pub text_overlay: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AffiliateStyle {
    #[serde(rename = "B-Roll")]
    BRoll,
    #[serde(rename = "UGC")]
    Ugc,
    Commercial,
}

impl AffiliateStyle {
    pub const ALL: [AffiliateStyle; 3] = [Self::BRoll, Self::Ugc, Self::Commercial];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BRoll => "B-Roll",
            Self::Ugc => "UGC",
            Self::Commercial => "Commercial",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateSet {
    pub style: AffiliateStyle,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateResult {
    pub sets: Vec<AffiliateSet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
