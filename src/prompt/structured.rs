use serde_json::{json, Value};

use crate::models::{DialogueStyle, PromptLanguage, SceneBlock, StructuredPromptRequest};

/// Must appear verbatim in the CTA dialogue.
pub const CTA_PHRASE: &str = "Klik keranjang kiri bawah";

const COMEDY_INSTRUCTION: &str = r#"
**SPECIAL COMEDY INSTRUCTION:**
When generating dialogue in the 'Comedy' style, you MUST adopt the persona of a sharp, witty Indonesian stand-up comedian. The humor must be:
- **Observational & Relatable ("Ngena"):** Joke about everyday Indonesian life, social quirks, or common frustrations.
- **Quirky & "Nyeleneh":** Use unexpected twists, absurd perspectives, or unique, funny comparisons.
- **Clever, Not Cringey ("Tidak Garing"):** Avoid lazy puns. Aim for intelligent humor that is "enak didengar".
- **Concise & Punchy:** Deliver the joke quickly. The dialogue must be short enough to fit comfortably within the 8-second scene.
Think of top-tier Indonesian comics: smart, original, and straight to the point.
"#;

/// Instruction for the Hook / Problem-Solve / CTA generator. Custom choices
/// must have been validated before this is called.
pub fn build_structured_prompt(request: &StructuredPromptRequest) -> String {
    let style = request.dialogue_style.as_str();
    let language = request.dialogue_language.trim();
    let comedy = if request.dialogue_style == DialogueStyle::Comedy {
        COMEDY_INSTRUCTION
    } else {
        ""
    };
    let manual = |dialogue: &Option<String>| dialogue.as_deref().unwrap_or_default().trim().to_string();

    format!(
        r#"
Generate a valid JSON array containing exactly three JSON objects. Each object represents a complete, standalone scene prompt (Hook, Problem-Solve, CTA).

**Overall Context:**
- Video Concept: "{concept}"
- Subject: "{subject}"
- Main Action: "{action}"

**CRITICAL INSTRUCTIONS FOR EACH JSON OBJECT:**
1.  **Structure:** Each of the three objects must strictly follow the provided JSON schema.
2.  **Character Consistency:** Invent a character and describe their 'appearance' in detail in the 'characters' array. This 'appearance' description MUST be identical across all three JSON objects to ensure visual continuity.
3.  **Unique Scenes (Hook, Problem-Solve, CTA):**
    - The first JSON object is the "Hook" scene, based on movement idea: "{hook}". Its scene_number must be 1.
    - The second JSON object is the "Problem-Solve" scene, based on movement idea: "{problem}". Its scene_number must be 2.
    - The third JSON object is the "CTA" scene, based on movement idea: "{cta}". Its scene_number must be 3.
4.  **STRICT TIMING & STEPS:** The 'steps' array MUST contain exactly three objects. Each object represents a visual action. The description for these steps MUST correspond to actions for a 3-second, 3-second, and 2-second duration, for a total of 8 seconds per scene.
5.  **Dialogue Generation Rules (HIGHEST PRIORITY):**
    - **Strict 8-Second Timing:** The 'dialogue' in the 'voice' object MUST be extremely concise and impactful. It must be comfortably speakable within the strict 8-second duration of the scene. Short, punchy lines are required.
    - **Engaging Style:** The dialogue MUST powerfully embody the selected '{style}' style. Do not be generic. 'Affiliate' style must be highly persuasive; 'Narrative' must be evocative and paint a picture; 'Conversational' must feel completely natural and unscripted. Make every word count.
    - **Language & Tempo:** The dialogue MUST be in {language} and have a '{tempo}' tempo.
    - **CTA Scene Special Rule:** For the third scene object (the CTA scene), the dialogue MUST be a strong, persuasive Call to Action. It should create a sense of urgency or FOMO (Fear Of Missing Out). Critically, this dialogue MUST incorporate the exact phrase "{cta_phrase}". You can creatively place this phrase at the beginning, middle, or end of the sentence.
    {comedy}
    - **Manual Input:** Use the following manual dialogue as strong inspiration if provided:
      - Hook Scene Manual Dialogue: "{hook_dialogue}"
      - Problem-Solve Scene Manual Dialogue: "{problem_dialogue}"
      - CTA Scene Manual Dialogue: "{cta_dialogue}"
6.  **LANGUAGE RULES:** All JSON keys and all string values (like descriptions, titles, styles) MUST be in English. The ONLY exception is the 'dialogue' field inside the 'voice' object, which MUST be in {language}.
"#,
        concept = request.concept.resolve().trim(),
        subject = request.subject.trim(),
        action = request.action.trim(),
        hook = request.hook_movement.resolve().trim(),
        problem = request.problem_movement.resolve().trim(),
        cta = request.cta_movement.resolve().trim(),
        tempo = request.dialogue_tempo.as_str(),
        cta_phrase = CTA_PHRASE,
        hook_dialogue = manual(&request.hook_dialogue),
        problem_dialogue = manual(&request.problem_dialogue),
        cta_dialogue = manual(&request.cta_dialogue),
    )
}

pub fn structured_prompt_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "video_title": { "type": "STRING" },
                "video_style": { "type": "STRING" },
                "characters": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "appearance": { "type": "STRING" }
                        },
                        "required": ["name", "appearance"]
                    }
                },
                "scenes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "scene_number": { "type": "INTEGER" },
                            "description": { "type": "STRING" },
                            "steps": {
                                "type": "ARRAY",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "step_number": { "type": "INTEGER" },
                                        "description": { "type": "STRING" }
                                    },
                                    "required": ["step_number", "description"]
                                }
                            },
                            "audio": {
                                "type": "OBJECT",
                                "properties": {
                                    "music": { "type": "STRING" },
                                    "voice": {
                                        "type": "OBJECT",
                                        "properties": {
                                            "language": { "type": "STRING" },
                                            "tone": { "type": "STRING" },
                                            "dialogue": { "type": "STRING" }
                                        },
                                        "required": ["language", "tone", "dialogue"]
                                    }
                                },
                                "required": ["music", "voice"]
                            }
                        },
                        "required": ["scene_number", "description", "steps", "audio"]
                    }
                }
            },
            "required": ["video_title", "video_style", "characters", "scenes"]
        }
    })
}

/// Illustration prompt for one block, or `None` when the block has no scene.
pub fn build_scene_image_prompt(
    block: &SceneBlock,
    fallback_subject: &str,
    fallback_style: &str,
) -> Option<String> {
    let scene = block.scenes.first()?;
    let character = block.appearance().unwrap_or(fallback_subject);
    let style = Some(block.video_style.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_style);
    let steps = scene
        .steps
        .iter()
        .map(|step| step.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "A {style} visual of {character}. Scene description: {}. Key actions: {steps}.",
        scene.description
    ))
}

pub fn build_movement_analysis_prompt(language: PromptLanguage) -> &'static str {
    match language {
        PromptLanguage::Indonesian => {
            "Analisis gambar ini untuk konsep video promosi singkat.
Berdasarkan subjek, latar, dan suasana gambar, sarankan:
1. Aksi utama yang bisa dilakukan subjek.
2. Gerakan kamera yang cocok.
3. Konsep video 3 langkah (Hook, Problem-Solve, CTA) yang menarik.

Penting:
- Semua respons teks HARUS dalam Bahasa Indonesia.
- Berikan respons HANYA sebagai objek JSON yang valid."
        }
        PromptLanguage::English => {
            "Analyze this image for a short promotional video concept.
Based on the subject, setting and mood of the image, suggest:
1. The main action the subject could perform.
2. A fitting camera movement.
3. An engaging 3-step video concept (Hook, Problem-Solve, CTA).

Important:
- All text responses MUST be in English.
- Respond ONLY with a valid JSON object."
        }
    }
}

pub fn movement_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "mainAction": { "type": "STRING", "description": "Main action or movement performed by the subject in the video." },
            "cameraMovement": { "type": "STRING", "description": "Suggested camera movement for the video." },
            "hookMovement": { "type": "STRING", "description": "Movement description for the Hook segment." },
            "problemMovement": { "type": "STRING", "description": "Movement description for the Problem-Solve segment." },
            "ctaMovement": { "type": "STRING", "description": "Movement description for the Call to Action segment." }
        },
        "required": ["mainAction", "cameraMovement", "hookMovement", "problemMovement", "ctaMovement"]
    })
}
