use crate::models::PromptLanguage;

/// `(prompt, system_instruction)` asking for critique of an image prompt.
pub fn feedback_prompt(language: PromptLanguage, prompt: &str) -> (String, String) {
    let reply_in = reply_language(language);
    (
        format!("Analyze and provide feedback for this image prompt: \"{prompt}\""),
        format!(
            "You are a prompt engineering expert for generative AI image models. Your task is to analyze a user's prompt and provide constructive, concise, and actionable suggestions for improvement.
- Focus on adding descriptive details (e.g., textures, materials, specific actions).
- Suggest specific lighting conditions (e.g., 'dramatic backlighting', 'soft morning light').
- Recommend improvements for composition (e.g., 'close-up shot', 'wide-angle view').
- Help clarify the artistic style if it's vague.
- Provide the feedback as a short, easy-to-read bulleted list.
- You MUST respond in {reply_in}.
- Keep the tone helpful and encouraging."
        ),
    )
}

pub fn smart_suggestions_prompt(
    language: PromptLanguage,
    subject: &str,
    style: &str,
    environment: &str,
) -> (String, String) {
    let reply_in = reply_language(language);
    (
        format!(
            "Based on the following ideas, generate 3 complete, creative and detailed image prompts:
- Subject: \"{subject}\"
- Style: \"{style}\"
- Environment: \"{environment}\""
        ),
        format!(
            "You are a creative assistant for a generative AI image tool. Your task is to expand the user's basic ideas into 3 different, ready-to-use, imaginative prompts.
- Each prompt must be one or two complete sentences.
- Return the suggestions as a bulleted list (using '*' or '-').
- Do not add any introductory or closing text. Only the list.
- You MUST respond in {reply_in}."
        ),
    )
}

pub fn dialogue_script_prompt(
    language: PromptLanguage,
    subject: &str,
    action: &str,
    movement: &str,
) -> (String, String) {
    let reply_in = reply_language(language);
    (
        format!(
            "Write a short dialogue (1-2 sentences) for a video scene based on the following context:
- Subject: \"{subject}\"
- Action: \"{action}\"
- Movement hint: \"{movement}\""
        ),
        format!(
            "You are an AI screenwriter. Your task is to write dialogue that is short, strong and relevant to the given scene context.
- The dialogue must feel natural for the scene.
- Do not add labels such as \"Dialogue:\" or unnecessary surrounding quotes.
- Return only the dialogue text.
- The response MUST be in {reply_in}."
        ),
    )
}

fn reply_language(language: PromptLanguage) -> &'static str {
    match language {
        PromptLanguage::Indonesian => "Bahasa Indonesia",
        PromptLanguage::English => "English",
    }
}
