use crate::{
    error::AppResult,
    models::PromptLanguage,
    prompt::{dialogue_script_prompt, feedback_prompt, smart_suggestions_prompt},
    service::GenerativeService,
};

pub const FEEDBACK_FALLBACK: &str = "No feedback available.";

pub async fn prompt_feedback(
    service: &dyn GenerativeService,
    language: PromptLanguage,
    prompt: &str,
) -> AppResult<String> {
    let (request, system) = feedback_prompt(language, prompt);
    let feedback = service.generate_text(&request, &system).await?;
    let feedback = feedback.trim();
    Ok(if feedback.is_empty() {
        FEEDBACK_FALLBACK.to_string()
    } else {
        feedback.to_string()
    })
}

pub async fn smart_suggestions(
    service: &dyn GenerativeService,
    language: PromptLanguage,
    subject: &str,
    style: &str,
    environment: &str,
) -> AppResult<Vec<String>> {
    let (request, system) = smart_suggestions_prompt(language, subject, style, environment);
    let text = service.generate_text(&request, &system).await?;
    Ok(parse_bullets(&text))
}

pub async fn dialogue_script(
    service: &dyn GenerativeService,
    language: PromptLanguage,
    subject: &str,
    action: &str,
    movement: &str,
) -> AppResult<String> {
    let (request, system) = dialogue_script_prompt(language, subject, action, movement);
    Ok(service.generate_text(&request, &system).await?.trim().to_string())
}

fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_start().trim_start_matches(['*', '-']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
