use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    media::{read_image_path_as_data_url, ReferenceImage},
    models::{
        AffiliateRequest, ImageOptions, PromptLanguage, StructuredPromptRequest,
        StructuredScenePrompt, VideoOptions,
    },
    orchestrator, prompt,
    state::{RequestId, Slice, StudioSession},
    storage::OutputRun,
    AppState,
};

#[derive(Debug, Parser)]
#[command(
    name = "genova-studio",
    about = "Compose prompts and generate images and videos with Gemini",
    version
)]
pub struct Cli {
    /// Directory that receives one folder per run
    #[arg(short = 'o', long, global = true, env = "GENOVA_OUT_DIR", default_value = "genova-output")]
    pub out: PathBuf,

    /// Prompt language (id or en); overrides the options file and GENOVA_LANGUAGE
    #[arg(short = 'l', long, global = true)]
    pub language: Option<PromptLanguage>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the image prompt composed from an options file
    ComposeImage { options: PathBuf },
    /// Print the video prompt composed from an options file
    ComposeVideo { options: PathBuf },
    /// Generate the 4 pose variants of an image prompt
    Images {
        options: PathBuf,
        /// Reference image to keep subject, clothing and background from
        #[arg(short = 'r', long)]
        reference: Option<PathBuf>,
    },
    /// Generate a video and wait for it to finish
    Video {
        options: PathBuf,
        #[arg(short = 'r', long)]
        reference: Option<PathBuf>,
    },
    /// Generate the Hook / Problem-Solve / CTA scene JSON and its illustrations
    Structured { request: PathBuf },
    /// Suggest movements for an image and apply them to the forms
    Analyze {
        image: PathBuf,
        /// Structured request to update with the suggested movements
        #[arg(long)]
        structured: Option<PathBuf>,
        /// Video options to update with the suggested action and camera movement
        #[arg(long)]
        video: Option<PathBuf>,
    },
    /// Generate B-Roll, UGC and Commercial image sets for a product
    Affiliate { request: PathBuf },
    /// Critique an image prompt
    Feedback { prompt: String },
    /// Expand rough ideas into 3 ready-to-use prompts
    Suggest {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        style: String,
        #[arg(long, default_value = "")]
        environment: String,
    },
    /// Write a short dialogue line for a video scene
    Dialogue {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        action: String,
        #[arg(long, default_value = "")]
        movement: String,
    },
}

pub async fn dispatch(cli: Cli, state: &mut AppState) -> Result<(), String> {
    let Cli {
        out,
        language,
        command,
    } = cli;

    let configured = state.config.language;
    let result = match command {
        Command::ComposeImage { options } => {
            wrap_cmd(|| compose_image(&options, language, configured))
        }
        Command::ComposeVideo { options } => {
            wrap_cmd(|| compose_video(&options, language, configured))
        }
        Command::Images { options, reference } => {
            wrap_cmd_async(generate_images(state, &out, &options, reference.as_deref(), language))
                .await
        }
        Command::Video { options, reference } => {
            wrap_cmd_async(generate_video(state, &out, &options, reference.as_deref(), language))
                .await
        }
        Command::Structured { request } => {
            wrap_cmd_async(generate_structured(state, &out, &request)).await
        }
        Command::Analyze {
            image,
            structured,
            video,
        } => {
            wrap_cmd_async(analyze(
                state,
                &out,
                &image,
                structured.as_deref(),
                video.as_deref(),
                language,
            ))
            .await
        }
        Command::Affiliate { request } => {
            wrap_cmd_async(generate_affiliate(state, &out, &request)).await
        }
        Command::Feedback { prompt } => {
            wrap_cmd_async(feedback(state, &out, &prompt, language)).await
        }
        Command::Suggest {
            subject,
            style,
            environment,
        } => wrap_cmd_async(suggest(state, &out, &subject, &style, &environment, language)).await,
        Command::Dialogue {
            subject,
            action,
            movement,
        } => wrap_cmd_async(dialogue(state, &out, &subject, &action, &movement, language)).await,
    };

    if state.session.credentials.needs_reauthorization {
        eprintln!("The API key was rejected. Set GEMINI_API_KEY to a valid key and run again.");
    }
    result
}

fn compose_image(
    options_path: &Path,
    language: Option<PromptLanguage>,
    configured: PromptLanguage,
) -> AppResult<()> {
    let options = read_image_options(options_path, language, configured)?;
    println!("{}", prompt::compose_image_prompt(&options));
    Ok(())
}

fn compose_video(
    options_path: &Path,
    language: Option<PromptLanguage>,
    configured: PromptLanguage,
) -> AppResult<()> {
    let options = read_video_options(options_path, language, configured)?;
    println!("{}", prompt::compose_video_prompt(&options));
    Ok(())
}

/// The flag wins over the options file, which wins over GENOVA_LANGUAGE.
fn resolve_language(
    flag: Option<PromptLanguage>,
    file: Option<PromptLanguage>,
    configured: PromptLanguage,
) -> PromptLanguage {
    flag.or(file).unwrap_or(configured)
}

fn read_image_options(
    path: &Path,
    language: Option<PromptLanguage>,
    configured: PromptLanguage,
) -> AppResult<ImageOptions> {
    let mut options: ImageOptions = read_options(path)?;
    options.language = Some(resolve_language(language, options.language, configured));
    Ok(options)
}

fn read_video_options(
    path: &Path,
    language: Option<PromptLanguage>,
    configured: PromptLanguage,
) -> AppResult<VideoOptions> {
    let mut options: VideoOptions = read_options(path)?;
    options.language = Some(resolve_language(language, options.language, configured));
    Ok(options)
}

async fn generate_images(
    state: &mut AppState,
    out: &Path,
    options_path: &Path,
    reference_path: Option<&Path>,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let mut options = read_image_options(options_path, language, state.config.language)?;
    let reference = reference_path.map(load_reference).transpose()?;
    options.has_reference_image = reference.is_some();

    let prompt_text = prompt::compose_image_prompt(&options);
    let mut run = OutputRun::create(out, "images")?;
    run.set_prompt(prompt_text.clone());

    let id = state.session.begin(|s| &mut s.images);
    let result = orchestrator::generate_pose_batch(
        &state.gemini,
        &state.config,
        &prompt_text,
        options.aspect_ratio,
        reference.as_ref(),
        options.prompt_language(),
    )
    .await;

    settle(&mut state.session, |s| &mut s.images, id, run, result, |run, images| {
        for (index, data_url) in images.iter().enumerate() {
            run.write_image(&format!("pose-{:02}", index + 1), data_url)?;
        }
        Ok(())
    })
}

async fn generate_video(
    state: &mut AppState,
    out: &Path,
    options_path: &Path,
    reference_path: Option<&Path>,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let options = read_video_options(options_path, language, state.config.language)?;
    let reference = reference_path.map(load_reference).transpose()?;

    let mut run = OutputRun::create(out, "video")?;
    run.set_prompt(prompt::compose_video_prompt(&options));

    let id = state.session.begin(|s| &mut s.video);
    let result = orchestrator::generate_video(
        &state.gemini,
        &options,
        reference,
        state.config.video_poll_interval,
        |line| eprintln!("{line}"),
    )
    .await;

    settle(&mut state.session, |s| &mut s.video, id, run, result, |run, video| {
        run.write_video("video", video)?;
        Ok(())
    })
}

async fn generate_structured(state: &mut AppState, out: &Path, request_path: &Path) -> AppResult<()> {
    let request: StructuredPromptRequest = read_options(request_path)?;
    orchestrator::validate_structured_request(&request)?;

    let mut run = OutputRun::create(out, "structured")?;
    let prompt_id = state.session.begin(|s| &mut s.structured);
    let outcome = match orchestrator::generate_structured_prompt(&state.gemini, &request).await {
        Ok(outcome) => outcome,
        Err(error) => {
            let failed: AppResult<StructuredScenePrompt> = Err(error);
            return settle(&mut state.session, |s| &mut s.structured, prompt_id, run, failed, |_, _| Ok(()));
        }
    };

    let images_id = state.session.begin(|s| &mut s.scene_images);
    run.write_json_file("structured.json", &outcome.prompt)?;
    let images = settle_value(&mut run, outcome.images, |run, images| {
        for (index, data_url) in images.iter().enumerate() {
            run.write_image(&format!("scene-{}", index + 1), data_url)?;
        }
        Ok(())
    })?;
    if let Err(error) = &images {
        eprintln!("Scene JSON is ready but its images failed: {error}");
    }
    state.session.resolve(|s| &mut s.scene_images, images_id, images);
    state.session.resolve(|s| &mut s.structured, prompt_id, Ok(outcome.prompt));

    println!("{}", run.finish()?.display());
    Ok(())
}

async fn analyze(
    state: &mut AppState,
    out: &Path,
    image_path: &Path,
    structured_path: Option<&Path>,
    video_path: Option<&Path>,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let image = load_reference(image_path)?;
    let language = language.unwrap_or(state.config.language);
    let mut form: StructuredPromptRequest = match structured_path {
        Some(path) => read_options(path)?,
        None => StructuredPromptRequest::default(),
    };
    let mut video: VideoOptions = match video_path {
        Some(path) => read_options(path)?,
        None => VideoOptions::default(),
    };

    let run = OutputRun::create(out, "analyze")?;
    let id = state.session.begin(|s| &mut s.analysis);
    let result = orchestrator::analyze_movement(&state.gemini, &image, language).await;

    settle(&mut state.session, |s| &mut s.analysis, id, run, result, |run, analysis| {
        analysis.apply_to(&mut form, &mut video);
        run.set_data(analysis)?;
        run.write_json_file("structured-request.json", &form)?;
        run.write_json_file("video-options.json", &video)?;
        Ok(())
    })
}

async fn generate_affiliate(state: &mut AppState, out: &Path, request_path: &Path) -> AppResult<()> {
    let mut request: AffiliateRequest = read_options(request_path)?;
    let base = request_path.parent().unwrap_or_else(|| Path::new("."));
    request.main_product_image = resolve_image_ref(&request.main_product_image, base)?;
    for supporting in &mut request.supporting_images {
        supporting.data_url = resolve_image_ref(&supporting.data_url, base)?;
    }
    for model in &mut request.model_images {
        *model = resolve_image_ref(model, base)?;
    }

    let mut run = OutputRun::create(out, "affiliate")?;
    run.set_prompt(request.description.clone());
    let id = state.session.begin(|s| &mut s.affiliate);
    let result =
        orchestrator::generate_affiliate_sets(&state.gemini, &state.config, &request).await;

    settle(&mut state.session, |s| &mut s.affiliate, id, run, result, |run, result| {
        for set in &result.sets {
            let style = set.style.label().to_ascii_lowercase();
            for (index, data_url) in set.images.iter().enumerate() {
                run.write_image(&format!("{style}-{}", index + 1), data_url)?;
            }
        }
        Ok(())
    })
}

async fn feedback(
    state: &mut AppState,
    out: &Path,
    prompt_text: &str,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let language = language.unwrap_or(state.config.language);
    let mut run = OutputRun::create(out, "feedback")?;
    run.set_prompt(prompt_text);
    let id = state.session.begin(|s| &mut s.feedback);
    let result = orchestrator::prompt_feedback(&state.gemini, language, prompt_text).await;

    settle(&mut state.session, |s| &mut s.feedback, id, run, result, |run, text| {
        println!("{text}");
        run.write_text("feedback.md", text)?;
        Ok(())
    })
}

async fn suggest(
    state: &mut AppState,
    out: &Path,
    subject: &str,
    style: &str,
    environment: &str,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let language = language.unwrap_or(state.config.language);
    let run = OutputRun::create(out, "suggest")?;
    let id = state.session.begin(|s| &mut s.suggestions);
    let result =
        orchestrator::smart_suggestions(&state.gemini, language, subject, style, environment).await;

    settle(&mut state.session, |s| &mut s.suggestions, id, run, result, |run, suggestions| {
        for suggestion in suggestions {
            println!("- {suggestion}");
        }
        run.set_data(suggestions)?;
        Ok(())
    })
}

async fn dialogue(
    state: &mut AppState,
    out: &Path,
    subject: &str,
    action: &str,
    movement: &str,
    language: Option<PromptLanguage>,
) -> AppResult<()> {
    let language = language.unwrap_or(state.config.language);
    let run = OutputRun::create(out, "dialogue")?;
    let id = state.session.begin(|s| &mut s.dialogue);
    let result =
        orchestrator::dialogue_script(&state.gemini, language, subject, action, movement).await;

    settle(&mut state.session, |s| &mut s.dialogue, id, run, result, |run, line| {
        println!("{line}");
        run.set_data(line)?;
        Ok(())
    })
}

/// Writes the outputs (or the error) of a run, then resolves the feature slice.
fn settle<T, W>(
    session: &mut StudioSession,
    slice: Slice<T>,
    id: RequestId,
    mut run: OutputRun,
    result: AppResult<T>,
    write: W,
) -> AppResult<()>
where
    W: FnOnce(&mut OutputRun, &T) -> AppResult<()>,
{
    let result = settle_value(&mut run, result, write)?;
    let failure = result.as_ref().err().map(ToString::to_string);
    session.resolve(slice, id, result);

    println!("{}", run.finish()?.display());
    match failure {
        Some(message) => Err(AppError::msg(message)),
        None => Ok(()),
    }
}

/// Writes successful outputs or records the error on the run. The outer
/// result fails only when writing itself fails.
fn settle_value<T, W>(run: &mut OutputRun, result: AppResult<T>, write: W) -> AppResult<AppResult<T>>
where
    W: FnOnce(&mut OutputRun, &T) -> AppResult<()>,
{
    match result {
        Ok(value) => {
            write(run, &value)?;
            Ok(Ok(value))
        }
        Err(error) => {
            run.set_error(&error);
            Ok(Err(error))
        }
    }
}

fn read_options<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|error| {
        AppError::validation(format!("cannot read {}: {error}", path.display()))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_reference(path: &Path) -> AppResult<ReferenceImage> {
    ReferenceImage::from_data_url(&read_image_path_as_data_url(path)?)
}

/// Accepts either a data URL or an image path relative to `base`.
fn resolve_image_ref(value: &str, base: &Path) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with("data:") {
        return Ok(value.to_string());
    }
    read_image_path_as_data_url(&base.join(value))
}

fn wrap_cmd<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> AppResult<T>,
{
    f().map_err(|error| error.to_string())
}

async fn wrap_cmd_async<T, F>(f: F) -> Result<T, String>
where
    F: std::future::Future<Output = AppResult<T>>,
{
    f.await.map_err(|error| error.to_string())
}
