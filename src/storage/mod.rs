use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use image::{
    codecs::png::{CompressionType, FilterType, PngEncoder},
    ColorType, ImageEncoder,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ErrorView},
    media::ReferenceImage,
    models::GeneratedVideo,
};

const MANIFEST_FILE: &str = "run.json";

/// Record of one CLI invocation, written next to its outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub id: String,
    pub command: String,
    pub created_at: DateTime<Utc>,
    pub prompt: Option<String>,
    pub files: Vec<String>,
    pub data: Option<Value>,
    pub error: Option<ErrorView>,
}

/// Output directory of one run: `{root}/{yyyymmdd-HHMMSS}-{command}-{id}`.
pub struct OutputRun {
    dir: PathBuf,
    manifest: RunManifest,
}

impl OutputRun {
    pub fn create(root: &Path, command: &str) -> AppResult<Self> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let short_id = id.split('-').next().unwrap_or(&id).to_string();
        let dir = root.join(format!("{}-{command}-{short_id}", now.format("%Y%m%d-%H%M%S")));
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            manifest: RunManifest {
                id,
                command: command.to_string(),
                created_at: now,
                prompt: None,
                files: Vec::new(),
                data: None,
                error: None,
            },
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn set_prompt<S: Into<String>>(&mut self, prompt: S) {
        self.manifest.prompt = Some(prompt.into());
    }

    pub fn set_data<T: Serialize>(&mut self, data: &T) -> AppResult<()> {
        self.manifest.data = Some(serde_json::to_value(data)?);
        Ok(())
    }

    pub fn set_error(&mut self, error: &AppError) {
        self.manifest.error = Some(ErrorView::from(error));
    }

    /// Decodes a generated image and stores it as an optimized PNG.
    pub fn write_image(&mut self, name: &str, data_url: &str) -> AppResult<PathBuf> {
        let source = ReferenceImage::from_data_url(data_url)?;
        let image = image::load_from_memory(&source.bytes)?.into_rgba8();
        let png_bytes = encode_png_optimized(image.as_raw(), image.width(), image.height())?;
        self.write_file(&format!("{name}.png"), &png_bytes)
    }

    pub fn write_video(&mut self, name: &str, video: &GeneratedVideo) -> AppResult<PathBuf> {
        let extension = match video.mime_type.as_str() {
            "video/webm" => "webm",
            _ => "mp4",
        };
        self.write_file(&format!("{name}.{extension}"), &video.bytes)
    }

    pub fn write_text(&mut self, file_name: &str, contents: &str) -> AppResult<PathBuf> {
        self.write_file(file_name, contents.as_bytes())
    }

    pub fn write_json_file<T: Serialize>(&mut self, file_name: &str, value: &T) -> AppResult<PathBuf> {
        let path = self.dir.join(file_name);
        write_json(&path, value)?;
        self.manifest.files.push(file_name.to_string());
        Ok(path)
    }

    /// Writes `run.json` and returns the run directory.
    pub fn finish(self) -> AppResult<PathBuf> {
        write_json(&self.dir.join(MANIFEST_FILE), &self.manifest)?;
        tracing::info!(dir = %self.dir.display(), files = self.manifest.files.len(), "run saved");
        Ok(self.dir)
    }

    fn write_file(&mut self, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)?;
        self.manifest.files.push(file_name.to_string());
        Ok(path)
    }
}

pub fn load_manifest(run_dir: &Path) -> AppResult<RunManifest> {
    let path = run_dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(AppError::msg(format!(
            "run manifest not found: {}",
            path.display()
        )));
    }
    read_json(&path)
}

fn encode_png_optimized(rgba: &[u8], width: u32, height: u32) -> AppResult<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = PngEncoder::new_with_quality(
            &mut png_bytes,
            CompressionType::Best,
            FilterType::Adaptive,
        );
        encoder
            .write_image(rgba, width, height, ColorType::Rgba8)
            .map_err(|error| AppError::msg(format!("failed to encode png: {error}")))?;
    }

    let mut options = oxipng::Options::from_preset(3);
    options.strip = oxipng::StripChunks::Safe;

    oxipng::optimize_from_memory(&png_bytes, &options)
        .map_err(|error| AppError::msg(format!("failed to optimize png: {error}")))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str::<T>(&contents)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn run_writes_files_and_manifest() {
        let root = tempfile::tempdir().unwrap();
        let mut run = OutputRun::create(root.path(), "images").unwrap();
        run.set_prompt("a red bicycle");

        let image = run.write_image("pose-01", PIXEL_DATA_URL).unwrap();
        assert!(image.ends_with("pose-01.png"));
        assert!(image::open(&image).is_ok());

        run.write_video(
            "clip",
            &GeneratedVideo {
                mime_type: "video/mp4".into(),
                bytes: vec![0, 1, 2],
            },
        )
        .unwrap();

        let dir = run.finish().unwrap();
        let manifest = load_manifest(&dir).unwrap();
        assert_eq!(manifest.command, "images");
        assert_eq!(manifest.prompt.as_deref(), Some("a red bicycle"));
        assert_eq!(manifest.files, vec!["pose-01.png", "clip.mp4"]);
        assert!(manifest.error.is_none());
    }

    #[test]
    fn failed_run_keeps_error_view() {
        let root = tempfile::tempdir().unwrap();
        let mut run = OutputRun::create(root.path(), "video").unwrap();
        run.set_error(&AppError::SafetyBlocked);

        let manifest = load_manifest(&run.finish().unwrap()).unwrap();
        assert_eq!(
            manifest.error.map(|e| e.kind),
            Some(crate::error::ErrorKind::SafetyBlocked)
        );
    }

    #[test]
    fn rejects_non_image_payloads() {
        let root = tempfile::tempdir().unwrap();
        let mut run = OutputRun::create(root.path(), "images").unwrap();
        assert!(run.write_image("broken", "data:text/plain;base64,aGk=").is_err());
        assert!(load_manifest(run.dir()).is_err());
    }
}
