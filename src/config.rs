use std::{str::FromStr, time::Duration};

use crate::models::PromptLanguage;

const DEFAULT_POSE_CONCURRENCY: usize = 1;
const DEFAULT_AFFILIATE_CONCURRENCY: usize = 12;
const DEFAULT_VIDEO_POLL_SECS: u64 = 10;

/// Runtime knobs of the studio orchestrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// In-flight limit for the 4 pose calls; 1 keeps them sequential.
    pub pose_concurrency: usize,
    pub affiliate_concurrency: usize,
    pub video_poll_interval: Duration,
    pub language: PromptLanguage,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            pose_concurrency: DEFAULT_POSE_CONCURRENCY,
            affiliate_concurrency: DEFAULT_AFFILIATE_CONCURRENCY,
            video_poll_interval: Duration::from_secs(DEFAULT_VIDEO_POLL_SECS),
            language: PromptLanguage::default(),
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pose_concurrency = parsed("GENOVA_POSE_CONCURRENCY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.pose_concurrency);
        let affiliate_concurrency = parsed("GENOVA_AFFILIATE_CONCURRENCY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.affiliate_concurrency);
        let video_poll_interval = parsed("GENOVA_VIDEO_POLL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.video_poll_interval);
        let language = match parsed("GENOVA_LANGUAGE").map(|v| PromptLanguage::from_str(&v)) {
            Some(Ok(language)) => language,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ignoring GENOVA_LANGUAGE");
                defaults.language
            }
            None => defaults.language,
        };

        Self {
            pose_concurrency,
            affiliate_concurrency,
            video_poll_interval,
            language,
        }
    }
}

/// Loads `.env` from the working directory and its parents, first match wins per key.
pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env");
    let _ = dotenvy::from_filename("../.env");
    let _ = dotenvy::from_filename("../../.env");
}
