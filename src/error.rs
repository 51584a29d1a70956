use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Validation(String),
    #[error("generation was blocked by the safety policy; change the prompt or the reference image")]
    SafetyBlocked,
    #[error("generation was blocked because recitation was detected; change the prompt")]
    RecitationBlocked,
    #[error("the model stopped for an unexpected reason{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_else(|| ".".to_string()))]
    StoppedUnexpectedly(Option<String>),
    #[error("{}", no_media_message(.text.as_deref()))]
    NoMedia { text: Option<String> },
    #[error("authorization failed, select your API key again ({0})")]
    Authorization(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode/encode error: {0}")]
    Image(#[from] image::ImageError),
}

/// User-facing error category, independent of where the failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    SafetyBlocked,
    RecitationBlocked,
    NoMediaReturned,
    AuthorizationFailed,
    MalformedResponse,
    Unknown,
}

impl AppError {
    pub fn msg<T: Into<String>>(message: T) -> Self {
        Self::Message(message.into())
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub fn malformed<T: Into<String>>(message: T) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn no_media(text: Option<String>) -> Self {
        Self::NoMedia {
            text: text.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::SafetyBlocked => ErrorKind::SafetyBlocked,
            Self::RecitationBlocked => ErrorKind::RecitationBlocked,
            Self::NoMedia { .. } => ErrorKind::NoMediaReturned,
            Self::Authorization(_) => ErrorKind::AuthorizationFailed,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::StoppedUnexpectedly(_)
            | Self::Message(_)
            | Self::Io(_)
            | Self::Serde(_)
            | Self::Http(_)
            | Self::Base64(_)
            | Self::Image(_) => ErrorKind::Unknown,
        }
    }

    /// The caller must ask the user to pick credentials again before retrying.
    pub fn requires_reauthorization(&self) -> bool {
        self.kind() == ErrorKind::AuthorizationFailed
    }
}

fn no_media_message(text: Option<&str>) -> String {
    match text {
        Some(text) => format!("the model responded with text instead of media: \"{text}\""),
        None => "no media was found in the response; the model may not be able to fulfil the request".to_string(),
    }
}

/// Snapshot of an error as stored in feature state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AppError> for ErrorView {
    fn from(error: &AppError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
