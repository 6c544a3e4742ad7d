use thiserror::Error;

use crate::onboarding::{Field, Step};

/// Message shown when the recognizer fails without a usable detail.
pub const RECOGNITION_FALLBACK_MESSAGE: &str = "Failed to process image. Please try again.";

/// Required fields are missing; blocks a wizard transition or a profile save.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step:?} is missing {missing:?}")]
pub struct ValidationError {
    pub step: Step,
    pub missing: Vec<Field>,
}

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Incomplete(#[from] ValidationError),
    #[error("onboarding already complete")]
    AlreadyComplete,
    #[error("persist profile: {0}")]
    Persist(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("a recognition request is already in flight")]
    Busy,
    #[error("unsupported content type: {0}")]
    UnsupportedMedia(String),
    #[error("image payload is empty")]
    EmptyImage,
    #[error("recognizer rejected the image ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("recognizer transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected recognizer payload: {0}")]
    UnexpectedShape(String),
}

impl RecognitionError {
    /// Text for the user. Only a recognizer-provided detail is passed through.
    pub fn display_message(&self) -> String {
        match self {
            RecognitionError::Busy => "An image is already being analyzed.".into(),
            RecognitionError::UnsupportedMedia(_) => "Please select an image file.".into(),
            RecognitionError::EmptyImage => "Please select an image first.".into(),
            RecognitionError::Rejected { detail, .. } if !detail.trim().is_empty() => {
                detail.clone()
            }
            _ => RECOGNITION_FALLBACK_MESSAGE.into(),
        }
    }
}
