use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::model::ScanResult;
use crate::{config::RecognizerConfig, error::RecognitionError};

/// An image picked by the user, ready to send.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Rejects empty payloads and anything that is not `image/*`.
    pub fn check(&self) -> Result<(), RecognitionError> {
        if !self.content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(RecognitionError::UnsupportedMedia(self.content_type.clone()));
        }
        if self.body.is_empty() {
            return Err(RecognitionError::EmptyImage);
        }
        Ok(())
    }

    fn file_name_or_default(&self) -> String {
        self.file_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("upload.{}", ext_from_mime(&self.content_type)))
    }
}

/// The food-recognition backend.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(
        &self,
        image: ImageUpload,
        user_id: &str,
    ) -> Result<ScanResult, RecognitionError>;
}

/// Calls `POST {base_url}/food/recognize` with a multipart form.
#[derive(Clone)]
pub struct HttpRecognizer {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpRecognizer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(cfg: &RecognizerConfig) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self::new(client, cfg.base_url.clone()))
    }

    fn endpoint(&self) -> String {
        format!("{}/food/recognize", self.base_url)
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    #[instrument(skip(self, image), fields(bytes = image.body.len(), content_type = %image.content_type))]
    async fn recognize(
        &self,
        image: ImageUpload,
        user_id: &str,
    ) -> Result<ScanResult, RecognitionError> {
        image.check()?;

        let part = multipart::Part::bytes(image.body.to_vec())
            .file_name(image.file_name_or_default())
            .mime_str(&image.content_type)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string());

        let response = self.client.post(self.endpoint()).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = detail_from_body(&text);
            warn!(%status, %detail, "recognizer rejected image");
            return Err(RecognitionError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.bytes().await?;
        let result: ScanResult = serde_json::from_slice(&body)
            .map_err(|e| RecognitionError::UnexpectedShape(e.to_string()))?;
        result.validate().map_err(RecognitionError::UnexpectedShape)?;

        debug!(
            foods = result.detected_foods().len(),
            calories = result.total_nutrition().calories,
            "recognition succeeded"
        );
        Ok(result)
    }
}

/// Pulls `detail` out of an error body. FastAPI-style validation errors carry
/// a list there; the first message is used.
fn detail_from_body(text: &str) -> String {
    let Ok(body) = serde_json::from_str::<ErrorBody>(text) else {
        return String::new();
    };
    match body.detail {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|i| i.get("msg").and_then(|m| m.as_str()))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn ext_from_mime(ct: &str) -> &'static str {
    match ct {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "bin",
    }
}
