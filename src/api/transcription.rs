//! Audio transcription (single multipart request, no streaming)

use super::status::{error_message, reason};
use super::ApiError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Recorded audio ready for upload
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl AudioClip {
    /// A browser-style recording (`audio.webm`)
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "audio.webm".to_string(),
            mime: "audio/webm".to_string(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Attachment(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.webm".to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            bytes,
            file_name,
            mime,
        })
    }
}

/// Speech-to-text backends
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, api_key: &str, clip: AudioClip) -> Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for `POST {base_url}/audio/transcriptions`
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl TranscriptionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/audio/transcriptions", base_url.trim_end_matches('/')),
            model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    async fn transcribe(&self, api_key: &str, clip: AudioClip) -> Result<String, ApiError> {
        debug!(
            "Sending {} bytes of audio to {}",
            clip.bytes.len(),
            self.endpoint
        );

        let file = Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&clip.mime)
            .map_err(|e| ApiError::Attachment(format!("Invalid audio MIME type: {}", e)))?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| reason(status.as_u16()));
            return Err(ApiError::Transcription(message));
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}
