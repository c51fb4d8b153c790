//! API request structures

use super::ApiError;
use crate::config::Settings;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Plain text, or text followed by image parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message; images go in as extra content parts after the text
    pub fn user(text: impl Into<String>, images: &[ImageAttachment]) -> Self {
        let text = text.into();
        let content = if images.is_empty() {
            MessageContent::Text(text)
        } else {
            let mut parts = vec![ContentPart::Text { text }];
            parts.extend(images.iter().map(|img| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: img.data_url.clone(),
                },
            }));
            MessageContent::Parts(parts)
        };

        Self {
            role: Role::User,
            content,
        }
    }
}

/// An image encoded as a `data:` URL
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub data_url: String,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Self {
        Self {
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        }
    }

    /// Read an image file, taking the MIME type from its extension
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(ApiError::Attachment(format!(
                "{} is not an image ({})",
                path.display(),
                mime
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Attachment(format!("{}: {}", path.display(), e)))?;

        Ok(Self::from_bytes(&bytes, mime.essence_str()))
    }
}

/// Join the prompt with optional extra context
pub fn compose_prompt(prompt: &str, context: &str) -> String {
    if context.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", prompt, context)
    }
}

/// One streaming chat-completion call. Built once, then moved into the client.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub cancel: CancellationToken,
}

/// Wire body for `POST /chat/completions`
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    n: u32,
    stream: bool,
}

impl StreamRequest {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            messages: Vec::new(),
            temperature: 1.0,
            cancel: CancellationToken::new(),
        }
    }

    /// Endpoint, key, model, temperature and system prompt from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let api_key = settings.api_key().ok_or(ApiError::MissingApiKey)?;
        let request = Self::new(settings.chat_endpoint(), api_key, settings.model())
            .with_temperature(settings.chat.temperature)
            .with_system(&settings.chat.system_prompt);
        Ok(request)
    }

    /// Prepend a system message; blank prompts are skipped
    pub fn with_system(mut self, system: &str) -> Self {
        if !system.trim().is_empty() {
            self.messages.insert(0, Message::system(system));
        }
        self
    }

    pub fn with_user(mut self, text: impl Into<String>, images: &[ImageAttachment]) -> Self {
        self.messages.push(Message::user(text, images));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// JSON body with `stream: true`
    pub fn body(&self) -> Result<serde_json::Value, ApiError> {
        let body = serde_json::to_value(ChatCompletionBody {
            model: &self.model,
            messages: &self.messages,
            temperature: self.temperature,
            n: 1,
            stream: true,
        })?;
        Ok(body)
    }
}
