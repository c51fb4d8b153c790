//! Chat-completion and transcription API layer

mod client;
mod request;
pub mod sse;
mod status;
mod streaming;
mod transcription;

pub use client::ChatClient;
pub use request::{
    compose_prompt, ContentPart, ImageAttachment, ImageUrl, Message, MessageContent, Role,
    StreamRequest,
};
pub use sse::{DecodedFrame, DeltaDecoder, ParseWarning};
pub use status::{check_status, classify_failure, error_message};
pub use streaming::{collect_answer, AnswerStream, StreamEvent, StreamOutcome, StreamingProvider};
pub use transcription::{AudioClip, Transcriber, TranscriptionClient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Rate limit exceeded. Please wait before making another request.")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Fetch failed. Status code: {status}")]
    Http { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Audio transcription error: {0}")]
    Transcription(String),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Voice mode is disabled (set voice.enabled = true)")]
    VoiceDisabled,

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}
