//! promptbox - Stream chat-completion answers into the terminal
//!
//! ## Key Features
//!
//! - **Streaming answers**: SSE token stream decoded incrementally, chunk-boundary independent
//! - **Cancellation**: one `CancellationToken` per request, reported as its own outcome
//! - **Voice turns**: transcribe a recording, then answer it
//! - **Settings & history**: TOML settings file with MRU prompt history

pub mod api;
pub mod config;
pub mod history;
pub mod tui;
pub mod voice;

pub use api::{
    ApiError, AnswerStream, ChatClient, StreamEvent, StreamOutcome, StreamRequest,
    StreamingProvider, Transcriber, TranscriptionClient,
};
pub use config::{ConfigError, Settings, SettingsBuilder};
pub use history::PromptHistory;
pub use voice::{VoiceExchange, VoiceTurn};
