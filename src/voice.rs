//! Voice turns: transcribe a recording, then stream an answer to it

use crate::api::{
    collect_answer, ApiError, AudioClip, StreamOutcome, StreamRequest, StreamingProvider,
    Transcriber,
};
use crate::config::Settings;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of one voice turn
#[derive(Debug)]
pub struct VoiceExchange {
    pub transcript: String,
    pub answer: String,
    pub outcome: StreamOutcome,
}

/// Transcribes with `T`, answers with `P`, using the system prompt and voice temperature
pub struct VoiceTurn<'a, T, P> {
    transcriber: &'a T,
    provider: &'a P,
    settings: &'a Settings,
}

impl<'a, T, P> VoiceTurn<'a, T, P>
where
    T: Transcriber,
    P: StreamingProvider,
{
    pub fn new(transcriber: &'a T, provider: &'a P, settings: &'a Settings) -> Self {
        Self {
            transcriber,
            provider,
            settings,
        }
    }

    /// Transcribe `clip`. Refused while `voice.enabled` is off.
    pub async fn transcribe(&self, clip: AudioClip) -> Result<String, ApiError> {
        if !self.settings.voice.enabled {
            return Err(ApiError::VoiceDisabled);
        }
        let api_key = self.settings.api_key().ok_or(ApiError::MissingApiKey)?;

        let transcript = self.transcriber.transcribe(&api_key, clip).await?;
        info!("Transcription: {}", transcript);
        Ok(transcript)
    }

    /// Stream an answer to `transcript`. `on_delta` sees it as it arrives.
    pub async fn answer(
        &self,
        transcript: &str,
        cancel: CancellationToken,
        on_delta: impl FnMut(&str),
    ) -> Result<(String, StreamOutcome), ApiError> {
        let request = StreamRequest::from_settings(self.settings)?
            .with_temperature(self.settings.voice.temperature)
            .with_user(transcript, &[])
            .with_cancel(cancel);

        let (answer, outcome) = collect_answer(self.provider.stream_answer(request), on_delta).await;
        info!("Answer: {}", answer);
        Ok((answer, outcome))
    }

    /// Transcribe, then answer.
    ///
    /// A failed transcription is returned as an error; a failed or cancelled
    /// answer is reported through `VoiceExchange::outcome`.
    pub async fn run(
        &self,
        clip: AudioClip,
        cancel: CancellationToken,
        on_delta: impl FnMut(&str),
    ) -> Result<VoiceExchange, ApiError> {
        let transcript = self.transcribe(clip).await?;
        let (answer, outcome) = self.answer(&transcript, cancel, on_delta).await?;

        Ok(VoiceExchange {
            transcript,
            answer,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnswerStream, Message, MessageContent, StreamEvent};
    use crate::config::SettingsBuilder;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    struct FixedTranscriber(Result<&'static str, &'static str>);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _api_key: &str, _clip: AudioClip) -> Result<String, ApiError> {
            self.0
                .map(str::to_string)
                .map_err(|msg| ApiError::Transcription(msg.to_string()))
        }
    }

    /// Replays canned deltas and remembers the request it was given
    #[derive(Default)]
    struct ScriptedProvider {
        deltas: Vec<&'static str>,
        seen: Mutex<Option<StreamRequest>>,
    }

    impl StreamingProvider for ScriptedProvider {
        fn stream_answer(&self, request: StreamRequest) -> AnswerStream {
            let (tx, rx) = mpsc::channel(self.deltas.len() + 1);
            for delta in &self.deltas {
                tx.try_send(StreamEvent::Delta(delta.to_string())).unwrap();
            }
            tx.try_send(StreamEvent::Finished(StreamOutcome::Completed))
                .unwrap();
            *self.seen.lock().unwrap() = Some(request);
            ReceiverStream::new(rx)
        }
    }

    fn settings() -> Settings {
        SettingsBuilder::new()
            .api_key("sk-test")
            .system_prompt("You are a voice assistant")
            .voice_enabled(true)
            .build()
    }

    #[tokio::test]
    async fn test_voice_turn() {
        let settings = settings();
        let transcriber = FixedTranscriber(Ok("what time is it"));
        let provider = ScriptedProvider {
            deltas: vec!["It is ", "noon."],
            ..Default::default()
        };

        let mut streamed = String::new();
        let exchange = VoiceTurn::new(&transcriber, &provider, &settings)
            .run(
                AudioClip::webm(vec![0; 4]),
                CancellationToken::new(),
                |d| streamed.push_str(d),
            )
            .await
            .unwrap();

        assert_eq!(exchange.transcript, "what time is it");
        assert_eq!(exchange.answer, "It is noon.");
        assert_eq!(streamed, "It is noon.");
        assert!(exchange.outcome.is_completed());

        let request = provider.seen.lock().unwrap().take().unwrap();
        assert_eq!(request.temperature, 0.7);
        assert_eq!(
            request.messages,
            vec![
                Message::system("You are a voice assistant"),
                Message::user("what time is it", &[]),
            ]
        );
        assert_eq!(
            request.messages[1].content,
            MessageContent::Text("what time is it".into())
        );
    }

    #[tokio::test]
    async fn test_transcription_failure_is_an_error() {
        let settings = settings();
        let transcriber = FixedTranscriber(Err("Invalid file format."));
        let provider = ScriptedProvider::default();

        let err = VoiceTurn::new(&transcriber, &provider, &settings)
            .run(AudioClip::webm(Vec::new()), CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Audio transcription error: Invalid file format.");
        assert!(provider.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transcript_available_before_answer() {
        let settings = settings();
        let transcriber = FixedTranscriber(Ok("hello"));
        let provider = ScriptedProvider {
            deltas: vec!["Hi"],
            ..Default::default()
        };
        let turn = VoiceTurn::new(&transcriber, &provider, &settings);

        let transcript = turn.transcribe(AudioClip::webm(Vec::new())).await.unwrap();
        assert_eq!(transcript, "hello");
        assert!(provider.seen.lock().unwrap().is_none());

        let (answer, outcome) = turn
            .answer(&transcript, CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(answer, "Hi");
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_disabled_voice_is_refused() {
        let settings = SettingsBuilder::new().api_key("sk-test").build();
        let transcriber = FixedTranscriber(Ok("hi"));
        let provider = ScriptedProvider::default();

        let err = VoiceTurn::new(&transcriber, &provider, &settings)
            .run(AudioClip::webm(Vec::new()), CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::VoiceDisabled));
        assert!(provider.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let settings = SettingsBuilder::new().voice_enabled(true).build();
        let transcriber = FixedTranscriber(Ok("hi"));
        let provider = ScriptedProvider::default();

        let err = VoiceTurn::new(&transcriber, &provider, &settings)
            .run(AudioClip::webm(Vec::new()), CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));
    }
}
