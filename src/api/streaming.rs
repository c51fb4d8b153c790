//! Streaming response support: events, outcomes and the body read loop

use super::sse::{DecodedFrame, DeltaDecoder, ParseWarning};
use super::{ApiError, StreamRequest};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Channel capacity between the read loop and the consumer
pub(crate) const STREAM_BUFFER: usize = 64;

/// One item of an answer stream. `Finished` is always the last item.
#[derive(Debug)]
pub enum StreamEvent {
    /// A text delta, in arrival order
    Delta(String),
    /// A frame was skipped because it could not be parsed
    Warning(ParseWarning),
    /// The stream is over
    Finished(StreamOutcome),
}

/// How a stream ended
#[derive(Debug)]
pub enum StreamOutcome {
    Completed,
    /// The caller's token fired. Not a failure.
    Cancelled,
    Failed(ApiError),
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamOutcome::Cancelled)
    }
}

/// Lazy sequence of [`StreamEvent`]s for one request
pub type AnswerStream = ReceiverStream<StreamEvent>;

/// Providers that stream an answer
pub trait StreamingProvider: Send + Sync {
    /// Issue the request and return its events. Failures and cancellation
    /// arrive as the final `Finished` event, never as an early error.
    fn stream_answer(&self, request: StreamRequest) -> AnswerStream;
}

/// Drive a response body through the decoder until `[DONE]`, end of body,
/// a transport error, or cancellation.
pub(crate) async fn pump_body<S, B, E>(
    body: S,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<StreamEvent>,
) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures_util::pin_mut!(body);
    let mut decoder = DeltaDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return StreamOutcome::Failed(ApiError::Transport(e.to_string())),
            None => {
                if decoder.pending() > 0 {
                    debug!("Dropping {} unterminated bytes at end of body", decoder.pending());
                }
                return StreamOutcome::Completed;
            }
        };

        for frame in decoder.feed(chunk.as_ref()) {
            let event = match frame {
                DecodedFrame::Delta(text) => StreamEvent::Delta(text),
                DecodedFrame::Warning(warning) => {
                    warn!("{}", warning);
                    StreamEvent::Warning(warning)
                }
                DecodedFrame::Done => return StreamOutcome::Completed,
            };

            // A consumer that stops pulling must not keep the body open past cancel
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => return StreamOutcome::Cancelled,
                sent = tx.send(event) => sent,
            };
            if sent.is_err() {
                debug!("Answer stream dropped by consumer");
                return StreamOutcome::Cancelled;
            }
        }
    }
}

/// Consume a stream, calling `on_delta` for each delta, and return the
/// accumulated answer with the outcome.
pub async fn collect_answer<S>(stream: S, mut on_delta: impl FnMut(&str)) -> (String, StreamOutcome)
where
    S: Stream<Item = StreamEvent>,
{
    futures_util::pin_mut!(stream);
    let mut answer = String::new();

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Delta(text) => {
                on_delta(&text);
                answer.push_str(&text);
            }
            StreamEvent::Warning(_) => {}
            StreamEvent::Finished(outcome) => return (answer, outcome),
        }
    }

    let outcome = StreamOutcome::Failed(ApiError::Transport(
        "answer stream closed without an outcome".to_string(),
    ));
    (answer, outcome)
}
