//! Streaming chat-completion client

use super::status::check_status;
use super::streaming::{
    pump_body, AnswerStream, StreamEvent, StreamOutcome, StreamingProvider, STREAM_BUFFER,
};
use super::{ApiError, StreamRequest};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Chat-completion client for OpenAI-compatible endpoints
#[derive(Debug, Clone, Default)]
pub struct ChatClient {
    client: Client,
}

impl ChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing HTTP client (connection pool, proxies, timeouts)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn issue(
        client: &Client,
        request: &StreamRequest,
        body: &Value,
    ) -> Result<Response, ApiError> {
        let response = client
            .post(&request.endpoint)
            .bearer_auth(&request.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn run(
        client: Client,
        request: StreamRequest,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> StreamOutcome {
        let cancel = request.cancel.clone();

        let body = match request.body() {
            Ok(body) => body,
            Err(e) => return StreamOutcome::Failed(e),
        };

        debug!(
            "POST {} (model {}, {} messages)",
            request.endpoint,
            request.model,
            request.messages.len()
        );

        // Status is classified once, before any body bytes are read
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled,
            response = Self::issue(&client, &request, &body) => response,
        };

        match response {
            Ok(response) => pump_body(response.bytes_stream(), &cancel, tx).await,
            Err(e) => StreamOutcome::Failed(e),
        }
    }
}

impl StreamingProvider for ChatClient {
    fn stream_answer(&self, request: StreamRequest) -> AnswerStream {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let client = self.client.clone();

        tokio::spawn(async move {
            let outcome = Self::run(client, request, &tx).await;
            debug!("Answer stream finished: {:?}", outcome);
            let _ = tx.send(StreamEvent::Finished(outcome)).await;
        });

        ReceiverStream::new(rx)
    }
}
