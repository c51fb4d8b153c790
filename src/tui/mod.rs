//! Terminal answer pane
//!
//! Consumes an answer stream: spinner until the first delta, raw deltas as
//! they arrive, then one status line for warnings, failure or cancellation.

pub mod renderer;
pub mod spinner;
pub mod theme;

use crate::api::{StreamEvent, StreamOutcome};
use futures_util::{Stream, StreamExt};
use renderer::TerminalRenderer;
use spinner::ThinkingSpinner;
use tracing::debug;

/// What the pane showed for one answer
#[derive(Debug)]
pub struct PaneSummary {
    pub answer: String,
    pub warnings: usize,
    pub outcome: StreamOutcome,
}

/// Prints one answer stream to the terminal
pub struct AnswerPane {
    renderer: TerminalRenderer,
}

impl AnswerPane {
    pub fn new(dark_mode: bool) -> Self {
        Self {
            renderer: TerminalRenderer::new(dark_mode),
        }
    }

    pub fn renderer(&self) -> &TerminalRenderer {
        &self.renderer
    }

    /// Render the stream until its `Finished` event
    pub async fn show<S>(&self, stream: S) -> PaneSummary
    where
        S: Stream<Item = StreamEvent>,
    {
        futures_util::pin_mut!(stream);

        let mut spinner = ThinkingSpinner::new(self.renderer.theme().spinner);
        spinner.start("Thinking...");

        let mut answer = String::new();
        let mut warnings = 0;
        let mut outcome = None;

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Delta(text) => {
                    if let Some(waited) = spinner.stop() {
                        debug!("First delta after {:?}", waited);
                    }
                    self.renderer.render_delta(&text);
                    answer.push_str(&text);
                }
                StreamEvent::Warning(_) => warnings += 1,
                StreamEvent::Finished(done) => {
                    outcome = Some(done);
                    break;
                }
            }
        }

        spinner.stop();
        if !answer.is_empty() {
            self.renderer.end_answer();
        }

        if warnings > 0 {
            self.renderer
                .render_warning(&format!("Skipped {} unparseable frame(s)", warnings));
        }

        let outcome = outcome.unwrap_or_else(|| {
            StreamOutcome::Failed(crate::api::ApiError::Transport(
                "answer stream closed without an outcome".to_string(),
            ))
        });

        match &outcome {
            StreamOutcome::Completed => {
                if answer.is_empty() {
                    self.renderer.render_info("No response received.");
                }
            }
            StreamOutcome::Cancelled => self.renderer.render_warning("Cancelled"),
            StreamOutcome::Failed(e) => self.renderer.render_error(&e.to_string()),
        }

        PaneSummary {
            answer,
            warnings,
            outcome,
        }
    }
}
