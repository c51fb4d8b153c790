//! Waiting spinner shown until the first delta arrives

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// A spinner shown while waiting for the first token
pub struct ThinkingSpinner {
    bar: ProgressBar,
    started: Option<Instant>,
}

impl ThinkingSpinner {
    pub fn new(color: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let template = format!("  {{spinner:.{}}} {{msg}} {{elapsed:.dim}}", color);
        if let Ok(style) = ProgressStyle::with_template(&template) {
            bar.set_style(style.tick_strings(&[
                "\u{2800}", "\u{2801}", "\u{2803}", "\u{2807}", "\u{280f}", "\u{281f}",
                "\u{283f}", "\u{287f}", "\u{28ff}", "\u{28fe}", "\u{28fc}", "\u{28f8}",
                "\u{28f0}", "\u{28e0}", "\u{28c0}", "\u{2880}", "\u{2800}",
            ]));
        }
        Self { bar, started: None }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.started = Some(Instant::now());
    }

    /// Stop and clear the spinner, returning how long it spun.
    /// `None` if it was not running.
    pub fn stop(&mut self) -> Option<Duration> {
        let started = self.started.take()?;
        self.bar.finish_and_clear();
        Some(started.elapsed())
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }
}

impl Drop for ThinkingSpinner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reports_wait_once() {
        let mut spinner = ThinkingSpinner::new("cyan");
        assert!(spinner.stop().is_none());

        spinner.start("Thinking...");
        assert!(spinner.is_active());
        std::thread::sleep(Duration::from_millis(5));

        let waited = spinner.stop().unwrap();
        assert!(waited >= Duration::from_millis(5));
        assert!(!spinner.is_active());
        assert!(spinner.stop().is_none());
    }
}
