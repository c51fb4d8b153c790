//! Styled terminal output for answers and status lines

use crossterm::style::Stylize;
use std::io::Write;

use super::theme::Theme;

/// Writes streamed answers to stdout and status lines to stderr
pub struct TerminalRenderer {
    theme: Theme,
}

impl TerminalRenderer {
    pub fn new(dark_mode: bool) -> Self {
        Self {
            theme: Theme::for_mode(dark_mode),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Render a streaming text delta (raw, no markdown processing)
    pub fn render_delta(&self, text: &str) {
        print!("{}", text.with(self.theme.answer));
        let _ = std::io::stdout().flush();
    }

    /// Finish the answer line
    pub fn end_answer(&self) {
        println!();
    }

    /// Render a transcript or other system message
    pub fn render_system(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            "\u{25b6}".with(self.theme.system),
            msg.with(self.theme.system)
        );
    }

    /// Render an error message
    pub fn render_error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            "\u{2717}".with(self.theme.error),
            msg.with(self.theme.error)
        );
    }

    /// Render a non-fatal warning
    pub fn render_warning(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            "!".with(self.theme.warning),
            msg.with(self.theme.warning)
        );
    }

    /// Render info text
    pub fn render_info(&self, msg: &str) {
        eprintln!("  {}", msg.with(self.theme.dim));
    }
}
