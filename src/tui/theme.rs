//! Terminal theme and color definitions

use crossterm::style::Color;

/// Colors for the answer pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Color for streamed answer text
    pub answer: Color,
    /// Color for transcripts and system messages
    pub system: Color,
    /// Color for error messages
    pub error: Color,
    /// Color for parse warnings and the cancelled notice
    pub warning: Color,
    /// Color for dim/secondary info
    pub dim: Color,
    /// Spinner color name for indicatif templates
    pub spinner: &'static str,
}

impl Theme {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn dark() -> Self {
        Self {
            answer: Color::White,
            system: Color::DarkYellow,
            error: Color::Red,
            warning: Color::Yellow,
            dim: Color::DarkGrey,
            spinner: "cyan",
        }
    }

    pub fn light() -> Self {
        Self {
            answer: Color::Black,
            system: Color::DarkBlue,
            error: Color::DarkRed,
            warning: Color::DarkYellow,
            dim: Color::Grey,
            spinner: "blue",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
