//! Terminal styling for listing output.

/// ANSI escape codes used by the text renderer.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bright bold white for table numbers.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Green for time slots.
    pub const GREEN: &str = "\x1b[32m";
    /// Gray for reservation ids and other secondary columns.
    pub const GRAY: &str = "\x1b[90m";
}

/// Resolved color codes, or empty strings when color is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub white_bold: &'static str,
    pub green: &'static str,
    pub gray: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            white_bold: colors::WHITE_BOLD,
            green: colors::GREEN,
            gray: colors::GRAY,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            white_bold: "",
            green: "",
            gray: "",
        }
    }

    /// `colored()` when the terminal supports ANSI colors, else `plain()`.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Honors `NO_COLOR` (<https://no-color.org/>) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    color_allowed(
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn color_allowed(no_color: bool, term: Option<&str>) -> bool {
    if no_color {
        return false;
    }
    !term.is_some_and(|term| term.eq_ignore_ascii_case("dumb"))
}
