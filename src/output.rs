//! # Output Configuration
//!
//! Controls how the CLI decorates its messages, based on terminal
//! capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust
//! use zero_scaffold::output::{status, OutputConfig, Status};
//!
//! let config = OutputConfig::from_env_and_flag("never");
//! assert_eq!(status(&config, Status::Done, "Created demo"), "[done] Created demo");
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and symbols.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: `always`, `never` or `auto`.
    /// In auto mode colors are disabled when `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        // Keep console's own styling decisions in line with ours
        console::set_colors_enabled(use_color);
        console::set_colors_enabled_stderr(use_color);

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Kind of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Warn,
    Info,
    Hint,
}

impl Status {
    fn symbol(&self) -> &'static str {
        match self {
            Status::Done => "✔",
            Status::Warn => "⚠",
            Status::Info => "ℹ",
            Status::Hint => "→",
        }
    }

    fn plain(&self) -> &'static str {
        match self {
            Status::Done => "[done]",
            Status::Warn => "[warn]",
            Status::Info => "[info]",
            Status::Hint => "[hint]",
        }
    }
}

/// Format one status line: a colored symbol when colors are on, a bracketed
/// tag otherwise.
pub fn status(config: &OutputConfig, kind: Status, message: &str) -> String {
    if !config.use_color {
        return format!("{} {}", kind.plain(), message);
    }
    let symbol = match kind {
        Status::Done => style(kind.symbol()).green().bold(),
        Status::Warn => style(kind.symbol()).yellow().bold(),
        Status::Info => style(kind.symbol()).cyan(),
        Status::Hint => style(kind.symbol()).dim(),
    };
    format!("{} {}", symbol.force_styling(true), message)
}
