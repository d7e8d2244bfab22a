//! Spinner shown while the frontend is installed and built.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Spinner for work without a known duration.
///
/// Hidden in CI so logs stay free of carriage-return noise.
///
/// ```no_run
/// use hotswap_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building frontend...");
/// spinner.finish("Frontend built");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Start spinning right away.
    ///
    /// # Arguments
    ///
    /// * `message` - Text shown next to the spinner
    pub fn new(message: &str) -> Self {
        let pb = if super::is_ci() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Finish with a green checkmark.
    pub fn finish(&self, message: &str) {
        let mark = if super::colors_enabled() {
            "✓".green().to_string()
        } else {
            "✓".to_string()
        };
        self.pb.finish_with_message(format!("{} {}", mark, message));
    }

    /// Finish with a red cross.
    pub fn fail(&self, message: &str) {
        let mark = if super::colors_enabled() {
            "✗".red().to_string()
        } else {
            "✗".to_string()
        };
        self.pb.finish_with_message(format!("{} {}", mark, message));
    }
}
