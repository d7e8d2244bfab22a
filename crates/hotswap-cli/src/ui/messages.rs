//! Status lines printed to stderr during a dev session.

use owo_colors::{OwoColorize, Style};

use super::colors_enabled;

fn paint(text: &str, style: Style) -> String {
    if colors_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Print a success message to stderr.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::ui::success;
///
/// success("Frontend built");
/// ```
pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

/// Print an info message to stderr.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::ui::info;
///
/// info("[Rebuild triggered] files updated");
/// ```
pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

/// Print a warning message to stderr.
///
/// Used for everything the session recovers from: failed reload requests,
/// watcher errors, a crashed frontend watcher.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::ui::warning;
///
/// warning("Unable to reload application: connection refused");
/// ```
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

/// Print an error message to stderr.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::ui::error;
///
/// error("Build error - main.go:3:1: syntax error");
/// ```
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", Style::new().red().bold()),
        paint(message, Style::new().red())
    );
}

/// Print a labelled URL.
///
/// # Arguments
///
/// * `label` - Text before the colon
/// * `url` - URL, underlined when colour is on
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::ui::url;
///
/// url("Using DevServer URL", "http://localhost:34115");
/// ```
pub fn url(label: &str, url: &str) {
    eprintln!(
        "{} {}: {}",
        paint("ℹ", Style::new().blue().bold()),
        label,
        paint(url, Style::new().cyan().underline())
    );
}
