//! Terminal output for the dev session.
//!
//! Every recoverable problem in the session ends up here as one coloured line
//! on stderr. Colour is decided once from the environment (`NO_COLOR`,
//! `FORCE_COLOR`) and the terminal.
//!
//! ```no_run
//! use hotswap_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Watching (sub)/directory: /project/frontend");
//! ui::warning("Continuing to run current version");
//! ```

mod messages;
mod spinner;

use std::sync::atomic::{AtomicBool, Ordering};

pub use messages::{error, info, success, url, warning};
pub use spinner::Spinner;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` takes precedence over `FORCE_COLOR`; otherwise colour follows
/// whether stderr is attended.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Apply the colour decision to everything printed through this module.
///
/// # Arguments
///
/// * `no_color` - Value of `--no-color`, which always disables colour
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

static COLORS: AtomicBool = AtomicBool::new(true);

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_is_ci_with_ci_var() {
        unsafe { std::env::set_var("CI", "true") };
        assert!(is_ci());
        unsafe { std::env::remove_var("CI") };
    }

    #[test]
    #[serial]
    fn test_should_use_color_no_color() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("FORCE_COLOR");
        }
        assert!(!should_use_color());
        unsafe { std::env::remove_var("NO_COLOR") };
    }

    #[test]
    #[serial]
    fn test_should_use_color_no_color_overrides_force() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_color());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    #[serial]
    fn test_init_colors_no_color_flag() {
        init_colors(true);
        assert!(!colors_enabled());
        init_colors(false);
    }
}
