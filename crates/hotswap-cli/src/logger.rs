//! Logging setup for the hotswap CLI.
//!
//! Diagnostics meant for the developer go through [`crate::ui`]; this module
//! installs the `tracing` subscriber that carries the internal events
//! (process spawns, loop state changes, watch-set growth).
//!
//! # Example
//!
//! ```rust,no_run
//! use hotswap_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting dev session");
//! debug!("Watching {}", "frontend/src");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "hotswap=debug,hotswap_cli=debug,hotswap_config=debug";
const QUIET_FILTER: &str = "hotswap=error,hotswap_cli=error,hotswap_config=error";
const DEFAULT_FILTER: &str = "hotswap=info,hotswap_cli=info,hotswap_config=info";

/// Initialize the tracing subscriber with the specified options.
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for hotswap crates
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable
/// 4. Default: INFO for hotswap crates
///
/// # Arguments
///
/// * `verbose` - Enable debug logging for the hotswap crates
/// * `quiet` - Only log errors
/// * `no_color` - Disable ANSI colour codes in log lines
///
/// # Examples
///
/// ```no_run
/// use hotswap_cli::logger;
///
/// logger::init_logger(false, false, true);
/// ```
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize logger with custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Check if colored output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise the terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stdout().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // The global subscriber can only be installed once per process, so these
    // tests stop at building filters.

    #[test]
    #[serial]
    fn test_should_use_colors_respects_force_color() {
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(should_use_colors());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    #[serial]
    fn test_no_color_wins() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    fn test_verbose_filter_mentions_every_crate() {
        let filter = filter_for(true, false).to_string();
        assert!(filter.contains("hotswap_cli=debug"));
        assert!(filter.contains("hotswap_config=debug"));
    }

    #[test]
    fn test_quiet_filter() {
        let filter = filter_for(false, true).to_string();
        assert!(filter.contains("hotswap_cli=error"));
    }
}
