//! hotswap - development-mode orchestrator for desktop applications with a
//! web frontend.
//!
//! `hotswap dev` builds the application binary, starts it, and keeps it in
//! sync with the source tree: source changes rebuild and restart the
//! application, asset changes reload its webview over HTTP, and an optional
//! frontend dev watcher (e.g. Vite) is supervised alongside.
//!
//! # Architecture
//!
//! - [`cli`] - argument parsing with clap
//! - [`commands`] - command implementations
//! - [`dev`] - builder, process control, watcher and the event loop
//! - [`error`] - error types with actionable messages
//! - [`logger`] - structured logging with tracing
//! - [`ui`] - terminal output
//!
//! # Example
//!
//! ```rust
//! use hotswap_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use error::{BuildError, CliError, ConfigError, ProcessError, Result, ResultExt};
