//! Command-line interface definition for hotswap.
//!
//! - `hotswap dev` - rebuild and restart the application on source changes,
//!   reload its assets, and supervise the frontend watcher

mod commands;
mod validation;

use clap::Parser;

pub use commands::{Command, DevArgs};
pub use validation::{parse_debounce, parse_extensions};

/// hotswap - development mode for webview desktop applications
#[derive(Parser, Debug)]
#[command(
    name = "hotswap",
    version,
    about = "Development mode for webview desktop applications",
    long_about = "hotswap rebuilds your application binary when its sources change,\n\
                  reloads the embedded web assets when the frontend changes, and keeps\n\
                  your frontend dev watcher running for the length of the session."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows process spawns and kills, watch-set growth and event loop
    /// state changes.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
