//! hotswap CLI entry point.
//!
//! Parses arguments, initializes logging and colors, and dispatches.

use clap::Parser;
use hotswap_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
