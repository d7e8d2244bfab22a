//! Command implementations for the hotswap CLI.
//!
//! - [`dev`] - development mode
//!
//! Each command provides an `execute` function that takes the parsed
//! command arguments and returns a Result.

pub mod dev;

pub use dev::execute as dev_execute;
