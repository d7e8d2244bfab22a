//! Project configuration for the hotswap development orchestrator.
//!
//! A project is described by a `hotswap.json` file at its root. The file uses
//! flat, colon-separated keys (`frontend:dev:watcher`) and every field is
//! optional; missing values fall back to the defaults in [`ProjectConfig`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod validation;

pub use config::*;
pub use error::*;

pub use discovery::{ConfigDiscovery, CONFIG_FILE_NAME};
pub use validation::parse_build_tags;
