//! Error types for project configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project directory not found: {}", .0.display())]
    ProjectDirNotFound(PathBuf),

    #[error("invalid config value for '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid build tags: {0}")]
    InvalidTags(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
