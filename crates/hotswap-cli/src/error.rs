//! Error handling for the hotswap CLI.
//!
//! The hierarchy mirrors how failures are treated by the dev session:
//!
//! - **Configuration errors** (`ConfigError`) abort before the loop starts
//! - **Build errors** (`BuildError`) are recoverable inside the loop; the
//!   previous application keeps running
//! - **Process errors** (`ProcessError`) come from spawning or killing
//!   children; inside the loop they are escalated to `CliError::Fatal`
//!
//! # Example
//!
//! ```rust,no_run
//! use hotswap_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_marker(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Run `hotswap dev` from the project directory")
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid flag combination or value
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `hotswap.json` could not be found or parsed
    #[error("Project error: {0}")]
    Project(#[from] hotswap_config::ConfigError),

    /// Compiler or frontend build failure
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Spawning or terminating a child process failed
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Unrecoverable failure inside the dev loop. The session ends without
    /// the graceful teardown of the running application.
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Requests to the running application
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

impl CliError {
    pub fn fatal(message: impl std::fmt::Display) -> Self {
        CliError::Fatal(message.to_string())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CliError::Fatal(_))
    }
}

/// Errors in the flags and project settings of a dev session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// `frontend:dev:serverUrl` is `auto` but nothing produces the URL
    #[error("Unable to auto discover frontend:dev:serverUrl without a frontend:dev:watcher command\n\nHint: Add \"frontend:dev:watcher\" to hotswap.json or set an explicit frontend:dev:serverUrl")]
    DiscoveryWithoutWatcher,

    /// The frontend watcher never printed its URL
    #[error("Unable to auto discover frontend:dev:serverUrl: no `Local:` URL printed within {seconds}s\n\nHint: Check that the frontend watcher starts a dev server")]
    DiscoveryTimeout {
        /// Deadline that elapsed
        seconds: u64,
    },

    /// The frontend watcher command could not be split into words
    #[error("Unable to parse frontend:dev:watcher command '{command}': {reason}")]
    InvalidWatcherCommand {
        /// Command as written in the project config
        command: String,
        /// Parser message
        reason: String,
    },
}

/// Build process errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler executable could not be spawned
    #[error("Compiler '{0}' not found\n\nHint: Install it or point --compiler at the executable")]
    CompilerNotFound(String),

    /// The compiler ran and exited non-zero
    #[error("`{command}` failed:\n{output}")]
    CompilerFailed {
        /// Command line that was run
        command: String,
        /// Captured stderr (or stdout when stderr is empty)
        output: String,
    },

    /// `frontend:install` or `frontend:build` failed
    #[error("Frontend command `{command}` failed in {}:\n{output}", .dir.display())]
    FrontendFailed {
        /// Command as written in the project config
        command: String,
        /// Directory the command ran in
        dir: PathBuf,
        /// Captured output
        output: String,
    },

    /// Dependency sync (`<compiler> mod tidy`) failed
    #[error("Syncing dependencies with `{command}` failed:\n{output}")]
    SyncFailed {
        /// Command line that was run
        command: String,
        /// Captured output
        output: String,
    },

    /// Output directory could not be created
    #[error("Unable to create output directory {}: {source}", .dir.display())]
    OutputDir {
        /// Directory that failed
        dir: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The compiler reported success but no binary was written
    #[error("Build reported success but {} does not exist", .0.display())]
    BinaryMissing(PathBuf),

    /// Generic build error
    #[error("{0}")]
    Custom(String),
}

/// Child process errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started
    #[error("Unable to start '{command}': {source}")]
    Spawn {
        /// Program that failed to start
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Signalling the process group failed
    #[error("Unable to stop process {pid}: {source}")]
    Kill {
        /// Process id of the group leader
        pid: u32,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A command line with no program in it
    #[error("Empty command")]
    EmptyCommand,
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into `CliError::FileNotFound` for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

mod miette;
pub use self::miette::{build_error_to_miette, cli_error_to_miette};
