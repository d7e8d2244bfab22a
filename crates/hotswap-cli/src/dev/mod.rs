//! Development mode.
//!
//! Components, leaf to root:
//!
//! - [`process`] - child processes in their own process groups, exit codes
//! - [`frontend`] - supervision of the `frontend:dev:watcher` command
//! - [`builder`] - producing the development binary
//! - [`coordinator`] - rebuild, kill the old application, start the new one
//! - [`watcher`] / [`classifier`] - filesystem events and what they mean
//! - [`app_client`] - reload and asset-dir requests to the running application
//! - [`devloop`] - the event loop tying it together

pub mod app_client;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod devloop;
pub mod frontend;
pub mod process;
pub mod watcher;

// Re-exports
pub use app_client::{AppClient, AppControl};
pub use builder::{Builder, CommandBuilder};
pub use classifier::{ChangeAction, ChangeClassifier, PendingChangeBatch, WatchSet};
pub use config::{BuildConfiguration, DevConfig, WatchSettings};
pub use coordinator::{BuildCoordinator, RebuildOutcome};
pub use devloop::{DevLoop, DevLoopContext, LoopState};
pub use frontend::{DiscoveredServer, DiscoveryTimeouts, FrontendWatcher, WatcherState};
pub use process::{
    LaunchSpec, ProcessExit, ProcessExits, ProcessGroup, ProcessHandle, RunningApplication,
};
pub use watcher::{FsEvent, FsEventKind, FsWatcher, WatchRegistrar, WatchStreams};
