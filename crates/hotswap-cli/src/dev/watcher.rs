//! Filesystem watching for the dev loop.
//!
//! Directories are watched one by one (non-recursively) so that the loop
//! decides which new directories join the watch set. Events and errors are
//! delivered on two bounded channels; the notify callback thread blocks when
//! they are full.

use crate::error::Result;
use ignore::WalkBuilder;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub const EVENT_CHANNEL_CAPACITY: usize = 100;
pub const ERROR_CHANNEL_CAPACITY: usize = 10;

/// Directory name that is never watched.
pub const DEPENDENCY_CACHE_MARKER: &str = "node_modules";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Write,
    Create,
    Remove,
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receiving ends of a watcher.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::Receiver<FsEvent>,
    pub errors: mpsc::Receiver<notify::Error>,
}

/// Registers directories with a watcher.
pub trait WatchRegistrar: Send {
    fn watch(&mut self, path: &Path) -> Result<()>;
}

/// notify-backed watcher.
pub struct FsWatcher {
    inner: RecommendedWatcher,
}

impl FsWatcher {
    /// Create a watcher with nothing registered yet.
    pub fn new() -> Result<(Self, WatchStreams)> {
        let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (error_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

        let inner = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let Some(kind) = map_kind(&event.kind) else {
                    return;
                };
                for path in event.paths {
                    // Receiver gone: the loop has ended.
                    if event_tx.blocking_send(FsEvent { path, kind }).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = error_tx.blocking_send(e);
            }
        })?;

        Ok((Self { inner }, WatchStreams { events, errors }))
    }
}

impl WatchRegistrar for FsWatcher {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.inner.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }
}

/// Collapse notify's event kinds into the four the loop cares about.
///
/// Metadata-only changes (permissions, timestamps) are dropped. A rename
/// target counts as a create, since some editors save by renaming a
/// temporary file over the original.
pub fn map_kind(kind: &EventKind) -> Option<FsEventKind> {
    match kind {
        EventKind::Create(_) => Some(FsEventKind::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FsEventKind::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FsEventKind::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(FsEventKind::Write),
        EventKind::Remove(_) => Some(FsEventKind::Remove),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Every directory of the project worth watching.
///
/// Honours `.gitignore` (also outside a git repository) and skips hidden
/// directories and `node_modules`.
///
/// # Arguments
///
/// * `root` - Project directory, included in the result
pub fn project_directories(root: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != DEPENDENCY_CACHE_MARKER)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_dir()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn maps_event_kinds() {
        assert_eq!(
            map_kind(&EventKind::Create(CreateKind::File)),
            Some(FsEventKind::Create)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FsEventKind::Write)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(FsEventKind::Create)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(FsEventKind::Rename)
        );
        assert_eq!(
            map_kind(&EventKind::Remove(RemoveKind::File)),
            Some(FsEventKind::Remove)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            None
        );
        assert_eq!(map_kind(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn walks_project_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("frontend/src")).unwrap();
        fs::create_dir_all(root.join("frontend/node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("build/bin")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();

        let mut dirs = project_directories(root);
        dirs.sort();
        assert_eq!(
            dirs,
            vec![
                root.to_path_buf(),
                root.join("frontend"),
                root.join("frontend/src"),
            ]
        );
    }

    #[tokio::test]
    async fn reports_file_creation() {
        let dir = TempDir::new().unwrap();
        let (mut watcher, mut streams) = FsWatcher::new().unwrap();
        watcher.watch(dir.path()).unwrap();

        let file = dir.path().join("main.go");
        fs::write(&file, "package main").unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                let event = streams.events.recv().await.unwrap();
                if event.path.file_name() == file.file_name() {
                    return event;
                }
            }
        })
        .await
        .unwrap();
        assert!(matches!(event.kind, FsEventKind::Create | FsEventKind::Write));
    }
}
