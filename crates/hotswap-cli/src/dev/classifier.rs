//! Deciding what a filesystem event means for the dev loop.
//!
//! Classification is pure: the loop feeds each event through
//! [`ChangeClassifier::classify`] and accumulates the result in a
//! [`PendingChangeBatch`] that is acted upon when the debounce timer fires.

use crate::dev::watcher::{FsEvent, FsEventKind, DEPENDENCY_CACHE_MARKER};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Ignore,
    /// A source file changed; rebuild the application.
    Rebuild,
    /// A file under a reload directory changed.
    Reload,
    /// Some other file changed; its directory may hold served assets.
    RecordDirectory(PathBuf),
    /// A new directory appeared and should be watched.
    WatchDirectory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ChangeClassifier {
    rebuild_extensions: BTreeSet<String>,
    reload_dirs: Vec<PathBuf>,
}

impl ChangeClassifier {
    /// `rebuild_extensions` are bare (`go`, not `.go`); `reload_dirs` absolute.
    pub fn new(rebuild_extensions: BTreeSet<String>, reload_dirs: Vec<PathBuf>) -> Self {
        Self {
            rebuild_extensions,
            reload_dirs,
        }
    }

    /// Classify `event`. `is_dir` tells whether the path is a directory now.
    pub fn classify(&self, event: &FsEvent, is_dir: bool) -> ChangeAction {
        match event.kind {
            FsEventKind::Write => {
                if is_dir {
                    ChangeAction::Ignore
                } else if self.triggers_rebuild(&event.path) {
                    ChangeAction::Rebuild
                } else if self.in_reload_dir(&event.path) {
                    ChangeAction::Reload
                } else {
                    let dir = event.path.parent().unwrap_or(&event.path);
                    ChangeAction::RecordDirectory(dir.to_path_buf())
                }
            }
            FsEventKind::Create => {
                if is_dir {
                    if is_dependency_cache(&event.path) {
                        ChangeAction::Ignore
                    } else {
                        ChangeAction::WatchDirectory(event.path.clone())
                    }
                } else if self.triggers_rebuild(&event.path) {
                    // Some editors save by replacing the file, which arrives
                    // as a create rather than a write.
                    ChangeAction::Rebuild
                } else {
                    ChangeAction::Ignore
                }
            }
            FsEventKind::Remove | FsEventKind::Rename => ChangeAction::Ignore,
        }
    }

    fn triggers_rebuild(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.rebuild_extensions.contains(ext))
    }

    fn in_reload_dir(&self, path: &Path) -> bool {
        self.reload_dirs.iter().any(|dir| path.starts_with(dir))
    }
}

/// `true` if any component of `path` is `node_modules`.
pub fn is_dependency_cache(path: &Path) -> bool {
    path.components()
        .any(|component| component.as_os_str() == DEPENDENCY_CACHE_MARKER)
}

/// Changes seen since the last debounce tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeBatch {
    rebuild: bool,
    reload: bool,
    changed_dirs: BTreeSet<PathBuf>,
}

impl PendingChangeBatch {
    /// Record `action`; returns whether the debounce timer should restart.
    pub fn apply(&mut self, action: &ChangeAction) -> bool {
        match action {
            ChangeAction::Rebuild => {
                self.rebuild = true;
                true
            }
            ChangeAction::Reload => {
                self.reload = true;
                true
            }
            ChangeAction::RecordDirectory(dir) => {
                if !self.reload {
                    self.changed_dirs.insert(dir.clone());
                }
                true
            }
            ChangeAction::Ignore | ChangeAction::WatchDirectory(_) => false,
        }
    }

    /// Hand the batch over and start a fresh one.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn rebuild(&self) -> bool {
        self.rebuild
    }

    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn changed_dirs(&self) -> &BTreeSet<PathBuf> {
        &self.changed_dirs
    }

    pub fn is_empty(&self) -> bool {
        !self.rebuild && !self.reload && self.changed_dirs.is_empty()
    }
}

/// Directories handed to the watcher, and whether registering them worked.
///
/// Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    dirs: HashMap<PathBuf, bool>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dir`; `true` if it was not in the set before.
    pub fn add(&mut self, dir: &Path) -> bool {
        if self.dirs.contains_key(dir) {
            return false;
        }
        self.dirs.insert(dir.to_path_buf(), false);
        true
    }

    pub fn set_active(&mut self, dir: &Path, active: bool) {
        if let Some(state) = self.dirs.get_mut(dir) {
            *state = active;
        }
    }

    pub fn is_active(&self, dir: &Path) -> bool {
        self.dirs.get(dir).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
