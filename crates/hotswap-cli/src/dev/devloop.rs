//! The dev session event loop.
//!
//! One `tokio::select!` multiplexes application exits, watcher errors,
//! watcher events, the debounce timer and the quit token. Events only
//! accumulate into a [`PendingChangeBatch`]; the work (rebuild, asset
//! reload) happens when the timer fires after the last qualifying event.

use crate::dev::app_client::AppControl;
use crate::dev::classifier::{ChangeAction, ChangeClassifier, PendingChangeBatch, WatchSet};
use crate::dev::config::{BuildConfiguration, WatchSettings};
use crate::dev::coordinator::BuildCoordinator;
use crate::dev::process::{ExitReceiver, ProcessExit, RunningApplication};
use crate::dev::watcher::{FsEvent, WatchRegistrar, WatchStreams};
use crate::error::Result;
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Draining,
    Quitting,
}

/// Everything the loop is wired to.
pub struct DevLoopContext {
    pub build: BuildConfiguration,
    pub settings: WatchSettings,
    pub coordinator: BuildCoordinator,
    pub app: Arc<dyn AppControl>,
    pub registrar: Box<dyn WatchRegistrar>,
    pub streams: WatchStreams,
    pub exits: ExitReceiver,
    /// Cancelled on SIGINT/SIGTERM
    pub quit: CancellationToken,
}

pub struct DevLoop {
    build: BuildConfiguration,
    settings: WatchSettings,
    coordinator: BuildCoordinator,
    app: Arc<dyn AppControl>,
    registrar: Box<dyn WatchRegistrar>,
    streams: WatchStreams,
    exits: ExitReceiver,
    quit: CancellationToken,
    classifier: ChangeClassifier,
    watch_set: WatchSet,
    pending: PendingChangeBatch,
    asset_dir: Option<String>,
    state: LoopState,
}

impl DevLoop {
    pub fn new(ctx: DevLoopContext) -> Self {
        let classifier = ChangeClassifier::new(
            ctx.settings.rebuild_extensions.clone(),
            ctx.settings.reload_dirs.clone(),
        );
        Self {
            build: ctx.build,
            settings: ctx.settings,
            coordinator: ctx.coordinator,
            app: ctx.app,
            registrar: ctx.registrar,
            streams: ctx.streams,
            exits: ctx.exits,
            quit: ctx.quit,
            classifier,
            watch_set: WatchSet::new(),
            pending: PendingChangeBatch::default(),
            asset_dir: None,
            state: LoopState::Idle,
        }
    }

    pub fn coordinator(&self) -> &BuildCoordinator {
        &self.coordinator
    }

    /// Register the directories present at startup.
    pub fn watch_initial<I>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for dir in dirs {
            self.add_watch(&dir);
        }
        if self.watch_set.is_empty() {
            tracing::warn!("no project directories could be watched");
        } else {
            tracing::debug!("watching {} directories", self.watch_set.len());
        }
    }

    /// Run until quit is requested or the current application exits with 0.
    ///
    /// Returns the application running at that point, for teardown. Fatal
    /// errors from a rebuild end the loop immediately.
    pub async fn run(
        mut self,
        mut current: Option<RunningApplication>,
    ) -> Result<Option<RunningApplication>> {
        for dir in self.settings.reload_dirs.clone() {
            if self.add_watch(&dir) {
                ui::info(&format!("Watching (sub)/directory: {}", dir.display()));
            }
        }

        let debounce = self.settings.debounce;
        let timer = tokio::time::sleep(debounce);
        tokio::pin!(timer);
        let mut timer_armed = false;

        while self.state != LoopState::Quitting {
            tokio::select! {
                Some(exit) = self.exits.recv() => {
                    self.on_exit(exit, current.as_ref());
                }
                Some(error) = self.streams.errors.recv() => {
                    ui::warning(&error.to_string());
                }
                Some(event) = self.streams.events.recv() => {
                    if self.on_event(event) {
                        timer.as_mut().reset(Instant::now() + debounce);
                        timer_armed = true;
                    }
                }
                () = &mut timer, if timer_armed => {
                    timer_armed = false;
                    self.set_state(LoopState::Draining);
                    self.drain(&mut current).await?;
                    self.set_state(LoopState::Idle);
                }
                () = self.quit.cancelled() => {
                    ui::info("Caught quit");
                    self.set_state(LoopState::Quitting);
                }
            }
        }

        Ok(current)
    }

    fn set_state(&mut self, state: LoopState) {
        if self.state != state {
            tracing::debug!("dev loop {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn on_exit(&mut self, exit: ProcessExit, current: Option<&RunningApplication>) {
        // Exits of replaced applications arrive after their successor started.
        if !current.is_some_and(|app| app.pid() == exit.pid) {
            tracing::debug!(pid = exit.pid, code = exit.code, "ignoring exit of a previous process");
            return;
        }

        if exit.code == 0 {
            self.set_state(LoopState::Quitting);
        } else {
            ui::warning(&format!(
                "Application exited with code {}, waiting for changes",
                exit.code
            ));
        }
    }

    /// Classify and record `event`; `true` restarts the debounce timer.
    fn on_event(&mut self, event: FsEvent) -> bool {
        let is_dir = event.path.is_dir();
        let action = self.classifier.classify(&event, is_dir);

        if let ChangeAction::WatchDirectory(dir) = &action {
            if self.add_watch(dir) {
                ui::info(&format!("Added new directory to watcher: {}", dir.display()));
            }
        }

        self.pending.apply(&action)
    }

    /// Add `dir` to the watch set and register it; `true` when newly watched.
    fn add_watch(&mut self, dir: &Path) -> bool {
        if !self.watch_set.add(dir) {
            return false;
        }

        match self.registrar.watch(dir) {
            Ok(()) => {
                self.watch_set.set_active(dir, true);
                tracing::debug!("watching {}", dir.display());
                true
            }
            Err(e) => {
                ui::warning(&format!(
                    "Unable to watch path: {} due to error {}",
                    dir.display(),
                    e
                ));
                false
            }
        }
    }

    async fn drain(&mut self, current: &mut Option<RunningApplication>) -> Result<()> {
        let batch = self.pending.take();
        if batch.is_empty() {
            tracing::debug!("debounce fired with nothing pending");
            return Ok(());
        }
        let mut reload = batch.reload();

        if batch.rebuild() {
            if self.build.no_rebuild {
                ui::info("[Rebuild triggered] skipping due to flag --no-rebuild");
            } else {
                ui::info("[Rebuild triggered] files updated");
                self.coordinator.rebuild(&self.build, current).await?;
            }
        }

        if !self.settings.skip_assets_reload && !batch.changed_dirs().is_empty() {
            if self.asset_dir.is_none() {
                self.asset_dir = fetch_asset_dir(self.app.as_ref()).await;
            }

            match self.asset_dir.as_deref() {
                Some(asset_dir) => {
                    let asset_dir = Path::new(asset_dir);
                    if batch.changed_dirs().iter().any(|dir| dir.starts_with(asset_dir)) {
                        reload = true;
                    }
                }
                None if self.settings.reload_dirs.is_empty() => {
                    ui::error(
                        "Reloading couldn't be triggered: Please specify --assetdir or --reloaddirs",
                    );
                }
                None => {}
            }
        }

        if reload {
            if let Err(e) = self.app.reload().await {
                ui::error(&format!("Error during refresh: {}", e));
            }
        }

        Ok(())
    }
}

/// Ask the application for its asset directory; `None` until it answers
/// with a non-empty path.
async fn fetch_asset_dir(app: &dyn AppControl) -> Option<String> {
    match app.asset_dir().await {
        Ok(dir) => {
            let dir = dir.trim();
            if dir.is_empty() {
                None
            } else {
                tracing::debug!("application serves assets from {}", dir);
                Some(dir.to_string())
            }
        }
        Err(e) => {
            ui::error(&format!("Error during retrieving assetdir: {}", e));
            None
        }
    }
}
