//! Supervision of the `frontend:dev:watcher` command.
//!
//! The watcher (usually `npm run dev`) runs for the whole session in its own
//! process group. Its stdout is echoed line by line and scanned for the dev
//! server URL (`Local: http://...`) and the Vite version banner.
//!
//! Shutdown is driven by a three-state machine stored in an atomic:
//!
//! ```text
//! Running --stop()--> Canceling --exit observed--> Stopped
//! Running --exited on its own-------------------> Stopped
//! ```
//!
//! Only the caller that wins the `Running -> Canceling` transition signals
//! the process group, so concurrent `stop()` calls send one signal.

use crate::dev::process::{isolate_process_group, ProcessGroup, KILL_GRACE_PERIOD};
use crate::error::{ConfigError, ProcessError, Result};
use crate::ui;
use reqwest::Url;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdout, Command};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Oldest Vite release that serves assets the way the application expects.
pub const VITE_MIN_VERSION: &str = "v3.0.0";

const UNKNOWN_VITE_VERSION: &str = "v0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatcherState {
    Running = 0,
    Canceling = 1,
    Stopped = 2,
}

impl WatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WatcherState::Running,
            1 => WatcherState::Canceling,
            _ => WatcherState::Stopped,
        }
    }
}

#[derive(Debug)]
struct SharedState(AtomicU8);

impl SharedState {
    fn new(state: WatcherState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> WatcherState {
        WatcherState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: WatcherState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Compare-and-swap; `true` if this call made the transition.
    fn transition(&self, from: WatcherState, to: WatcherState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Deadlines for reading the URL and the version from the watcher output.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryTimeouts {
    pub url: Duration,
    pub version: Duration,
}

impl Default for DiscoveryTimeouts {
    fn default() -> Self {
        Self {
            url: Duration::from_secs(10),
            version: Duration::from_secs(5),
        }
    }
}

/// What the watcher printed about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredServer {
    pub url: Option<String>,
    pub version: Option<String>,
}

/// A running `frontend:dev:watcher` command.
#[derive(Debug)]
pub struct FrontendWatcher {
    command: String,
    pid: u32,
    state: Arc<SharedState>,
    cancel: CancellationToken,
    stopped: watch::Receiver<bool>,
    discovered: DiscoveredServer,
}

impl FrontendWatcher {
    /// Start `command` in `dir` with the default discovery deadlines.
    pub async fn start(dir: &Path, command: &str, discover_url: bool) -> Result<Self> {
        Self::start_with_timeouts(dir, command, discover_url, DiscoveryTimeouts::default()).await
    }

    /// Start `command` in `dir`.
    ///
    /// With `discover_url`, waits for a `Local:` URL on stdout and fails with
    /// `ConfigError::DiscoveryTimeout` (after stopping the watcher) if none
    /// shows up in time. The Vite version is always looked for; not finding
    /// it is not an error.
    pub async fn start_with_timeouts(
        dir: &Path,
        command: &str,
        discover_url: bool,
        timeouts: DiscoveryTimeouts,
    ) -> Result<Self> {
        let words = shell_words::split(command).map_err(|e| ConfigError::InvalidWatcherCommand {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
        let (program, args) = words.split_first().ok_or(ProcessError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        isolate_process_group(&mut cmd);

        let spawn_error = |source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_error)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_error(std::io::Error::other("watcher exited immediately")))?;
        tracing::debug!(pid, command, "frontend watcher started");

        let (url_tx, url_rx) = oneshot::channel();
        let (version_tx, version_rx) = oneshot::channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(scan_output(stdout, url_tx, version_tx));
        }

        let state = Arc::new(SharedState::new(WatcherState::Running));
        let cancel = CancellationToken::new();
        let (stopped_tx, stopped_rx) = watch::channel(false);

        {
            let state = Arc::clone(&state);
            let cancel = cancel.clone();
            let command = command.to_string();
            tokio::spawn(async move {
                let exited = tokio::select! {
                    status = child.wait() => Some(status),
                    _ = cancel.cancelled() => None,
                };
                let status = match exited {
                    Some(status) => status,
                    None => {
                        let status =
                            match tokio::time::timeout(KILL_GRACE_PERIOD, child.wait()).await {
                                Ok(status) => status,
                                Err(_) => {
                                    tracing::debug!(pid, "frontend watcher ignored SIGTERM");
                                    kill_group(pid, &command);
                                    child.wait().await
                                }
                            };
                        // Children that outlived the leader still hold the group.
                        kill_group(pid, &command);
                        status
                    }
                };

                let was_running = state.transition(WatcherState::Running, WatcherState::Stopped);
                if was_running {
                    match status {
                        // Exit status 1 is what most watchers report when interrupted.
                        Ok(status) if status.success() || status.code() == Some(1) => {}
                        Ok(status) => {
                            ui::warning(&format!("Error from DevWatcher '{}': {}", command, status))
                        }
                        Err(e) => ui::warning(&format!("Error from DevWatcher '{}': {}", command, e)),
                    }
                }
                state.store(WatcherState::Stopped);
                tracing::debug!(pid, "frontend watcher stopped");
                let _ = stopped_tx.send(true);
            });
        }

        let mut watcher = Self {
            command: command.to_string(),
            pid,
            state,
            cancel,
            stopped: stopped_rx,
            discovered: DiscoveredServer::default(),
        };

        if discover_url {
            match tokio::time::timeout(timeouts.url, url_rx).await {
                Ok(Ok(url)) => watcher.discovered.url = Some(url),
                _ => {
                    watcher.stop().await;
                    return Err(ConfigError::DiscoveryTimeout {
                        seconds: timeouts.url.as_secs(),
                    }
                    .into());
                }
            }
        }

        // Most likely not Vite when nothing shows up.
        if let Ok(Ok(version)) = tokio::time::timeout(timeouts.version, version_rx).await {
            watcher.discovered.version = Some(version);
        }

        ui::success(&format!("Running frontend DevWatcher command: '{}'", command));
        Ok(watcher)
    }

    /// Stop the watcher and wait until its exit has been observed.
    ///
    /// Returns `true` if this call sent the termination signal. Safe to call
    /// any number of times, concurrently or after the watcher exited.
    pub async fn stop(&self) -> bool {
        let signalled = self
            .state
            .transition(WatcherState::Running, WatcherState::Canceling);
        if signalled {
            tracing::debug!(pid = self.pid, "stopping frontend watcher");
            if let Err(e) = ProcessGroup::of(self.pid).terminate() {
                ui::warning(&format!(
                    "Unable to stop DevWatcher '{}': {}",
                    self.command, e
                ));
            }
        }

        self.cancel.cancel();
        let mut stopped = self.stopped.clone();
        let _ = stopped.wait_for(|stopped| *stopped).await;
        signalled
    }

    pub fn state(&self) -> WatcherState {
        self.state.load()
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn discovered(&self) -> &DiscoveredServer {
        &self.discovered
    }
}

fn kill_group(pid: u32, command: &str) {
    if let Err(e) = ProcessGroup::of(pid).kill() {
        tracing::warn!(pid, command, "unable to kill DevWatcher process group: {}", e);
    }
}

/// Echo the watcher's stdout and report the first URL and version seen.
async fn scan_output(
    stdout: ChildStdout,
    url_tx: oneshot::Sender<String>,
    version_tx: oneshot::Sender<String>,
) {
    let mut reader = BufReader::new(stdout);
    let mut echo = tokio::io::stdout();
    let mut url_tx = Some(url_tx);
    let mut version_tx = Some(version_tx);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("reading frontend watcher output failed: {}", e);
                break;
            }
        }

        let _ = echo.write_all(&buf).await;
        let _ = echo.flush().await;

        if url_tx.is_none() && version_tx.is_none() {
            continue;
        }

        let line = console::strip_ansi_codes(&String::from_utf8_lossy(&buf)).into_owned();
        if let Some(url) = local_url(&line) {
            if let Some(tx) = url_tx.take() {
                let _ = tx.send(url);
            }
        }
        if let Some(version) = vite_version(&line) {
            if let Some(tx) = version_tx.take() {
                let _ = tx.send(version);
            }
        }
    }
}

/// The URL following `Local:`, if it parses.
fn local_url(line: &str) -> Option<String> {
    let index = line.find("Local:")?;
    let candidate = line[index + "Local:".len()..].split_whitespace().next()?;
    Url::parse(candidate).ok().map(|_| candidate.to_string())
}

/// The version from a `vite vX.Y.Z` banner; `v0.0.0` when it does not parse.
fn vite_version(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    if !tokens.next()?.eq_ignore_ascii_case("vite") {
        return None;
    }
    let token = tokens.next()?;
    if !token.starts_with('v') {
        return None;
    }
    Some(match parse_version(token) {
        Some(_) => token.to_string(),
        None => UNKNOWN_VITE_VERSION.to_string(),
    })
}

/// Parse `vMAJOR[.MINOR[.PATCH]][-pre]` into its numeric parts.
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let core = version.strip_prefix('v')?;
    let core = core.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// `true` for a Vite version below [`VITE_MIN_VERSION`].
pub fn is_older_vite(version: &str) -> bool {
    match (parse_version(version), parse_version(VITE_MIN_VERSION)) {
        (Some(found), Some(minimum)) => found < minimum,
        _ => true,
    }
}
