//! Child processes of the dev session.
//!
//! Every child runs in its own process group so that terminating it also
//! terminates whatever it spawned (a debugger's inferior, a bundler's
//! workers). Exit codes are reported on a channel owned by the event loop.

use crate::error::{ProcessError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, watch};

/// Exit code reported when a process was terminated by a signal.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// How long a terminated process gets before it is killed outright.
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(3);

const EXIT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub pid: u32,
    pub code: i32,
}

pub type ExitSender = mpsc::Sender<ProcessExit>;
pub type ExitReceiver = mpsc::Receiver<ProcessExit>;

/// Constructor for the exit notification channel.
pub struct ProcessExits;

impl ProcessExits {
    pub fn channel() -> (ExitSender, ExitReceiver) {
        mpsc::channel(EXIT_CHANNEL_CAPACITY)
    }
}

/// Program, arguments and environment of a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Added to the inherited environment of the child only
    pub envs: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, envs: Vec<(String, String)>) -> Self {
        self.envs.extend(envs);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Command line as printed to the developer.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Put the command in a fresh process group led by the child.
pub(crate) fn isolate_process_group(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}

/// A process group, addressed by the pid of its leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup(u32);

impl ProcessGroup {
    pub fn of(pid: u32) -> Self {
        Self(pid)
    }

    /// Ask every process in the group to exit.
    ///
    /// A group that no longer exists is not an error.
    pub fn terminate(&self) -> io::Result<()> {
        #[cfg(unix)]
        return self.signal(libc::SIGTERM);

        #[cfg(windows)]
        return self.taskkill(false);
    }

    /// Kill every process in the group without giving it a chance to clean up.
    pub fn kill(&self) -> io::Result<()> {
        #[cfg(unix)]
        return self.signal(libc::SIGKILL);

        #[cfg(windows)]
        return self.taskkill(true);
    }

    #[cfg(unix)]
    fn signal(&self, signal: libc::c_int) -> io::Result<()> {
        // kill(0, ..) and kill(-1, ..) address our own group and every process.
        let pgid = libc::pid_t::try_from(self.0)
            .ok()
            .filter(|pgid| *pgid > 1)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("refusing to signal process group {}", self.0),
                )
            })?;

        // SAFETY: kill has no memory-safety preconditions.
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(err)
        }
    }

    #[cfg(windows)]
    fn taskkill(&self, force: bool) -> io::Result<()> {
        let pid = self.0.to_string();
        let mut args = vec!["/T", "/PID", pid.as_str()];
        if force {
            args.insert(0, "/F");
        }
        let output = std::process::Command::new("taskkill").args(&args).output()?;
        // 128: no such process
        if output.status.success() || output.status.code() == Some(128) {
            Ok(())
        } else {
            Err(io::Error::other(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

/// A started child process.
///
/// The exit is observed by a background task; `kill` waits for it.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    status: watch::Receiver<Option<i32>>,
}

impl ProcessHandle {
    /// Spawn `spec` in its own process group with stdin closed and
    /// stdout/stderr inherited.
    ///
    /// When `exits` is given, the exit is also reported there.
    pub fn start(spec: &LaunchSpec, exits: Option<ExitSender>) -> Result<Self, ProcessError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        isolate_process_group(&mut cmd);

        let spawn_error = |source| ProcessError::Spawn {
            command: spec.program.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_error)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_error(io::Error::other("process exited before it was observed")))?;

        tracing::debug!(pid, program = %spec.program, "process started");

        let (status_tx, status_rx) = watch::channel(None);
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(UNKNOWN_EXIT_CODE),
                Err(e) => {
                    tracing::warn!(pid, "waiting for process failed: {}", e);
                    UNKNOWN_EXIT_CODE
                }
            };
            tracing::debug!(pid, code, "process exited");

            let _ = status_tx.send(Some(code));
            if let Some(exits) = exits {
                let _ = exits.send(ProcessExit { pid, code }).await;
            }
        });

        Ok(Self {
            pid,
            status: status_rx,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_none()
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.status.borrow()
    }

    /// Wait until the exit watcher has observed the exit.
    pub async fn wait(&self) -> i32 {
        let mut status = self.status.clone();
        match status.wait_for(Option::is_some).await {
            Ok(code) => code.unwrap_or(UNKNOWN_EXIT_CODE),
            // The watcher task is gone, so the child has been reaped.
            Err(_) => UNKNOWN_EXIT_CODE,
        }
    }

    /// Terminate the process group and wait for the exit.
    ///
    /// Killing a process that has already exited is a no-op.
    pub async fn kill(&self) -> Result<(), ProcessError> {
        self.kill_with_grace(KILL_GRACE_PERIOD).await
    }

    pub async fn kill_with_grace(&self, grace: Duration) -> Result<(), ProcessError> {
        if !self.is_running() {
            return Ok(());
        }

        let group = ProcessGroup::of(self.pid);
        let kill_error = |source| ProcessError::Kill {
            pid: self.pid,
            source,
        };

        group.terminate().map_err(kill_error)?;
        if tokio::time::timeout(grace, self.wait()).await.is_err() {
            tracing::debug!(pid = self.pid, "process ignored SIGTERM, killing");
            group.kill().map_err(kill_error)?;
            self.wait().await;
        }
        Ok(())
    }
}

/// The application started by the last successful build.
#[derive(Debug)]
pub struct RunningApplication {
    process: ProcessHandle,
    binary: PathBuf,
}

impl RunningApplication {
    pub fn new(process: ProcessHandle, binary: PathBuf) -> Self {
        Self { process, binary }
    }

    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }

    pub async fn kill(&self) -> Result<(), ProcessError> {
        self.process.kill().await
    }

    /// Kill the application, then delete its binary.
    ///
    /// The binary is left in place when the kill fails.
    pub async fn kill_and_cleanup(self) -> Result<()> {
        self.kill().await?;
        remove_binary(&self.binary)?;
        Ok(())
    }
}

/// Delete a build output; a file that is already gone is fine.
pub fn remove_binary(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
