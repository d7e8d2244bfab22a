//! Rebuild-and-restart of the application.
//!
//! A failed build is not an error: the previous application keeps running
//! and the next change retries. Failing to kill the previous application or
//! to start the new one is fatal for the session.

use crate::dev::builder::Builder;
use crate::dev::config::BuildConfiguration;
use crate::dev::process::{remove_binary, ExitSender, LaunchSpec, ProcessHandle, RunningApplication};
use crate::error::{CliError, Result};
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A new application is running.
    Restarted,
    /// The build failed; whatever was running is untouched.
    BuildFailed,
}

pub struct BuildCoordinator {
    builder: Arc<dyn Builder>,
    exits: ExitSender,
    working_dir: Option<PathBuf>,
}

impl BuildCoordinator {
    pub fn new(builder: Arc<dyn Builder>, exits: ExitSender) -> Self {
        Self {
            builder,
            exits,
            working_dir: None,
        }
    }

    /// Directory the application is started in.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build, then swap `current` for a freshly started application.
    ///
    /// # Errors
    ///
    /// Only fatal errors (`CliError::Fatal`) are returned.
    pub async fn rebuild(
        &self,
        config: &BuildConfiguration,
        current: &mut Option<RunningApplication>,
    ) -> Result<RebuildOutcome> {
        let binary = match self.builder.build(config).await {
            Ok(binary) => binary,
            Err(e) => {
                ui::error(&format!("Build error - {}", e));
                ui::warning(if current.is_some() {
                    "Continuing to run current version"
                } else {
                    "No version running, build will be retriggered as soon as changes have been detected"
                });
                return Ok(RebuildOutcome::BuildFailed);
            }
        };

        if let Some(previous) = current.take() {
            if let Err(e) = previous.kill().await {
                let pid = previous.pid();
                *current = Some(previous);
                return Err(CliError::fatal(format!(
                    "Unable to kill debug binary (PID: {}): {}",
                    pid, e
                )));
            }
            if previous.binary() != binary {
                if let Err(e) = remove_binary(previous.binary()) {
                    ui::warning(&format!(
                        "Unable to delete {}: {}",
                        previous.binary().display(),
                        e
                    ));
                }
            }
        }

        let app_args = shell_words::split(&config.app_args)
            .map_err(|e| CliError::fatal(format!("Unable to parse appargs: {}", e)))?;
        let mut spec = launch_spec(config, &binary, app_args)?;
        if let Some(dir) = &self.working_dir {
            spec = spec.current_dir(dir);
        }

        ui::info(&format!("Executing: {}", spec.display()));
        match ProcessHandle::start(&spec, Some(self.exits.clone())) {
            Ok(process) => {
                tracing::debug!(pid = process.pid(), "application restarted");
                *current = Some(RunningApplication::new(process, binary));
                Ok(RebuildOutcome::Restarted)
            }
            Err(e) => {
                if let Err(delete) = remove_binary(&binary) {
                    return Err(CliError::fatal(format!(
                        "Unable to delete app binary {}: {}",
                        binary.display(),
                        delete
                    )));
                }
                Err(CliError::fatal(format!("Unable to start application: {}", e)))
            }
        }
    }
}

/// The binary itself, or `<debugger> exec <binary> [-- <args>]`.
pub fn launch_spec(
    config: &BuildConfiguration,
    binary: &Path,
    app_args: Vec<String>,
) -> Result<LaunchSpec> {
    let binary = binary.to_string_lossy().into_owned();

    let spec = match config.debugger.as_deref() {
        None => LaunchSpec::new(binary).args(app_args),
        Some(debugger) => {
            let words = shell_words::split(debugger)
                .map_err(|e| CliError::fatal(format!("Unable to parse debugger command: {}", e)))?;
            let (program, debugger_args) = words
                .split_first()
                .ok_or_else(|| CliError::fatal("Empty debugger command"))?;

            let mut spec = LaunchSpec::new(program.clone())
                .args(debugger_args.iter().cloned())
                .args(["exec".to_string(), binary]);
            if !app_args.is_empty() {
                spec = spec.args(std::iter::once("--".to_string()).chain(app_args));
            }
            spec
        }
    };

    Ok(spec.envs(config.child_environment()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launches_binary_directly() {
        let config = BuildConfiguration::default();
        let spec = launch_spec(
            &config,
            Path::new("/p/build/bin/app-dev"),
            vec!["--port".into(), "8080".into()],
        )
        .unwrap();
        assert_eq!(spec.display(), "/p/build/bin/app-dev --port 8080");
        assert!(spec
            .envs
            .contains(&("devserver".to_string(), "localhost:34115".to_string())));
    }

    #[test]
    fn wraps_binary_in_debugger() {
        let config = BuildConfiguration {
            debugger: Some("dlv --listen=:2345 --headless=true".to_string()),
            ..BuildConfiguration::default()
        };

        let spec = launch_spec(&config, Path::new("/bin/app-dev"), vec![]).unwrap();
        assert_eq!(
            spec.display(),
            "dlv --listen=:2345 --headless=true exec /bin/app-dev"
        );

        let spec = launch_spec(&config, Path::new("/bin/app-dev"), vec!["-v".into()]).unwrap();
        assert_eq!(
            spec.display(),
            "dlv --listen=:2345 --headless=true exec /bin/app-dev -- -v"
        );
    }

    #[test]
    fn unbalanced_debugger_quotes_are_fatal() {
        let config = BuildConfiguration {
            debugger: Some("dlv 'oops".to_string()),
            ..BuildConfiguration::default()
        };
        assert!(launch_spec(&config, Path::new("/bin/app"), vec![])
            .unwrap_err()
            .is_fatal());
    }

    #[cfg(unix)]
    mod swap {
        use super::super::*;
        use crate::dev::process::ProcessExits;
        use crate::error::BuildError;
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use tempfile::TempDir;

        /// "Builds" by linking a fresh name to the target; links avoid
        /// writing executables that the test then runs.
        struct LinkBuilder {
            dir: TempDir,
            target: PathBuf,
            fail: AtomicBool,
            builds: AtomicUsize,
        }

        impl LinkBuilder {
            fn new(target: &str) -> Self {
                Self {
                    dir: TempDir::new().unwrap(),
                    target: PathBuf::from(target),
                    fail: AtomicBool::new(false),
                    builds: AtomicUsize::new(0),
                }
            }
        }

        #[async_trait]
        impl Builder for LinkBuilder {
            async fn build(&self, _: &BuildConfiguration) -> Result<PathBuf, BuildError> {
                let n = self.builds.fetch_add(1, Ordering::SeqCst);
                if self.fail.load(Ordering::SeqCst) {
                    return Err(BuildError::Custom("main.go:3:1: syntax error".to_string()));
                }
                let binary = self.dir.path().join(format!("app-dev-{}", n));
                std::os::unix::fs::symlink(&self.target, &binary).unwrap();
                Ok(binary)
            }
        }

        fn sleeping() -> BuildConfiguration {
            BuildConfiguration {
                app_args: "-c 'sleep 30'".to_string(),
                ..BuildConfiguration::default()
            }
        }

        fn exists(path: &Path) -> bool {
            path.symlink_metadata().is_ok()
        }

        #[tokio::test]
        async fn build_failure_keeps_running_app() {
            let builder = Arc::new(LinkBuilder::new("/bin/sh"));
            let (tx, _rx) = ProcessExits::channel();
            let coordinator = BuildCoordinator::new(builder.clone(), tx);
            let mut current = None;

            let outcome = coordinator.rebuild(&sleeping(), &mut current).await.unwrap();
            assert_eq!(outcome, RebuildOutcome::Restarted);
            let (pid, binary) = {
                let app = current.as_ref().unwrap();
                (app.pid(), app.binary().to_path_buf())
            };

            builder.fail.store(true, Ordering::SeqCst);
            let outcome = coordinator.rebuild(&sleeping(), &mut current).await.unwrap();
            assert_eq!(outcome, RebuildOutcome::BuildFailed);

            let app = current.take().unwrap();
            assert_eq!(app.pid(), pid);
            assert!(app.process().is_running());
            assert!(exists(&binary));
            app.kill_and_cleanup().await.unwrap();
        }

        #[tokio::test]
        async fn build_failure_with_nothing_running() {
            let builder = Arc::new(LinkBuilder::new("/bin/sh"));
            builder.fail.store(true, Ordering::SeqCst);
            let (tx, _rx) = ProcessExits::channel();
            let coordinator = BuildCoordinator::new(builder, tx);
            let mut current = None;

            let outcome = coordinator.rebuild(&sleeping(), &mut current).await.unwrap();
            assert_eq!(outcome, RebuildOutcome::BuildFailed);
            assert!(current.is_none());
        }

        #[tokio::test]
        async fn restart_kills_then_deletes_previous_binary() {
            let builder = Arc::new(LinkBuilder::new("/bin/sh"));
            let (tx, mut rx) = ProcessExits::channel();
            let coordinator = BuildCoordinator::new(builder.clone(), tx);
            let mut current = None;

            coordinator.rebuild(&sleeping(), &mut current).await.unwrap();
            let first_pid = current.as_ref().unwrap().pid();
            let first_binary = current.as_ref().unwrap().binary().to_path_buf();

            coordinator.rebuild(&sleeping(), &mut current).await.unwrap();
            let app = current.take().unwrap();
            assert_ne!(app.pid(), first_pid);
            assert!(!exists(&first_binary));
            assert!(exists(app.binary()));

            let exit = rx.recv().await.unwrap();
            assert_eq!(exit.pid, first_pid);

            app.kill_and_cleanup().await.unwrap();
        }

        #[tokio::test]
        async fn start_failure_is_fatal_and_removes_binary() {
            let builder = Arc::new(LinkBuilder::new("/does/not/exist"));
            let (tx, _rx) = ProcessExits::channel();
            let coordinator = BuildCoordinator::new(builder.clone(), tx);
            let mut current = None;

            let err = coordinator
                .rebuild(&BuildConfiguration::default(), &mut current)
                .await
                .unwrap_err();
            assert!(err.is_fatal());
            assert!(current.is_none());
            assert!(!exists(&builder.dir.path().join("app-dev-0")));
        }

        #[tokio::test]
        async fn unparsable_appargs_are_fatal() {
            let builder = Arc::new(LinkBuilder::new("/bin/sh"));
            let (tx, _rx) = ProcessExits::channel();
            let coordinator = BuildCoordinator::new(builder, tx);
            let config = BuildConfiguration {
                app_args: "--name 'unterminated".to_string(),
                ..BuildConfiguration::default()
            };

            let err = coordinator.rebuild(&config, &mut None).await.unwrap_err();
            assert!(err.is_fatal());
            assert!(err.to_string().contains("appargs"));
        }
    }
}
