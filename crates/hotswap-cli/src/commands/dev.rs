//! `hotswap dev`.
//!
//! Sequencing of a dev session:
//!
//! 1. Load and validate the configuration
//! 2. Sync dependencies (`<compiler> mod tidy`)
//! 3. Build the frontend
//! 4. Start the frontend dev watcher, discovering its URL if asked to
//! 5. Build and start the application
//! 6. Run the event loop until quit or a clean application exit
//! 7. Kill the application, delete its binary, stop the frontend watcher

use crate::cli::DevArgs;
use crate::dev::frontend::{is_older_vite, VITE_MIN_VERSION};
use crate::dev::watcher::project_directories;
use crate::dev::{
    AppClient, BuildConfiguration, BuildCoordinator, CommandBuilder, DevConfig, DevLoop,
    DevLoopContext, FrontendWatcher, FsWatcher, ProcessExits,
};
use crate::error::{ConfigError, Result, ResultExt};
use crate::ui;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay before the in-browser development hint is printed.
const BROWSER_HINT_DELAY: Duration = Duration::from_secs(3);

/// Execute the dev command.
///
/// # Errors
///
/// Returns configuration errors before anything is started, and fatal
/// errors (`CliError::Fatal`) when the application can no longer be
/// stopped or started. The frontend watcher is stopped in every case.
pub async fn execute(args: DevArgs) -> Result<()> {
    let mut config = DevConfig::from_args(&args)?;
    config.validate()?;
    ui::info(&format!(
        "Using project directory: {}",
        config.project_dir().display()
    ));

    let builder = Arc::new(CommandBuilder::new(config.project.clone()));

    if config.sync_deps {
        builder.sync_dependencies(&config.build.compiler).await?;
    }

    let quit = CancellationToken::new();
    let signals = tokio::spawn(listen_for_quit(quit.clone()));

    if !config.build.skip_frontend {
        build_frontend(&builder).await?;
    }

    let frontend = match start_frontend_watcher(&mut config).await {
        Ok(frontend) => frontend,
        Err(e) => {
            signals.abort();
            return Err(e);
        }
    };

    let result = run_session(&config, builder, quit).await;

    if let Some(watcher) = &frontend {
        watcher.stop().await;
    }
    signals.abort();

    result?;
    ui::success("Development mode exited");
    Ok(())
}

async fn run_session(
    config: &DevConfig,
    builder: Arc<CommandBuilder>,
    quit: CancellationToken,
) -> Result<()> {
    let app = Arc::new(
        AppClient::new(&config.dev_server_url).context("Unable to create the dev server client")?,
    );
    let (watcher, streams) = FsWatcher::new()
        .inspect_err(|_| {
            ui::error("Unable to create filesystem watcher. Reloads will not occur.");
        })
        .with_hint("On Linux, raise fs.inotify.max_user_instances and try again")?;

    let (exit_tx, exit_rx) = ProcessExits::channel();
    let coordinator =
        BuildCoordinator::new(builder, exit_tx).with_working_dir(config.project_dir());

    let frontend_url = config.build.frontend_dev_server_url.clone();
    let loop_build = BuildConfiguration {
        skip_frontend: config.build.skip_frontend || frontend_url.is_some(),
        ..config.build.clone()
    };

    let mut devloop = DevLoop::new(DevLoopContext {
        build: loop_build,
        settings: config.watch_settings(frontend_url.as_deref()),
        coordinator,
        app,
        registrar: Box::new(watcher),
        streams,
        exits: exit_rx,
        quit,
    });

    // The frontend was built (or skipped) already.
    ui::info("Building application for development...");
    let initial = BuildConfiguration {
        skip_frontend: true,
        ..config.build.clone()
    };
    let mut current = None;
    devloop.coordinator().rebuild(&initial, &mut current).await?;

    if config.open_browser {
        open_browser(config.dev_server_url.as_str());
    }

    ui::url("Using DevServer URL", config.dev_server_url.as_str());
    if let Some(url) = &frontend_url {
        ui::url("Using Frontend DevServer URL", url);
    }
    ui::info(&format!(
        "Using reload debounce setting of {} milliseconds",
        config.debounce_ms
    ));

    let hint_url = config.dev_server_url.to_string();
    let hint = tokio::spawn(async move {
        tokio::time::sleep(BROWSER_HINT_DELAY).await;
        eprintln!();
        ui::url(
            "To develop in the browser and call your bound methods from JavaScript, navigate to",
            &hint_url,
        );
    });

    let mut dirs = project_directories(config.project_dir());
    dirs.extend(config.project.reload_directories());
    devloop.watch_initial(dirs);
    ui::info(&format!(
        "Watching (sub)/directory: {}",
        config.project_dir().display()
    ));

    let outcome = devloop.run(current).await;
    hint.abort();

    if let Some(app) = outcome? {
        app.kill_and_cleanup().await?;
    }
    Ok(())
}

/// Run `frontend:install` and `frontend:build` behind a spinner.
async fn build_frontend(builder: &CommandBuilder) -> Result<()> {
    let project = builder.project();
    if project.frontend_install.is_none() && project.frontend_build.is_none() {
        tracing::debug!("no frontend:install or frontend:build configured");
        return Ok(());
    }

    let spinner = ui::Spinner::new("Building frontend...");
    match builder.build_frontend().await {
        Ok(()) => {
            spinner.finish("Frontend built");
            Ok(())
        }
        Err(e) => {
            spinner.fail("Frontend build failed");
            Err(e.into())
        }
    }
}

/// Start `frontend:dev:watcher` if configured, recording a discovered URL.
async fn start_frontend_watcher(config: &mut DevConfig) -> Result<Option<FrontendWatcher>> {
    let auto_discovery = config.project.is_frontend_dev_server_url_auto_discovery();
    let command = config
        .project
        .dev_watcher_command
        .clone()
        .filter(|command| !command.trim().is_empty());

    let Some(command) = command else {
        if auto_discovery {
            return Err(ConfigError::DiscoveryWithoutWatcher.into());
        }
        return Ok(None);
    };

    let frontend_dir = config.project.frontend_path();
    // A missing directory otherwise surfaces as the watcher command not being found.
    tokio::fs::metadata(&frontend_dir)
        .await
        .with_path(&frontend_dir)?;

    let watcher = FrontendWatcher::start(&frontend_dir, &command, auto_discovery).await?;
    tracing::debug!(pid = watcher.pid(), "frontend watcher '{}' started", watcher.command());

    let discovered = watcher.discovered().clone();
    if let Some(url) = discovered.url {
        config.build.frontend_dev_server_url = Some(url);
    }
    if let Some(version) = discovered.version.filter(|v| is_older_vite(v)) {
        ui::error(&format!(
            "Found Vite {}. Please upgrade your Vite Server to at least '{}', future versions will require it",
            version, VITE_MIN_VERSION
        ));
        tokio::time::sleep(BROWSER_HINT_DELAY).await;
    }

    Ok(Some(watcher))
}

/// Cancel `quit` on Ctrl+C (and SIGTERM on Unix).
async fn listen_for_quit(quit: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    Ok(()) = tokio::signal::ctrl_c() => {}
                    Some(()) = terminate.recv() => {}
                    else => return,
                }
            }
            Err(e) => {
                tracing::debug!("unable to listen for SIGTERM: {}", e);
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
            }
        }
    }

    #[cfg(not(unix))]
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }

    quit.cancel();
}

/// Open the dev server URL in the default browser.
///
/// Uses platform-specific commands:
/// - macOS: `open`
/// - Windows: `start`
/// - Linux: `xdg-open`
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}
