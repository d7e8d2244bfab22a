//! Dev session configuration.
//!
//! Merges the `dev` flags with `hotswap.json` into a validated [`DevConfig`],
//! from which the per-build [`BuildConfiguration`] and the loop's
//! [`WatchSettings`] are derived.

use crate::cli::{parse_extensions, DevArgs};
use crate::error::{CliError, ConfigError, Result};
use crate::ui;
use hotswap_config::{parse_build_tags, ConfigDiscovery, ProjectConfig, CONFIG_FILE_NAME};
use reqwest::Url;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a single build-and-launch needs.
///
/// Cloned into the loop once; a rebuild borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub compiler: String,
    pub user_tags: Vec<String>,
    pub asset_dir: String,
    pub log_level: String,
    /// `host:port` of the application's embedded dev server
    pub dev_server: String,
    pub frontend_dev_server_url: Option<String>,
    pub skip_frontend: bool,
    pub no_rebuild: bool,
    /// Unparsed `--appargs`
    pub app_args: String,
    /// Debugger command line wrapping the binary
    pub debugger: Option<String>,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            compiler: "go".to_string(),
            user_tags: Vec::new(),
            asset_dir: String::new(),
            log_level: "Debug".to_string(),
            dev_server: "localhost:34115".to_string(),
            frontend_dev_server_url: None,
            skip_frontend: false,
            no_rebuild: false,
            app_args: String::new(),
            debugger: None,
        }
    }
}

impl BuildConfiguration {
    /// Environment handed to the launched application.
    pub fn child_environment(&self) -> Vec<(String, String)> {
        vec![
            ("loglevel".to_string(), self.log_level.clone()),
            ("assetdir".to_string(), self.asset_dir.clone()),
            ("devserver".to_string(), self.dev_server.clone()),
            (
                "frontenddevserverurl".to_string(),
                self.frontend_dev_server_url.clone().unwrap_or_default(),
            ),
        ]
    }
}

/// Settings the event loop reads on every event.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub debounce: Duration,
    pub rebuild_extensions: BTreeSet<String>,
    /// Absolute directories whose changes force a reload
    pub reload_dirs: Vec<PathBuf>,
    /// Set when a frontend dev server serves the assets or `--no-reload`
    pub skip_assets_reload: bool,
}

/// Validated dev session configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    pub project: ProjectConfig,
    pub build: BuildConfiguration,
    pub debounce_ms: u64,
    pub extensions: BTreeSet<String>,
    /// `--reloaddirs`, resolved against the project directory
    pub reload_dirs: Vec<PathBuf>,
    pub no_reload: bool,
    pub dev_server_url: Url,
    pub open_browser: bool,
    pub sync_deps: bool,
}

impl DevConfig {
    /// Build the session configuration from the `dev` flags.
    ///
    /// # Errors
    ///
    /// Fails when the project directory cannot be found, `hotswap.json` does
    /// not parse, or a flag value is invalid.
    pub fn from_args(args: &DevArgs) -> Result<Self> {
        let project_dir = resolve_project_root(args.project_dir.as_deref())?;
        let mut project = ConfigDiscovery::new(&project_dir).load()?;

        if let Some(url) = &args.frontend_devserver_url {
            project.frontend_dev_server_url = Some(url.clone());
        }

        let user_tags = parse_build_tags(&args.tags)?;
        let extensions =
            parse_extensions(&args.extensions).map_err(|hint| ConfigError::InvalidValue {
                field: "extensions".to_string(),
                value: args.extensions.clone(),
                hint,
            })?;
        let dev_server_url = dev_server_url(&args.devserver)?;

        let reload_dirs = args
            .reloaddirs
            .split(',')
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| absolute(&project_dir, Path::new(dir)))
            .collect();

        let build = BuildConfiguration {
            compiler: args.compiler.clone(),
            user_tags,
            asset_dir: args.assetdir.clone(),
            log_level: args.loglevel.clone(),
            dev_server: args.devserver.clone(),
            frontend_dev_server_url: project
                .explicit_frontend_dev_server_url()
                .map(str::to_string),
            skip_frontend: args.skip_frontend,
            no_rebuild: args.no_rebuild,
            app_args: args.appargs.clone(),
            debugger: args
                .debugger
                .clone()
                .filter(|command| !command.trim().is_empty()),
        };

        Ok(Self {
            project,
            build,
            debounce_ms: args.debounce,
            extensions,
            reload_dirs,
            no_reload: args.no_reload,
            dev_server_url,
            open_browser: args.browser,
            sync_deps: !args.no_sync_deps,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce".to_string(),
                value: "0".to_string(),
                hint: "Debounce must be greater than 0".to_string(),
            }
            .into());
        }

        if self.build.compiler.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "compiler".to_string(),
                value: String::new(),
                hint: "Pass the compiler executable with --compiler".to_string(),
            }
            .into());
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions".to_string(),
                value: String::new(),
                hint: "At least one rebuild extension is required".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Loop settings, given the frontend dev server URL in use (if any).
    pub fn watch_settings(&self, frontend_dev_server_url: Option<&str>) -> WatchSettings {
        WatchSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            rebuild_extensions: self.extensions.clone(),
            reload_dirs: self.reload_dirs.clone(),
            skip_assets_reload: frontend_dev_server_url.is_some() || self.no_reload,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project.project_dir
    }
}

fn dev_server_url(devserver: &str) -> Result<Url> {
    let devserver = devserver.trim();
    let invalid = |hint: &str| ConfigError::InvalidValue {
        field: "devserver".to_string(),
        value: devserver.to_string(),
        hint: hint.to_string(),
    };

    if devserver.is_empty() {
        return Err(invalid("Use host:port, e.g. localhost:34115").into());
    }

    let raw = if devserver.contains("://") {
        devserver.to_string()
    } else {
        format!("http://{}", devserver)
    };
    Url::parse(&raw).map_err(|e| invalid(&e.to_string()).into())
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve the project directory.
///
/// Priority: `--project-dir`, then the nearest ancestor of the current
/// directory holding `hotswap.json`, then the current directory itself.
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;

    if let Some(dir) = explicit {
        let absolute = absolute(&current_dir, dir);

        if !absolute.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "Specified --project-dir is not a directory: {}",
                absolute.display()
            )));
        }

        tracing::debug!("Using project root {} (from --project-dir)", absolute.display());
        return Ok(absolute);
    }

    if let Some(root) = find_config_root(&current_dir) {
        tracing::debug!("Using project root {} (found {})", root.display(), CONFIG_FILE_NAME);
        return Ok(root);
    }

    ui::warning(&format!(
        "No {} found, using current directory: {}",
        CONFIG_FILE_NAME,
        current_dir.display()
    ));
    Ok(current_dir)
}

fn find_config_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}
