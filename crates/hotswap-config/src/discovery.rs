//! File-based config discovery for CLI use
//!
//! Finds `hotswap.json` in a project directory and merges it over the
//! defaults. Environment variables prefixed with `HOTSWAP_` override file
//! values; a double underscore stands for the `:` key separator, so
//! `HOTSWAP_FRONTEND__DEV__WATCHER` sets `frontend:dev:watcher`.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};

use crate::config::ProjectConfig;
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE_NAME: &str = "hotswap.json";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use hotswap_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// println!("frontend lives in {}", config.frontend_path().display());
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file, if the project has one.
    pub fn find(&self) -> Option<PathBuf> {
        let path = self.root.join(CONFIG_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Load the project config.
    ///
    /// A project without `hotswap.json` is valid and gets the defaults, with
    /// the directory name standing in for `name`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ProjectDirNotFound` when the root does not exist
    /// and `ConfigError::InvalidValue` when the file cannot be parsed.
    pub fn load(&self) -> Result<ProjectConfig> {
        if !self.root.is_dir() {
            return Err(ConfigError::ProjectDirNotFound(self.root.clone()));
        }

        let mut figment = Figment::from(Serialized::defaults(ProjectConfig::default()));

        if let Some(path) = self.find() {
            tracing::debug!("Loading project config from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed("HOTSWAP_").map(|key| key.as_str().replace("__", ":").into()),
        );

        let mut config: ProjectConfig =
            figment.extract().map_err(|e| ConfigError::InvalidValue {
                field: CONFIG_FILE_NAME.to_string(),
                hint: Some(e.to_string()),
            })?;

        config.project_dir = self.root.clone();
        if config.name.is_empty() {
            config.name = self
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "app".to_string());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert!(discovery.find().is_none());
    }

    #[test]
    fn find_discovers_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, r#"{ "name": "demo" }"#).unwrap();

        let discovery = ConfigDiscovery::new(dir.path());
        assert_eq!(discovery.find().unwrap(), config_path);
    }

    #[test]
    fn load_fails_for_missing_project_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let result = ConfigDiscovery::new(&missing).load();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ProjectDirNotFound(_)
        ));
    }

    #[test]
    fn load_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let result = ConfigDiscovery::new(dir.path()).load();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }
}
