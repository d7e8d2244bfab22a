//! The `hotswap.json` project configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Value of `frontend:dev:serverUrl` that asks for the URL to be read from
/// the frontend watcher's output.
pub const AUTO_DISCOVERY: &str = "auto";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Application name, used for the output binary when `outputfilename`
    /// is not set.
    #[serde(default)]
    pub name: String,

    #[serde(
        rename = "outputfilename",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_filename: Option<String>,

    /// Frontend directory, relative to the project directory.
    #[serde(rename = "frontend:dir", default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,

    /// Command installing frontend dependencies (e.g. `npm install`).
    #[serde(
        rename = "frontend:install",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub frontend_install: Option<String>,

    /// Command producing the frontend bundle (e.g. `npm run build`).
    #[serde(
        rename = "frontend:build",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub frontend_build: Option<String>,

    /// Long-running frontend watcher supervised for the dev session.
    #[serde(
        rename = "frontend:dev:watcher",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dev_watcher_command: Option<String>,

    /// External frontend dev server URL, or `"auto"` for discovery.
    #[serde(
        rename = "frontend:dev:serverUrl",
        alias = "frontend:dev:serverurl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub frontend_dev_server_url: Option<String>,

    /// Comma-separated directories watched in addition to the project tree.
    #[serde(rename = "reloaddirs", default, skip_serializing_if = "Option::is_none")]
    pub reload_dirs: Option<String>,

    #[serde(rename = "build:dir", default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Directory the config was loaded for. Never read from the file.
    #[serde(skip)]
    pub project_dir: PathBuf,
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            output_filename: None,
            frontend_dir: default_frontend_dir(),
            frontend_install: None,
            frontend_build: None,
            dev_watcher_command: None,
            frontend_dev_server_url: None,
            reload_dirs: None,
            build_dir: default_build_dir(),
            project_dir: PathBuf::new(),
        }
    }
}

impl ProjectConfig {
    /// Base name of the produced binary.
    pub fn output_name(&self) -> &str {
        match self.output_filename.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }

    pub fn frontend_path(&self) -> PathBuf {
        self.resolve(&self.frontend_dir)
    }

    /// Directory the development binary is written to.
    pub fn bin_dir(&self) -> PathBuf {
        self.resolve(&self.build_dir).join("bin")
    }

    /// `true` when `frontend:dev:serverUrl` is `"auto"`.
    pub fn is_frontend_dev_server_url_auto_discovery(&self) -> bool {
        self.frontend_dev_server_url.as_deref() == Some(AUTO_DISCOVERY)
    }

    /// Explicitly configured frontend dev server URL, if any.
    pub fn explicit_frontend_dev_server_url(&self) -> Option<&str> {
        self.frontend_dev_server_url
            .as_deref()
            .filter(|url| !url.is_empty() && *url != AUTO_DISCOVERY)
    }

    /// Directories from `reloaddirs`, resolved against the project directory.
    pub fn reload_directories(&self) -> Vec<PathBuf> {
        self.reload_dirs
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| self.resolve(Path::new(dir)))
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_prefers_output_filename() {
        let mut config = ProjectConfig {
            name: "myapp".to_string(),
            ..ProjectConfig::default()
        };
        assert_eq!(config.output_name(), "myapp");

        config.output_filename = Some("MyApp".to_string());
        assert_eq!(config.output_name(), "MyApp");

        config.output_filename = Some(String::new());
        assert_eq!(config.output_name(), "myapp");
    }

    #[test]
    fn auto_discovery_is_not_an_explicit_url() {
        let config = ProjectConfig {
            frontend_dev_server_url: Some("auto".to_string()),
            ..ProjectConfig::default()
        };
        assert!(config.is_frontend_dev_server_url_auto_discovery());
        assert_eq!(config.explicit_frontend_dev_server_url(), None);

        let config = ProjectConfig {
            frontend_dev_server_url: Some("http://localhost:5173".to_string()),
            ..ProjectConfig::default()
        };
        assert!(!config.is_frontend_dev_server_url_auto_discovery());
        assert_eq!(
            config.explicit_frontend_dev_server_url(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn reload_directories_are_resolved_and_trimmed() {
        let config = ProjectConfig {
            reload_dirs: Some("assets, ,/abs/dir".to_string()),
            project_dir: PathBuf::from("/project"),
            ..ProjectConfig::default()
        };
        assert_eq!(
            config.reload_directories(),
            vec![PathBuf::from("/project/assets"), PathBuf::from("/abs/dir")]
        );
    }

    #[test]
    fn paths_resolve_against_project_dir() {
        let config = ProjectConfig {
            project_dir: PathBuf::from("/project"),
            ..ProjectConfig::default()
        };
        assert_eq!(config.frontend_path(), PathBuf::from("/project/frontend"));
        assert_eq!(config.bin_dir(), PathBuf::from("/project/build/bin"));
    }

    #[test]
    fn serializes_with_colon_keys() {
        let config = ProjectConfig {
            name: "demo".to_string(),
            dev_watcher_command: Some("npm run dev".to_string()),
            ..ProjectConfig::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["frontend:dev:watcher"], "npm run dev");
        assert_eq!(value["frontend:dir"], "frontend");
        assert!(value.get("frontend:install").is_none());
        assert!(value.get("project_dir").is_none());
    }
}
