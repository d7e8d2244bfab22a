//! Tests for config file discovery and loading

use hotswap_config::{ConfigDiscovery, CONFIG_FILE_NAME};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn loads_colon_separated_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{
  "name": "demo",
  "outputfilename": "Demo",
  "frontend:dir": "ui",
  "frontend:install": "npm install",
  "frontend:build": "npm run build",
  "frontend:dev:watcher": "npm run dev",
  "frontend:dev:serverUrl": "auto",
  "reloaddirs": "ui/public",
  "build:dir": "out"
}"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();

    assert_eq!(config.name, "demo");
    assert_eq!(config.output_name(), "Demo");
    assert_eq!(config.frontend_path(), dir.path().join("ui"));
    assert_eq!(config.frontend_install.as_deref(), Some("npm install"));
    assert_eq!(config.frontend_build.as_deref(), Some("npm run build"));
    assert_eq!(config.dev_watcher_command.as_deref(), Some("npm run dev"));
    assert!(config.is_frontend_dev_server_url_auto_discovery());
    assert_eq!(
        config.reload_directories(),
        vec![dir.path().join("ui/public")]
    );
    assert_eq!(config.bin_dir(), dir.path().join("out").join("bin"));
}

#[test]
fn unknown_keys_are_ignored() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "name": "demo", "author": { "name": "someone" } }"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert_eq!(config.name, "demo");
    assert_eq!(config.frontend_dir, PathBuf::from("frontend"));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "name": "demo", "frontend:dev:watcher": "npm run dev" }"#,
    )
    .unwrap();

    unsafe {
        std::env::set_var("HOTSWAP_FRONTEND__DEV__WATCHER", "pnpm dev");
    }
    let config = ConfigDiscovery::new(dir.path()).load();
    unsafe {
        std::env::remove_var("HOTSWAP_FRONTEND__DEV__WATCHER");
    }

    let config = config.unwrap();
    assert_eq!(config.dev_watcher_command.as_deref(), Some("pnpm dev"));
}
