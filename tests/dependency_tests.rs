//! Load-time dependency tests - the plugin must refuse to load when the
//! utilities it needs are missing or too old, and load again once fixed.

use blockdev_swap::{LoadError, SwapConfig, SwapPlugin};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn install(bin: &Path, name: &str, body: &str) {
    let path = bin.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod tool");
}

fn install_mkswap(bin: &Path, version: &str) {
    install(
        bin,
        "mkswap",
        &format!("echo 'mkswap from util-linux {}'", version),
    );
}

/// Directory with every tool the default configuration needs.
fn setup_tools() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    install_mkswap(dir.path(), "2.39.3");
    install(dir.path(), "swaplabel", "exit 0");
    dir
}

fn config_for(bin: &Path) -> SwapConfig {
    SwapConfig {
        search_path: Some(bin.to_string_lossy().into_owned()),
        ..SwapConfig::default()
    }
}

/// Names of plugins that loaded, as a registry would report them.
fn available_plugins(config: &SwapConfig) -> Vec<&'static str> {
    match SwapPlugin::load(config.clone()) {
        Ok(_) => vec![SwapPlugin::NAME],
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_check_low_version() {
    let tools = setup_tools();
    let config = config_for(tools.path());
    assert!(available_plugins(&config).contains(&"swap"));

    install_mkswap(tools.path(), "2.20.1");
    let err = SwapPlugin::load(config.clone()).unwrap_err();
    assert_eq!(
        err,
        LoadError::UnsupportedVersion {
            tool: "mkswap".to_string(),
            found: "2.20.1".to_string(),
            required: "2.23.2".to_string(),
        }
    );
    assert!(!available_plugins(&config).contains(&"swap"));

    install_mkswap(tools.path(), "2.39.3");
    assert!(SwapPlugin::load(config.clone()).is_ok());
    assert!(available_plugins(&config).contains(&"swap"));
}

#[test]
fn test_check_no_mkswap() {
    let tools = setup_tools();
    let config = config_for(tools.path());

    fs::remove_file(tools.path().join("mkswap")).unwrap();
    let err = SwapPlugin::load(config.clone()).unwrap_err();
    assert_eq!(err, LoadError::MissingTool("mkswap".to_string()));
    assert!(available_plugins(&config).is_empty());

    install_mkswap(tools.path(), "2.39.3");
    assert!(available_plugins(&config).contains(&"swap"));
}

#[test]
fn test_check_no_swaplabel() {
    let tools = setup_tools();
    let config = config_for(tools.path());

    fs::remove_file(tools.path().join("swaplabel")).unwrap();
    let err = SwapPlugin::load(config.clone()).unwrap_err();
    assert_eq!(err, LoadError::MissingTool("swaplabel".to_string()));
    assert!(available_plugins(&config).is_empty());

    install(tools.path(), "swaplabel", "exit 0");
    assert!(available_plugins(&config).contains(&"swap"));
}

#[test]
fn test_tools_found_in_later_search_dir() {
    let mkswap_dir = TempDir::new().unwrap();
    let label_dir = TempDir::new().unwrap();
    install_mkswap(mkswap_dir.path(), "2.40");
    install(label_dir.path(), "swaplabel", "exit 0");

    let search = std::env::join_paths([mkswap_dir.path(), label_dir.path()]).unwrap();
    let config = SwapConfig {
        search_path: Some(search.to_string_lossy().into_owned()),
        ..SwapConfig::default()
    };

    let swap = SwapPlugin::load(config).expect("Failed to load swap plugin");
    let info = swap.info();
    assert_eq!(info.mkswap, mkswap_dir.path().join("mkswap"));
    assert_eq!(info.swaplabel, label_dir.path().join("swaplabel"));
    assert_eq!(info.mkswap_version, "2.40");
}

#[test]
fn test_invalid_config_does_not_load() {
    let tools = setup_tools();
    let config = SwapConfig {
        proc_swaps: "".into(),
        ..config_for(tools.path())
    };
    assert!(matches!(
        SwapPlugin::load(config),
        Err(LoadError::InvalidConfig(_))
    ));
}
