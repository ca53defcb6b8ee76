//! Configuration resolution tests
//!
//! Tests that touch SENTIPREP_* environment variables are marked #[serial]
//! so they never race each other.

use sentiprep_common::config::{
    ensure_root_folder, resolve_root_folder, TomlConfig, OBJECTS_DIR, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_used_when_nothing_configured() {
    env::remove_var(ROOT_FOLDER_ENV);
    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert!(resolved.to_string_lossy().contains("sentiprep"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load_or_default(Some(&temp_dir.path().join("absent.toml")));
    assert_eq!(config.port, 5780);
}

#[test]
fn test_unparseable_config_file_falls_back_to_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = [").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));
    assert_eq!(config.port, 5780);
}

#[test]
fn test_explicit_config_file_is_read() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "port = 6001\n[logging]\nlevel = \"debug\"\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));
    assert_eq!(config.port, 6001);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_ensure_root_folder_creates_object_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("root");
    ensure_root_folder(&root).unwrap();
    assert!(root.join(OBJECTS_DIR).is_dir());
}
