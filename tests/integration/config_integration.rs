//! Integration tests for layered configuration loading

use std::fs;
use stratus::dom::MalformedPolicy;
use stratus::{ConfigLoader, EngineError};
use tempfile::TempDir;

use crate::integration::test_utils::with_xdg_env;

fn write_global(test_dir: &TempDir, contents: &str) {
    let dir = test_dir.path().join("stratus");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let test_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(project.path())).unwrap();
    assert_eq!(config.stack, "default");
    assert_eq!(config.max_reactive_passes, 10);
    assert_eq!(config.malformed_descriptors, MalformedPolicy::Drop);
    assert_eq!(config.lock.ttl_secs, 300);
}

#[test]
fn test_layer_precedence() {
    let test_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    write_global(
        &test_dir,
        "stack = \"global\"\nmax_reactive_passes = 7\n[lock]\nttl_secs = 120\n",
    );
    fs::write(project.path().join("stratus.toml"), "stack = \"project\"\n").unwrap();
    fs::create_dir_all(project.path().join("config")).unwrap();
    fs::write(
        project.path().join("config").join("production.toml"),
        "malformed_descriptors = \"fail\"\n",
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("STRATUS_ENV", "production");
        std::env::set_var("STRATUS_LOCK__TTL_SECS", "45");
        ConfigLoader::load(project.path())
    })
    .unwrap();

    assert_eq!(config.stack, "project");
    assert_eq!(config.max_reactive_passes, 7);
    assert_eq!(config.malformed_descriptors, MalformedPolicy::Fail);
    assert_eq!(config.lock.ttl_secs, 45);
}

#[test]
fn test_environment_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("stratus.toml"), "stack = \"project\"\n").unwrap();

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("STRATUS_STACK", "from-env");
        std::env::set_var("STRATUS_MAX_REACTIVE_PASSES", "3");
        ConfigLoader::load(project.path())
    })
    .unwrap();

    assert_eq!(config.stack, "from-env");
    assert_eq!(config.max_reactive_passes, 3);
}

#[test]
fn test_invalid_layered_config_is_rejected() {
    let test_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("stratus.toml"), "max_reactive_passes = 0\n").unwrap();

    let result = with_xdg_env(&test_dir, || ConfigLoader::load(project.path()));
    assert!(matches!(result, Err(EngineError::ConfigError(_))));
}

#[test]
fn test_xdg_config_path_follows_env() {
    let test_dir = TempDir::new().unwrap();
    let path = with_xdg_env(&test_dir, ConfigLoader::xdg_config_path).unwrap();
    assert_eq!(path, test_dir.path().join("stratus").join("config.toml"));
}
