//! Configuration loading from explicit files.

use std::fs;

use ppdcache::Config;

#[test]
fn explicit_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
cache_dir = "/srv/ppdcache"
max_finishings = 4
log_filter = "ppdcache=debug"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.cache_dir, std::path::PathBuf::from("/srv/ppdcache"));
    assert_eq!(config.max_finishings, 4);
    assert_eq!(config.log_filter, "ppdcache=debug");
    assert_eq!(config.loaded_capacity, 64);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "cache_dir = [").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ppdcache::PpdCacheError::Configuration(_)));
}

#[test]
fn printers_resolve_into_the_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_toml(&format!("cache_dir = {:?}", dir.path())).unwrap();

    assert_eq!(config.cache_file("office"), dir.path().join("office.data"));

    let existing = dir.path().join("explicit.data");
    fs::write(&existing, "").unwrap();
    let name = existing.to_str().unwrap();
    assert_eq!(config.cache_file(name), existing);
}
