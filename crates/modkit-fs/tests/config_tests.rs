use modkit_fs::{ConfigStore, Error};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestConfig {
    current_theme: String,
    production: bool,
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("modkit.toml");
    fs::write(&path, "current_theme = \"default_theme\"\nproduction = true\n").unwrap();

    let config: TestConfig = ConfigStore::new().load(&path).unwrap();

    assert_eq!(
        config,
        TestConfig {
            current_theme: "default_theme".into(),
            production: true
        }
    );
}

#[test]
fn test_load_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("modkit.json");
    fs::write(&path, r#"{"current_theme": "dark", "production": false}"#).unwrap();

    let config: TestConfig = ConfigStore::new().load(&path).unwrap();
    assert_eq!(config.current_theme, "dark");
}

#[test]
fn test_save_then_load_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/state.json");
    let store = ConfigStore::new();
    let value = TestConfig {
        current_theme: "x".into(),
        production: false,
    };

    store.save(&path, &value).unwrap();
    let loaded: TestConfig = store.load(&path).unwrap();
    assert_eq!(loaded, value);
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("modkit.ini");
    fs::write(&path, "x=1").unwrap();

    let err = ConfigStore::new().load::<TestConfig>(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { ref extension } if extension == "ini"));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("modkit.toml");
    fs::write(&path, "current_theme = [").unwrap();

    let err = ConfigStore::new().load::<TestConfig>(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "TOML"));
}
