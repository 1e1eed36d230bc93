use modkit_fs::{FileLock, RobustnessConfig, io};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("registry.json");

    io::write_atomic(&path, b"[]", RobustnessConfig::default()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("registry.json");
    fs::write(&path, "original").unwrap();

    io::write_text(&path, "updated").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_creates_missing_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("themes/default/modules/list_modules.js");

    io::write_text(&path, "export default [];").unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "export default [];");
}

#[test]
fn test_write_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("target.txt");

    io::write_atomic(
        &path,
        b"content",
        RobustnessConfig {
            initial_interval: Duration::from_millis(1),
            max_elapsed: Duration::from_millis(50),
            fsync: false,
        },
    )
    .unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn test_read_text_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = io::read_text(&temp.path().join("nope.txt")).unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

#[test]
fn test_file_lock_creates_sidecar() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("modules.json");

    let lock = FileLock::exclusive(&target).unwrap();
    assert_eq!(lock.path(), temp.path().join("modules.json.lock"));
    assert!(lock.path().exists());
    drop(lock);

    // Re-acquiring after drop must not block.
    let _again = FileLock::exclusive(&target).unwrap();
}
