use assert_fs::prelude::*;
use modkit_fs::{Removed, ops};
use predicates::prelude::*;
use rstest::rstest;

#[test]
fn copy_tree_overwrites_existing_files() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("module/app/main.js").write_str("v2").unwrap();
    temp.child("backoffice/app/shop/main.js").write_str("v1").unwrap();

    ops::copy_tree(
        &temp.child("module/app").path(),
        &temp.child("backoffice/app/shop").path(),
    )
    .unwrap();

    temp.child("backoffice/app/shop/main.js")
        .assert(predicate::str::contains("v2"));
}

#[test]
fn copy_tree_from_single_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("ModuleCart.js").write_str("export {}").unwrap();

    let copied = ops::copy_tree(
        temp.child("ModuleCart.js").path(),
        temp.child("theme/modules/ModuleCart.js").path(),
    )
    .unwrap();

    assert_eq!(copied, 1);
    temp.child("theme/modules/ModuleCart.js")
        .assert(predicate::path::exists());
}

#[test]
fn copy_tree_missing_source_is_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();
    let err = ops::copy_tree(
        temp.child("absent").path(),
        temp.child("dest").path(),
    )
    .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn move_file_relocates_archive() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("upload/shop.zip").write_binary(b"PK").unwrap();

    ops::move_file(
        temp.child("upload/shop.zip").path(),
        temp.child("modules/shop.zip").path(),
    )
    .unwrap();

    temp.child("upload/shop.zip").assert(predicate::path::missing());
    temp.child("modules/shop.zip").assert(predicate::path::exists());
}

#[rstest]
#[case("single.txt", false, Removed::File)]
#[case("nested", true, Removed::Directory)]
fn remove_path_handles_files_and_directories(
    #[case] name: &str,
    #[case] is_dir: bool,
    #[case] expected: Removed,
) {
    let temp = assert_fs::TempDir::new().unwrap();
    let child = temp.child(name);
    if is_dir {
        child.child("a/b.txt").write_str("x").unwrap();
    } else {
        child.write_str("x").unwrap();
    }

    assert_eq!(ops::remove_path(child.path()).unwrap(), expected);
    child.assert(predicate::path::missing());
}

#[test]
fn list_dir_is_sorted() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("ModuleZeta.js").touch().unwrap();
    temp.child("ModuleAlpha.js").touch().unwrap();
    temp.child("readme.md").touch().unwrap();

    assert_eq!(
        ops::list_dir(temp.path()).unwrap(),
        vec!["ModuleAlpha.js", "ModuleZeta.js", "readme.md"]
    );
}
