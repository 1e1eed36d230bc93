//! Copy, move and removal primitives.
//!
//! Every failure goes through [`Error::io`], so callers can tell a missing
//! path ([`Error::NotFound`]) from a permission or device problem
//! ([`Error::Io`]) and decide which of the two they tolerate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// What [`remove_path`] deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    Directory,
    File,
}

/// Whether `path` exists (symlinks are not followed).
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Create `path` and all missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Canonicalize without the `\\?\` prefix on Windows.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|e| Error::io(src, e))?;
    Ok(())
}

/// Recursively copy `src` into `dest`, overwriting existing files.
///
/// `src` may be a file, in which case this behaves like [`copy_file`].
/// Symlinks inside the tree are skipped. Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let meta = fs::symlink_metadata(src).map_err(|e| Error::io(src, e))?;
    if meta.is_file() {
        copy_file(src, dest)?;
        return Ok(1);
    }

    ensure_dir(dest)?;
    let mut copied = 0;
    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&from, e))?;

        if file_type.is_symlink() {
            tracing::debug!(path = %from.display(), "Skipping symlink during copy");
        } else if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Move a file, falling back to copy-then-delete across filesystems.
pub fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::io(src, e)),
        Err(_) => {
            fs::copy(src, dest).map_err(|e| Error::io(src, e))?;
            fs::remove_file(src).map_err(|e| Error::io(src, e))
        }
    }
}

/// Remove a file or a whole directory tree.
///
/// A missing path is reported as [`Error::NotFound`].
pub fn remove_path(path: &Path) -> Result<Removed> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
        Ok(Removed::Directory)
    } else {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        Ok(Removed::File)
    }
}

/// Sorted entry names of a directory.
pub fn list_dir(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
        let entry = entry.map_err(|e| Error::io(path, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_tree_copies_nested_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("a/b/deep.txt"), "deep").unwrap();

        let dest = dir.path().join("dest");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("a/b/deep.txt")).unwrap(), "deep");
    }

    #[test]
    fn remove_missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let err = remove_path(&dir.path().join("ghost")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn remove_path_reports_kind() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("inner"), "y").unwrap();

        assert_eq!(remove_path(&file).unwrap(), Removed::File);
        assert_eq!(remove_path(&sub).unwrap(), Removed::Directory);
        assert!(!exists(&sub));
    }
}
