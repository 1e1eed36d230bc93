//! Module archives.
//!
//! A module ships as `<name>.zip` with every entry under a single `<name>/`
//! main folder and its descriptor at `<name>/info.json`.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::descriptor::{Descriptor, LIFECYCLE_SCRIPTS};
use crate::error::{Error, Result};

/// An opened module archive.
pub struct ModuleArchive {
    path: PathBuf,
    base_name: String,
    zip: ZipArchive<File>,
}

impl std::fmt::Debug for ModuleArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleArchive")
            .field("path", &self.path)
            .field("base_name", &self.base_name)
            .finish()
    }
}

impl ModuleArchive {
    /// Open `path`; the extension must be `.zip`.
    pub fn open(path: &Path) -> Result<Self> {
        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_zip || base_name.is_empty() {
            return Err(Error::InvalidExtension {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| modkit_fs::Error::io(path, e))?;
        let zip = ZipArchive::new(file).map_err(|e| Error::Archive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            base_name,
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without `.zip`; the expected module name.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_string).collect()
    }

    /// Read one entry; `None` if the archive has no such entry.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::Archive {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).map_err(|e| Error::Archive {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(buf))
    }

    /// Validate the archive layout and descriptor against the running host.
    ///
    /// Nothing is written. Missing lifecycle scripts are logged as warnings.
    pub fn inspect(&mut self, host_version: &str) -> Result<Descriptor> {
        let manifest_name = format!("{}/info.json", self.base_name);
        let bytes = self
            .read_entry(&manifest_name)?
            .ok_or_else(|| Error::MissingManifest {
                archive: self.path.clone(),
                expected: manifest_name.clone(),
            })?;

        let descriptor = Descriptor::parse(&bytes, &manifest_name)?;
        if descriptor.name != self.base_name {
            return Err(Error::NameMismatch {
                archive_name: self.base_name.clone(),
                declared: descriptor.name,
            });
        }
        descriptor.check_host(host_version)?;
        self.check_entries()?;

        let names = self.entry_names();
        for script in LIFECYCLE_SCRIPTS {
            let expected = format!("{}/{script}", self.base_name);
            if !names.contains(&expected) {
                tracing::warn!(module = %self.base_name, script, "Module ships no lifecycle script");
            }
        }

        Ok(descriptor)
    }

    /// Every entry must be a safe relative path under `<base>/`.
    fn check_entries(&mut self) -> Result<()> {
        let main_folder = Path::new(&self.base_name);
        for index in 0..self.zip.len() {
            let entry = self.zip.by_index_raw(index).map_err(|e| Error::Archive {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            let raw = entry.name().to_string();
            let Some(enclosed) = entry.enclosed_name() else {
                return Err(Error::UnsafeEntry { entry: raw });
            };
            if enclosed
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(Error::UnsafeEntry { entry: raw });
            }
            if !enclosed.starts_with(main_folder) {
                return Err(Error::MissingMainFolder {
                    main_folder: self.base_name.clone(),
                    entry: raw,
                });
            }
        }
        Ok(())
    }

    /// Extract every entry below `dest`; returns the number of files.
    ///
    /// Call [`inspect`](Self::inspect) first: entries with unsafe paths are
    /// refused here as well.
    pub fn extract_all(&mut self, dest: &Path) -> Result<usize> {
        let mut files = 0;
        for index in 0..self.zip.len() {
            let mut entry = self.zip.by_index(index).map_err(|e| Error::Archive {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            let Some(relative) = entry.enclosed_name() else {
                return Err(Error::UnsafeEntry {
                    entry: entry.name().to_string(),
                });
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| modkit_fs::Error::io(&target, e))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| modkit_fs::Error::io(parent, e))?;
            }
            let mut out = File::create(&target).map_err(|e| modkit_fs::Error::io(&target, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| modkit_fs::Error::io(&target, e))?;
            files += 1;
        }
        tracing::debug!(archive = %self.path.display(), dest = %dest.display(), files, "Extracted archive");
        Ok(files)
    }
}
