//! Installed-set probing.
//!
//! A [`Snapshot`] is what a scope looks like right now: the installed
//! top-level packages and the packages the host or theme pins for itself.
//! Snapshots are taken fresh for every planning pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manager::PackageManager;
use crate::scope::{PerScope, Scope};
use crate::spec::{PackageSpec, normalize};

/// Installed top-level packages, `name -> version`.
pub type InstalledSet = BTreeMap<String, String>;

/// State of one scope at probe time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub installed: InstalledSet,
    pub pinned: Vec<PackageSpec>,
}

impl Snapshot {
    pub fn installed_version(&self, name: &str) -> Option<&str> {
        self.installed.get(name).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct PinManifest {
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Read a pin manifest (`{"dependencies": ["name@range", ...]}`).
///
/// A missing file is an empty list.
pub fn read_pins(path: &Path) -> Result<Vec<PackageSpec>> {
    let content = match modkit_fs::io::read_text(path) {
        Ok(content) => content,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let manifest: PinManifest =
        serde_json::from_str(&content).map_err(|e| Error::PinManifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    normalize(&manifest.dependencies).map_err(|e| Error::PinManifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Where each scope lives on disk.
#[derive(Debug, Clone)]
pub struct ScopeLocation {
    /// Directory the package manager runs in.
    pub root: PathBuf,
    /// Pin manifest of the scope owner.
    pub pins: PathBuf,
}

/// Takes [`Snapshot`]s of each scope through a [`PackageManager`].
pub struct Prober<'a> {
    manager: &'a dyn PackageManager,
    locations: PerScope<ScopeLocation>,
}

impl<'a> Prober<'a> {
    pub fn new(manager: &'a dyn PackageManager, locations: PerScope<ScopeLocation>) -> Self {
        Self { manager, locations }
    }

    pub fn location(&self, scope: Scope) -> &ScopeLocation {
        self.locations.get(scope)
    }

    /// Probe one scope. Any failure is reported as [`Error::ProbeFailed`].
    pub fn probe(&self, scope: Scope) -> Result<Snapshot> {
        let location = self.locations.get(scope);
        let failed = |reason: String| Error::ProbeFailed {
            scope,
            cwd: location.root.clone(),
            reason,
        };

        let installed = self
            .manager
            .list_installed(&location.root)
            .map_err(|e| failed(e.to_string()))?;
        let pinned = read_pins(&location.pins).map_err(|e| failed(e.to_string()))?;

        tracing::debug!(
            %scope,
            installed = installed.len(),
            pinned = pinned.len(),
            "Probed installed packages"
        );

        Ok(Snapshot { installed, pinned })
    }

    /// Probe the given scopes; scopes not listed get an empty snapshot.
    pub fn probe_scopes(&self, scopes: &[Scope]) -> Result<PerScope<Snapshot>> {
        let mut snapshots: PerScope<Snapshot> = PerScope::default();
        for &scope in scopes {
            *snapshots.get_mut(scope) = self.probe(scope)?;
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_pin_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pins = read_pins(&dir.path().join("package-host.json")).unwrap();
        assert!(pins.is_empty());
    }

    #[test]
    fn pin_file_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package-host.json");
        fs::write(
            &path,
            r#"{"dependencies": ["moment@^2.29.4", "express", "moment@^2.29.4"]}"#,
        )
        .unwrap();

        let pins = read_pins(&path).unwrap();
        let rendered: Vec<String> = pins.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["moment@^2.29.4", "express@*"]);
    }

    #[test]
    fn malformed_pin_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package-theme.json");
        fs::write(&path, r#"{"dependencies": "react"}"#).unwrap();

        assert!(matches!(read_pins(&path), Err(Error::PinManifest { .. })));
    }
}
