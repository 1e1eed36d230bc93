//! [`RecordingPackageManager`]: an in-memory [`PackageManager`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use modkit_deps::range::parse_version;
use modkit_deps::{Error, InstalledSet, PackageManager, PackageSpec, Result};

/// One recorded package-manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PmCall {
    List { cwd: PathBuf },
    Install { cwd: PathBuf, specs: Vec<String> },
    Remove { cwd: PathBuf, names: Vec<String> },
}

impl PmCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::List { .. })
    }
}

#[derive(Debug, Default)]
struct State {
    installed: BTreeMap<PathBuf, InstalledSet>,
    calls: Vec<PmCall>,
    fail_listing: bool,
    fail_install: bool,
}

/// Keeps an installed set per working directory and records every call.
///
/// `install` resolves a range to the lowest version it names (`^4.0.0` ->
/// `4.0.0`, `*` -> `1.0.0`), which is enough for the planner to consider
/// the package satisfied afterwards.
#[derive(Debug, Default)]
pub struct RecordingPackageManager {
    state: Mutex<State>,
}

impl RecordingPackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `name@version` is installed in `cwd`.
    pub fn set_installed(&self, cwd: &Path, name: &str, version: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .installed
            .entry(cwd.to_path_buf())
            .or_default()
            .insert(name.to_string(), version.to_string());
    }

    pub fn installed(&self, cwd: &Path) -> InstalledSet {
        let state = self.state.lock().unwrap();
        state.installed.get(cwd).cloned().unwrap_or_default()
    }

    /// Make every `list_installed` call fail.
    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    /// Make every `install` call fail.
    pub fn fail_install(&self, fail: bool) {
        self.state.lock().unwrap().fail_install = fail;
    }

    pub fn calls(&self) -> Vec<PmCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Install and remove calls only.
    pub fn mutations(&self) -> Vec<PmCall> {
        self.calls().into_iter().filter(PmCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl PackageManager for RecordingPackageManager {
    fn list_installed(&self, cwd: &Path) -> Result<InstalledSet> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PmCall::List {
            cwd: cwd.to_path_buf(),
        });
        if state.fail_listing {
            return Err(Error::CommandFailed {
                command: "npm ls --json --depth=0".to_string(),
                cwd: cwd.to_path_buf(),
                exit_code: Some(1),
                stderr: "simulated listing failure".to_string(),
            });
        }
        Ok(state.installed.get(cwd).cloned().unwrap_or_default())
    }

    fn install(&self, specs: &[String], cwd: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PmCall::Install {
            cwd: cwd.to_path_buf(),
            specs: specs.to_vec(),
        });
        if state.fail_install {
            return Err(Error::CommandFailed {
                command: format!("yarn add {}", specs.join(" ")),
                cwd: cwd.to_path_buf(),
                exit_code: Some(1),
                stderr: "simulated install failure".to_string(),
            });
        }
        let installed = state.installed.entry(cwd.to_path_buf()).or_default();
        for raw in specs {
            let spec = PackageSpec::parse(raw)?;
            installed.insert(spec.name().to_string(), lowest_version(spec.range()));
        }
        Ok(())
    }

    fn remove(&self, names: &[String], cwd: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PmCall::Remove {
            cwd: cwd.to_path_buf(),
            names: names.to_vec(),
        });
        if let Some(installed) = state.installed.get_mut(cwd) {
            for name in names {
                installed.remove(name);
            }
        }
        Ok(())
    }
}

fn lowest_version(range: &str) -> String {
    let first = range
        .split("||")
        .next()
        .unwrap_or("")
        .split_whitespace()
        .next()
        .unwrap_or("");
    let trimmed = first.trim_start_matches(['^', '~', '=', '>', '<', 'v']);
    let numeric: Vec<&str> = trimmed
        .split('.')
        .take_while(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .collect();
    if numeric.is_empty() {
        return "1.0.0".to_string();
    }
    parse_version(&numeric.join("."))
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "1.0.0".to_string())
}
