//! Package-manager execution.
//!
//! The lifecycle engine never runs `yarn` or `npm` directly; it goes through
//! the [`PackageManager`] trait so tests can record calls instead.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::probe::InstalledSet;

/// Install, remove and list packages in a project directory.
pub trait PackageManager: Send + Sync {
    /// Installed top-level packages of the project in `cwd`.
    fn list_installed(&self, cwd: &Path) -> Result<InstalledSet>;

    /// Install or change `specs` (`name@range`) in `cwd`.
    fn install(&self, specs: &[String], cwd: &Path) -> Result<()>;

    /// Remove packages by name in `cwd`.
    fn remove(&self, names: &[String], cwd: &Path) -> Result<()>;
}

/// Runs real package-manager binaries.
///
/// - install: `<install> add <specs...>`
/// - remove: `<install> remove <names...>`
/// - list: `<list> ls --json --depth=0`
#[derive(Debug, Clone)]
pub struct CommandPackageManager {
    install_program: String,
    list_program: String,
}

impl Default for CommandPackageManager {
    fn default() -> Self {
        Self::new("yarn", "npm")
    }
}

impl CommandPackageManager {
    pub fn new(install_program: impl Into<String>, list_program: impl Into<String>) -> Self {
        Self {
            install_program: install_program.into(),
            list_program: list_program.into(),
        }
    }

    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<Output> {
        let rendered = format!("{} {}", program, args.join(" "));
        tracing::info!(command = %rendered, cwd = %cwd.display(), "Running package manager");

        program_command(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| Error::Spawn {
                program: program.to_string(),
                reason: e.to_string(),
            })
    }

    fn run_checked(&self, program: &str, args: Vec<String>, cwd: &Path) -> Result<()> {
        let output = self.run(program, &args, cwd)?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                cwd: cwd.to_path_buf(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "Package manager finished"
        );
        Ok(())
    }
}

impl PackageManager for CommandPackageManager {
    fn list_installed(&self, cwd: &Path) -> Result<InstalledSet> {
        let args = vec!["ls".to_string(), "--json".to_string(), "--depth=0".to_string()];
        let output = self.run(&self.list_program, &args, cwd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // npm exits non-zero on peer-dependency problems but still prints a tree.
        match parse_npm_list(&stdout) {
            Ok(installed) => {
                if !output.status.success() {
                    tracing::warn!(
                        cwd = %cwd.display(),
                        exit_code = ?output.status.code(),
                        "Package listing reported problems; using its output anyway"
                    );
                }
                Ok(installed)
            }
            Err(reason) if output.status.success() => Err(Error::CommandFailed {
                command: format!("{} {}", self.list_program, args.join(" ")),
                cwd: cwd.to_path_buf(),
                exit_code: output.status.code(),
                stderr: reason,
            }),
            Err(_) => Err(Error::CommandFailed {
                command: format!("{} {}", self.list_program, args.join(" ")),
                cwd: cwd.to_path_buf(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    fn install(&self, specs: &[String], cwd: &Path) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add".to_string()];
        args.extend(specs.iter().cloned());
        self.run_checked(&self.install_program, args, cwd)
    }

    fn remove(&self, names: &[String], cwd: &Path) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut args = vec!["remove".to_string()];
        args.extend(names.iter().cloned());
        self.run_checked(&self.install_program, args, cwd)
    }
}

/// `yarn` and `npm` are `.cmd` shims on Windows and need the shell.
fn program_command(program: &str) -> Command {
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.args(["/C", program]);
        c
    }
    #[cfg(not(windows))]
    {
        Command::new(program)
    }
}

/// Parse `npm ls --json --depth=0` output into `name -> version`.
///
/// Entries without a `version` (missing or unmet peers) are skipped. A tree
/// without `dependencies` is an empty project.
pub fn parse_npm_list(stdout: &str) -> std::result::Result<InstalledSet, String> {
    let tree: Value = serde_json::from_str(stdout).map_err(|e| e.to_string())?;
    let Some(root) = tree.as_object() else {
        return Err("listing is not a JSON object".to_string());
    };

    let mut installed = InstalledSet::new();
    let Some(dependencies) = root.get("dependencies") else {
        return Ok(installed);
    };
    let Some(dependencies) = dependencies.as_object() else {
        return Err("'dependencies' is not an object".to_string());
    };

    for (name, entry) in dependencies {
        if let Some(version) = entry.get("version").and_then(Value::as_str) {
            installed.insert(name.clone(), version.to_string());
        }
    }
    Ok(installed)
}
