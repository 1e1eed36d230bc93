//! Host configuration (`modkit.toml`).
//!
//! ```toml
//! root = "."
//! environment = "production"
//! current_theme = "default_theme"
//! host_version = "1.4.0"
//!
//! [paths]
//! modules = "modules"
//! themes = "themes"
//! backoffice = "backoffice"
//! registry = "modules.json"
//!
//! [pins]
//! host = "package-host.json"
//! theme = "package-theme.json"
//!
//! [package_manager]
//! install = "yarn"
//! list = "npm"
//!
//! [theme]
//! build_command = "yarn build"
//!
//! [hooks]
//! interpreter = "node"
//! ```
//!
//! Every section and key is optional. Relative paths resolve against
//! `root`, and `root` resolves against the directory of the config file.

use std::path::{Path, PathBuf};

use modkit_deps::{PerScope, ScopeLocation};
use modkit_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub modules: PathBuf,
    pub themes: PathBuf,
    pub backoffice: PathBuf,
    pub registry: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            modules: "modules".into(),
            themes: "themes".into(),
            backoffice: "backoffice".into(),
            registry: "modules.json".into(),
        }
    }
}

/// Pin manifests: packages the host and the theme need for themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinsConfig {
    /// Relative to the host root.
    pub host: PathBuf,
    /// Relative to the theme root.
    pub theme: PathBuf,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            host: "package-host.json".into(),
            theme: "package-theme.json".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManagerConfig {
    pub install: String,
    pub list: String,
}

impl Default for PackageManagerConfig {
    fn default() -> Self {
        Self {
            install: "yarn".into(),
            list: "npm".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub build_command: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            build_command: "yarn build".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub interpreter: String,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            interpreter: "node".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub root: PathBuf,
    pub environment: Environment,
    pub current_theme: String,
    /// Falls back to `version` in `<root>/package.json`.
    pub host_version: Option<String>,
    pub paths: PathsConfig,
    pub pins: PinsConfig,
    pub package_manager: PackageManagerConfig,
    pub theme: ThemeConfig,
    pub hooks: HooksConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            environment: Environment::default(),
            current_theme: "default_theme".into(),
            host_version: None,
            paths: PathsConfig::default(),
            pins: PinsConfig::default(),
            package_manager: PackageManagerConfig::default(),
            theme: ThemeConfig::default(),
            hooks: HooksConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    version: Option<String>,
}

impl HostConfig {
    /// Defaults rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load from a `.toml` or `.json` file and resolve `root`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: HostConfig = ConfigStore::new().load(path)?;
        if config.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root = base.join(&config.root);
        }
        config.validate()?;
        tracing::debug!(path = %path.display(), root = %config.root.display(), "Loaded host configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.current_theme.trim().is_empty() {
            return Err(Error::Config {
                message: "current_theme must not be empty".into(),
            });
        }
        if self.package_manager.install.trim().is_empty()
            || self.package_manager.list.trim().is_empty()
        {
            return Err(Error::Config {
                message: "package_manager programs must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.resolve(&self.paths.modules)
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.resolve(&self.paths.themes)
    }

    pub fn theme_root(&self, theme: &str) -> PathBuf {
        self.themes_dir().join(theme)
    }

    pub fn current_theme_root(&self) -> PathBuf {
        self.theme_root(&self.current_theme)
    }

    pub fn backoffice_dir(&self) -> PathBuf {
        self.resolve(&self.paths.backoffice)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.resolve(&self.paths.registry)
    }

    /// Where the package manager runs for each scope and which pin file
    /// applies.
    pub fn scope_locations(&self) -> PerScope<ScopeLocation> {
        let theme_root = self.current_theme_root();
        PerScope::new(
            ScopeLocation {
                root: self.root.clone(),
                pins: self.resolve(&self.pins.host),
            },
            ScopeLocation {
                pins: theme_root.join(&self.pins.theme),
                root: theme_root,
            },
        )
    }

    /// The configured host version, else `version` from `package.json`.
    pub fn host_version(&self) -> Result<String> {
        if let Some(version) = &self.host_version {
            return Ok(version.clone());
        }

        let path = self.root.join("package.json");
        let package: PackageJson = ConfigStore::new().load(&path).map_err(|e| Error::Config {
            message: format!("host_version is not set and {} is unreadable: {e}", path.display()),
        })?;
        package.version.ok_or_else(|| Error::Config {
            message: format!("host_version is not set and {} has no version", path.display()),
        })
    }
}
