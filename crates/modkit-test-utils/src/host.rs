//! [`TestHost`]: a temporary host application directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Theme every [`TestHost`] starts with.
pub const DEFAULT_THEME: &str = "default_theme";

/// Host version written into the generated `modkit.toml`.
pub const HOST_VERSION: &str = "1.4.0";

/// A temporary host layout:
///
/// ```text
/// <root>/
///   modkit.toml
///   package.json
///   modules/
///   backoffice/app/
///   themes/default_theme/
///     package.json
///     assets/i18n/{en,fr}/
///     modules/
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use modkit_test_utils::TestHost;
///
/// let host = TestHost::new();
/// host.write_host_pins(&["moment@^2.29.4"]);
/// host.assert_file_exists("package-host.json");
/// ```
pub struct TestHost {
    temp_dir: TempDir,
    theme: String,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    /// Create the layout in development mode.
    pub fn new() -> Self {
        Self::with_environment("development")
    }

    /// Create the layout with `environment` in `modkit.toml`.
    pub fn with_environment(environment: &str) -> Self {
        let host = Self {
            temp_dir: TempDir::new().unwrap(),
            theme: DEFAULT_THEME.to_string(),
        };

        for dir in [
            "modules",
            "backoffice/app",
            "backoffice/assets/translations/modules",
            "themes/default_theme/assets/i18n/en",
            "themes/default_theme/assets/i18n/fr",
            "themes/default_theme/modules",
        ] {
            fs::create_dir_all(host.root().join(dir)).unwrap();
        }
        host.write("package.json", r#"{"name": "host", "version": "1.4.0"}"#);
        host.write(
            "themes/default_theme/package.json",
            r#"{"name": "default_theme", "version": "1.0.0"}"#,
        );
        host.write("modkit.toml", &host.config_toml(environment));
        host
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("modkit.toml")
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root().join("modules")
    }

    pub fn theme_root(&self) -> PathBuf {
        self.root().join("themes").join(&self.theme)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root().join("modules.json")
    }

    /// `modkit.toml` contents for this host.
    pub fn config_toml(&self, environment: &str) -> String {
        format!(
            "root = \".\"\n\
             environment = \"{environment}\"\n\
             current_theme = \"{theme}\"\n\
             host_version = \"{HOST_VERSION}\"\n\
             \n\
             [theme]\n\
             build_command = \"true\"\n",
            theme = self.theme,
        )
    }

    /// Write `content` at `path` relative to the root, creating parents.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
        full
    }

    pub fn write_host_pins(&self, specs: &[&str]) -> PathBuf {
        self.write("package-host.json", &pin_manifest(specs))
    }

    pub fn write_theme_pins(&self, specs: &[&str]) -> PathBuf {
        let path = format!("themes/{}/package-theme.json", self.theme);
        self.write(&path, &pin_manifest(specs))
    }

    pub fn read(&self, path: &str) -> String {
        let full = self.root().join(path);
        fs::read_to_string(&full)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full.display()))
    }

    /// # Panics
    /// Panics if `path` (relative to the root) does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if `path` (relative to the root) exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {} does not contain {:?}.\nActual content:\n{}",
            path,
            content,
            file_content
        );
    }
}

fn pin_manifest(specs: &[&str]) -> String {
    serde_json::json!({ "dependencies": specs }).to_string()
}
