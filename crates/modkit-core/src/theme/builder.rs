//! Theme rebuilds.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Rebuilds a theme after its component manifest changed.
pub trait ThemeBuilder: Send + Sync {
    fn rebuild(&self, theme: &str, theme_root: &Path) -> Result<()>;
}

/// Runs a shell command (e.g. `yarn build`) in the theme root.
#[derive(Debug, Clone)]
pub struct CommandThemeBuilder {
    command: String,
}

impl CommandThemeBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl ThemeBuilder for CommandThemeBuilder {
    fn rebuild(&self, theme: &str, theme_root: &Path) -> Result<()> {
        tracing::info!(theme, command = %self.command, "Rebuilding theme");

        let output = shell_command(&self.command)
            .current_dir(theme_root)
            .env("MODKIT_THEME", theme)
            .output()
            .map_err(|e| Error::side_effect(format!("theme build '{}'", self.command), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SideEffect {
                action: format!("theme build '{}'", self.command),
                reason: format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}

/// `sh -c` on Unix, `cmd /C` on Windows.
pub(crate) fn shell_command(cmd_str: &str) -> Command {
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.args(["/C", cmd_str]);
        c
    }
    #[cfg(not(windows))]
    {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_str);
        c
    }
}
