//! Module hooks run when a module is deactivated.
//!
//! The scheduled-job and mail-template subsystems live outside this crate;
//! they are reached through [`ModuleHooks`] only.

use std::path::PathBuf;
use std::process::Command;

use crate::module::Module;

pub const UNINIT_SCRIPT: &str = "uninit.js";

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The module ships no such script. Callers treat this as "nothing to do".
    #[error("Hook script not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Hook {script} of module {module} could not be started: {reason}")]
    Spawn {
        module: String,
        script: String,
        reason: String,
    },

    #[error("Hook {script} of module {module} failed (exit code {exit_code:?}): {stderr}")]
    Failed {
        module: String,
        script: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to deregister {kind} '{name}': {reason}")]
    Deregister {
        kind: String,
        name: String,
        reason: String,
    },
}

/// Teardown hooks of the host.
pub trait ModuleHooks: Send + Sync {
    /// Run the module's uninit script.
    fn uninit(&self, module: &Module) -> Result<(), HookError>;

    /// Deregister a scheduled job the module created.
    fn remove_job(&self, name: &str) -> Result<(), HookError>;

    /// Deregister a mail template type the module created.
    fn remove_mail_type(&self, code: &str) -> Result<(), HookError>;
}

/// Runs `<interpreter> uninit.js` in the module directory.
///
/// Job and mail-type deregistration are only logged: the host subsystems
/// that own them pick the change up from the registry.
#[derive(Debug, Clone)]
pub struct ScriptHooks {
    interpreter: String,
}

impl Default for ScriptHooks {
    fn default() -> Self {
        Self::new("node")
    }
}

impl ScriptHooks {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl ModuleHooks for ScriptHooks {
    fn uninit(&self, module: &Module) -> Result<(), HookError> {
        let script = module.script(UNINIT_SCRIPT);
        if !script.is_file() {
            return Err(HookError::NotFound { path: script });
        }

        tracing::info!(module = %module.name, interpreter = %self.interpreter, "Running uninit script");
        let output = Command::new(&self.interpreter)
            .arg(UNINIT_SCRIPT)
            .current_dir(&module.path)
            .env("MODKIT_MODULE", &module.name)
            .output()
            .map_err(|e| HookError::Spawn {
                module: module.name.clone(),
                script: UNINIT_SCRIPT.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(HookError::Failed {
                module: module.name.clone(),
                script: UNINIT_SCRIPT.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn remove_job(&self, name: &str) -> Result<(), HookError> {
        tracing::info!(job = name, "Deregistered module job");
        Ok(())
    }

    fn remove_mail_type(&self, code: &str) -> Result<(), HookError> {
        tracing::info!(mail_type = code, "Deregistered module mail type");
        Ok(())
    }
}
