//! Error types for modkit-core

use std::path::PathBuf;

use modkit_deps::Plan;

use crate::hooks::HookError;
use crate::module::Module;

/// Result type for modkit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in modkit-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Archive validation. Raised before anything touches the host.
    #[error("Module archive must be a .zip file: {path}")]
    InvalidExtension { path: PathBuf },

    #[error("Module archive {archive} has no {expected}")]
    MissingManifest { archive: PathBuf, expected: String },

    #[error("Invalid module descriptor in {source_name}: {reason}")]
    ManifestParse { source_name: String, reason: String },

    #[error("Archive is named '{archive_name}' but its descriptor declares '{declared}'")]
    NameMismatch {
        archive_name: String,
        declared: String,
    },

    #[error("Module {module} requires host version {required}, running {host}")]
    VersionIncompatible {
        module: String,
        required: String,
        host: String,
    },

    #[error("Archive entry '{entry}' is outside the main folder '{main_folder}/'")]
    MissingMainFolder { main_folder: String, entry: String },

    #[error("Archive entry '{entry}' has an unsafe path")]
    UnsafeEntry { entry: String },

    #[error("Failed to read archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    // Registry and lifecycle state.
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Module {0} is active; deactivate it first")]
    ModuleActive(String),

    #[error("Module {module} needs these modules active first: {}", missing.join(", "))]
    MissingModuleDependency {
        module: String,
        missing: Vec<String>,
    },

    #[error("Module {module} is required by active modules: {}", required_by.join(", "))]
    RequiredByActiveModule {
        module: String,
        required_by: Vec<String>,
    },

    #[error("Component {component} of {module} is already provided by active module {owner}")]
    ComponentConflict {
        component: String,
        module: String,
        owner: String,
    },

    // Dependency reconciliation.
    #[error("Failed to probe installed packages: {0}")]
    DependencyProbe(#[source] modkit_deps::Error),

    #[error("Unresolved dependency conflicts: {}", describe_conflicts(plan))]
    DependencyConflict { plan: Box<Plan> },

    /// A copy, manifest write or package-manager command failed.
    #[error("{action} failed: {reason}")]
    SideEffect { action: String, reason: String },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("Module registry error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Deps(#[from] modkit_deps::Error),

    #[error(transparent)]
    Fs(#[from] modkit_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn side_effect(action: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::SideEffect {
            action: action.into(),
            reason: err.to_string(),
        }
    }

    /// Whether this error was raised while validating an archive.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidExtension { .. }
                | Self::MissingManifest { .. }
                | Self::ManifestParse { .. }
                | Self::NameMismatch { .. }
                | Self::VersionIncompatible { .. }
                | Self::MissingMainFolder { .. }
                | Self::UnsafeEntry { .. }
                | Self::Archive { .. }
        )
    }
}

fn describe_conflicts(plan: &Plan) -> String {
    plan.conflicts()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed public operation together with the module list as read after
/// the failure, so callers can refresh their view.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct OperationError {
    #[source]
    pub error: Error,
    pub modules: Vec<Module>,
}

impl OperationError {
    pub fn into_inner(self) -> Error {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_list_in_message() {
        let err = Error::MissingModuleDependency {
            module: "shop".into(),
            missing: vec!["cart".into(), "payments".into()],
        };
        assert_eq!(
            err.to_string(),
            "Module shop needs these modules active first: cart, payments"
        );
    }

    #[test]
    fn validation_errors_are_classified() {
        assert!(
            Error::NameMismatch {
                archive_name: "foo".into(),
                declared: "bar".into()
            }
            .is_validation()
        );
        assert!(!Error::NotFound("x".into()).is_validation());
    }
}
