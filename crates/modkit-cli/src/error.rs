//! Error types for modkit-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from modkit-core
    #[error(transparent)]
    Core(#[from] modkit_core::Error),

    /// A failed lifecycle operation
    #[error(transparent)]
    Operation(#[from] modkit_core::OperationError),

    /// Error from modkit-deps (resolution specs)
    #[error(transparent)]
    Deps(#[from] modkit_deps::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
