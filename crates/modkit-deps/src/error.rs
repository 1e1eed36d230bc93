use std::path::PathBuf;

use crate::Scope;

/// Errors raised while parsing, probing or executing package dependencies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dependency entry could not be parsed as `name@range`.
    #[error("invalid package spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// A version range could not be parsed.
    #[error("invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    /// A concrete version string could not be parsed.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Listing installed packages failed or returned garbage.
    #[error("failed to probe installed {scope} packages in {cwd}: {reason}")]
    ProbeFailed {
        scope: Scope,
        cwd: PathBuf,
        reason: String,
    },

    /// A pin manifest exists but is not `{"dependencies": [...]}`.
    #[error("malformed pin manifest at {path}: {reason}")]
    PinManifest { path: PathBuf, reason: String },

    /// The package manager binary could not be spawned.
    #[error("package manager '{program}' could not be started: {reason}")]
    Spawn { program: String, reason: String },

    /// The package manager ran and exited unsuccessfully.
    #[error("'{command}' failed in {cwd} (exit code {exit_code:?}): {stderr}")]
    CommandFailed {
        command: String,
        cwd: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Fs(#[from] modkit_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
