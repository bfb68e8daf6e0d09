//! Error types for longshore
//!
//! Uses `thiserror` for library errors. Every variant maps to a process
//! exit code via [`LongshoreError::exit_code`] so scripted callers can
//! distinguish failure classes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for longshore operations
pub type LongshoreResult<T> = Result<T, LongshoreError>;

/// Main error type for longshore operations
#[derive(Error, Debug)]
pub enum LongshoreError {
    /// Requested environment is neither a key nor a value of the table
    #[error("environment '{name}' is not in the environments table")]
    UnknownEnvironment { name: String },

    /// Requested link alias is neither a key nor a value of the table
    #[error("unknown link alias '{alias}'")]
    UnknownLinkAlias { alias: String },

    /// Source directory missing or not a directory
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// No --version flag and the manifest had nothing usable
    #[error("no version supplied and the manifest did not provide one")]
    MissingVersion,

    /// Manifest file unreadable or structurally wrong
    #[error("invalid manifest {file}: {message}")]
    InvalidManifest { file: PathBuf, message: String },

    /// No bucket from config, environment, or flags
    #[error("no bucket configured - set [store].bucket or pass --bucket")]
    MissingBucket,

    /// No store endpoint from config or environment
    #[error("no store endpoint configured - set [store].endpoint")]
    MissingEndpoint,

    /// Objects already exist under the version prefix
    #[error("version '{version}' is already deployed - bump the version number")]
    VersionAlreadyDeployed { version: String },

    /// The version-control probe itself failed (not "file untracked")
    #[error("version-control check failed for {path}: {message}")]
    VcsCheckFailed { path: PathBuf, message: String },

    /// Config file exists but cannot be parsed
    #[error("invalid config {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// Upload failed; the run stops at the first one
    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    /// Store rejected a request (non-success status, bad payload)
    #[error("store error: {message}")]
    Store { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LongshoreError {
    /// Process exit code for this error class.
    ///
    /// Distinct codes let wrapper scripts branch on the failure kind:
    /// 128 = invalid target/version/source, 64 = unknown link alias,
    /// 32 = version already deployed, 8 = VCS check failure, 1 = the rest.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownEnvironment { .. }
            | Self::SourceNotFound { .. }
            | Self::MissingVersion
            | Self::InvalidManifest { .. }
            | Self::MissingBucket
            | Self::MissingEndpoint => 128,
            Self::UnknownLinkAlias { .. } => 64,
            Self::VersionAlreadyDeployed { .. } => 32,
            Self::VcsCheckFailed { .. } => 8,
            _ => 1,
        }
    }
}
