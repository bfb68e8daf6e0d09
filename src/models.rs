//! Core data models for longshore
//!
//! Defines the fundamental data structures flowing through the deploy
//! pipeline:
//! - `RemoteObject`: one listed object in the remote store
//! - `LocalCandidate`: one local file selected for deployment
//! - `UploadTask`: a pending transfer with its destination metadata
//! - `DeleteFailure`: a per-key error from a batched delete

use std::path::PathBuf;

/// One object in the remote store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    /// Store-reported content fingerprint (hex SHA-256 of the object bytes).
    pub etag: String,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            etag: etag.into(),
        }
    }
}

/// One local file selected for deployment.
///
/// Produced by enumeration and consumed exactly once by change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCandidate {
    /// Path relative to the source root; becomes part of the destination key.
    pub relative: PathBuf,
    /// Absolute path used for reading and hashing.
    pub absolute: PathBuf,
}

/// A file that must be transferred, with its destination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub destination_key: String,
    pub content_type: String,
    /// Rendered as `Cache-Control: max-age=<n>` on upload.
    pub cache_seconds: u64,
}

/// A single key the store refused to delete inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub message: String,
}
