//! Longshore - static asset deployment and synchronization tool
//!
//! Longshore publishes web build output to versioned prefixes in an object
//! store and keeps branch environments in sync with the tracked working
//! tree, uploading only files whose content fingerprint changed.

pub mod config;
pub mod content_type;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod hash;
pub mod inventory;
pub mod manifest;
pub mod models;
pub mod plan;
pub mod progress;
pub mod reconcile;
pub mod store;
pub mod vcs;

// Re-exports for convenience
pub use config::{Config, ConfigWarning};
pub use engine::{DeployEngine, DeployEvent, DeployOptions, DeployOutcome};
pub use enumerate::{enumerate_files, EnumerationPolicy};
pub use error::{LongshoreError, LongshoreResult};
pub use hash::hash_file;
pub use inventory::{ListingFallback, RemoteInventory};
pub use models::{LocalCandidate, RemoteObject, UploadTask};
pub use plan::{plan_deploy, DeployPlan, KeyLayout};
pub use store::{HttpStore, ObjectStore};
