//! Change detection and upload planning
//!
//! Decides per candidate whether its content must be transferred, and with
//! what destination key and metadata. Decisions are independent of each
//! other: no shared cursor, so evaluation order never matters.

use crate::content_type;
use crate::error::LongshoreResult;
use crate::hash;
use crate::inventory::RemoteInventory;
use crate::models::{LocalCandidate, UploadTask};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// How destination keys are derived from candidate paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// `prefix/<source-dir-name>/<relative>`. Branch syncs keep the source
    /// directory visible in the key; syncing `.` omits the directory name.
    IncludeSourceDir,
    /// `prefix/<relative>`. Versioned builds publish the tree contents
    /// directly under the version prefix.
    SourceRelative,
}

/// Inputs that stay fixed across one planning pass.
pub struct PlanRequest<'a> {
    pub prefix: &'a str,
    pub source_root: &'a Path,
    pub layout: KeyLayout,
    pub force: bool,
    pub cache_seconds: u64,
    pub content_types: &'a BTreeMap<String, String>,
}

/// Everything the execute stage needs, fixed before the first upload.
#[derive(Debug, Default)]
pub struct DeployPlan {
    pub to_upload: Vec<UploadTask>,
    /// Destination keys whose remote content already matches.
    pub to_skip: Vec<String>,
}

impl DeployPlan {
    /// Destination keys of every candidate in this plan, uploaded or not.
    /// This is the "what exists locally" set that pruning compares against.
    pub fn local_keys(&self) -> BTreeSet<String> {
        self.to_upload
            .iter()
            .map(|t| t.destination_key.clone())
            .chain(self.to_skip.iter().cloned())
            .collect()
    }
}

/// Destination key for one candidate.
pub fn destination_key(
    layout: KeyLayout,
    prefix: &str,
    source_root: &Path,
    relative: &Path,
) -> String {
    let rel = key_path(relative);
    match layout {
        KeyLayout::SourceRelative => format!("{prefix}/{rel}"),
        KeyLayout::IncludeSourceDir => match source_root.file_name() {
            Some(name) => format!("{prefix}/{}/{rel}", name.to_string_lossy()),
            None => format!("{prefix}/{rel}"),
        },
    }
}

/// Relative path as a store key fragment, `/`-joined on every platform.
fn key_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `candidate` must be transferred to `key`.
///
/// Decision order: force wins, then remote presence, then content
/// comparison. The file is only read when a comparison is actually needed.
pub fn needs_upload(
    candidate: &LocalCandidate,
    key: &str,
    inventory: &RemoteInventory,
    force: bool,
) -> LongshoreResult<bool> {
    if force {
        return Ok(true);
    }
    match inventory.fingerprint(key) {
        None => Ok(true),
        Some(remote) => Ok(hash::hash_file(&candidate.absolute)? != remote),
    }
}

/// Fold per-candidate decisions into a transfer plan, resolving each task's
/// content type up front.
pub fn plan_deploy(
    candidates: &[LocalCandidate],
    inventory: &RemoteInventory,
    request: &PlanRequest<'_>,
) -> LongshoreResult<DeployPlan> {
    let mut plan = DeployPlan::default();
    for candidate in candidates {
        let key = destination_key(
            request.layout,
            request.prefix,
            request.source_root,
            &candidate.relative,
        );
        if needs_upload(candidate, &key, inventory, request.force)? {
            let content_type =
                content_type::resolve(&candidate.absolute, request.content_types)?;
            plan.to_upload.push(UploadTask {
                local_path: candidate.absolute.clone(),
                destination_key: key,
                content_type,
                cache_seconds: request.cache_seconds,
            });
        } else {
            plan.to_skip.push(key);
        }
    }
    Ok(plan)
}
