//! Deploy engine
//!
//! One engine drives both workflows: branch syncs of a tracked working tree
//! and versioned publishes of a build directory. The differences between
//! them are policy toggles on [`DeployOptions`], not separate code paths.
//!
//! A run is staged: [`DeployEngine::plan`] enumerates, lists and decides
//! without transferring anything; [`DeployEngine::execute_with_callback`]
//! performs the transfers and the optional prune. Local and precondition
//! failures therefore surface before the first upload request.

use crate::enumerate::{enumerate_files, EnumerationPolicy};
use crate::error::{LongshoreError, LongshoreResult};
use crate::inventory::{ListingFallback, RemoteInventory};
use crate::plan::{plan_deploy, DeployPlan, KeyLayout, PlanRequest};
use crate::progress::{ProgressSink, TerminalProgress};
use crate::reconcile::{self, LinkOutcome, PruneOutcome};
use crate::store::{HttpStore, ObjectStore};
use crate::vcs::{GitProbe, VcsProbe};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub policy: EnumerationPolicy,
    pub layout: KeyLayout,
    /// Upload everything, ignoring remote fingerprints.
    pub force: bool,
    /// Remove remote keys with no local counterpart after uploading.
    pub prune: bool,
    pub cache_seconds: u64,
    /// Fail before the first upload when the prefix is already occupied.
    pub require_fresh: bool,
    pub listing_fallback: ListingFallback,
    /// File suffix to content type overrides.
    pub content_types: BTreeMap<String, String>,
    /// Render a per-file progress line on stderr.
    pub progress: bool,
    /// Plan and report without transferring.
    pub dry_run: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            policy: EnumerationPolicy::RequireTracked,
            layout: KeyLayout::IncludeSourceDir,
            force: false,
            prune: false,
            cache_seconds: 86400,
            require_fresh: false,
            listing_fallback: ListingFallback::Error,
            content_types: BTreeMap::new(),
            progress: false,
            dry_run: false,
        }
    }
}

/// Staged output of [`DeployEngine::plan`]: everything decided, nothing
/// transferred yet.
#[derive(Debug)]
pub struct RunPlan {
    pub transfers: DeployPlan,
    /// Strays reported by enumeration (tracked-only policy).
    pub excluded: Vec<PathBuf>,
    /// Set when a failed listing was degraded to an empty inventory.
    pub listing_warning: Option<String>,
    inventory: RemoteInventory,
}

/// Progress callbacks emitted while executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    UploadStart {
        index: usize,
        total: usize,
        key: String,
        bytes: u64,
    },
    Uploaded {
        index: usize,
        total: usize,
        key: String,
    },
}

/// What a run did (or, for a dry run, would have done).
#[derive(Debug)]
pub struct DeployOutcome {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub excluded: Vec<PathBuf>,
    pub listing_warning: Option<String>,
    pub prune: Option<PruneOutcome>,
    pub dry_run: bool,
}

/// The deploy pipeline over a store and a VCS probe.
pub struct DeployEngine<S: ObjectStore = HttpStore, V: VcsProbe = GitProbe> {
    source_root: PathBuf,
    prefix: String,
    store: S,
    vcs: V,
    options: DeployOptions,
}

impl<S: ObjectStore, V: VcsProbe> DeployEngine<S, V> {
    pub fn new(
        source_root: impl Into<PathBuf>,
        prefix: impl Into<String>,
        store: S,
        vcs: V,
        options: DeployOptions,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            prefix: prefix.into(),
            store,
            vcs,
            options,
        }
    }

    /// Destination prefix this engine deploys under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Enumerate, list remote state, and decide what must transfer.
    ///
    /// Local and VCS failures surface here before any network request; the
    /// fresh-version guard fires here before any upload.
    pub fn plan(&self) -> LongshoreResult<RunPlan> {
        let enumeration = enumerate_files(&self.source_root, self.options.policy, &self.vcs)?;

        // The fresh-version guard cannot be evaluated against an inventory
        // that was assumed empty, so it pins the fallback to Error.
        let fallback = if self.options.require_fresh {
            ListingFallback::Error
        } else {
            self.options.listing_fallback
        };
        let inventory = RemoteInventory::fetch(
            &self.store,
            &reconcile::listing_prefix(&self.prefix),
            fallback,
        )?;

        if self.options.require_fresh && !inventory.is_empty() {
            return Err(LongshoreError::VersionAlreadyDeployed {
                version: self.prefix.clone(),
            });
        }

        let transfers = plan_deploy(
            &enumeration.candidates,
            &inventory,
            &PlanRequest {
                prefix: &self.prefix,
                source_root: &self.source_root,
                layout: self.options.layout,
                force: self.options.force,
                cache_seconds: self.options.cache_seconds,
                content_types: &self.options.content_types,
            },
        )?;

        Ok(RunPlan {
            listing_warning: inventory.assumed_empty().map(str::to_string),
            transfers,
            excluded: enumeration.excluded,
            inventory,
        })
    }

    /// Execute a plan: upload in order, then prune when enabled.
    ///
    /// The first upload failure aborts the run; per-key prune failures are
    /// collected into the outcome instead.
    pub fn execute_with_callback<F>(
        &self,
        plan: RunPlan,
        mut callback: Option<F>,
    ) -> LongshoreResult<DeployOutcome>
    where
        F: FnMut(DeployEvent),
    {
        if self.options.dry_run {
            return Ok(DeployOutcome {
                uploaded: plan
                    .transfers
                    .to_upload
                    .iter()
                    .map(|t| t.destination_key.clone())
                    .collect(),
                skipped: plan.transfers.to_skip,
                excluded: plan.excluded,
                listing_warning: plan.listing_warning,
                prune: None,
                dry_run: true,
            });
        }

        let total = plan.transfers.to_upload.len();
        let local_keys = plan.transfers.local_keys();
        let mut uploaded = Vec::with_capacity(total);

        for (index, task) in plan.transfers.to_upload.iter().enumerate() {
            let bytes = std::fs::metadata(&task.local_path)?.len();
            if let Some(cb) = callback.as_mut() {
                cb(DeployEvent::UploadStart {
                    index,
                    total,
                    key: task.destination_key.clone(),
                    bytes,
                });
            }

            let sink: Option<Arc<dyn ProgressSink>> = if self.options.progress {
                Some(Arc::new(TerminalProgress::new(
                    task.destination_key.clone(),
                    bytes,
                )))
            } else {
                None
            };
            self.store.put(task, sink)?;
            uploaded.push(task.destination_key.clone());

            if let Some(cb) = callback.as_mut() {
                cb(DeployEvent::Uploaded {
                    index,
                    total,
                    key: task.destination_key.clone(),
                });
            }
        }

        let prune = if self.options.prune {
            Some(reconcile::prune(&self.store, &plan.inventory, &local_keys)?)
        } else {
            None
        };

        Ok(DeployOutcome {
            uploaded,
            skipped: plan.transfers.to_skip,
            excluded: plan.excluded,
            listing_warning: plan.listing_warning,
            prune,
            dry_run: false,
        })
    }

    /// Plan and execute in one call, without callbacks.
    pub fn run(&self) -> LongshoreResult<DeployOutcome> {
        self.run_with_callback::<fn(DeployEvent)>(None)
    }

    /// Plan and execute in one call.
    pub fn run_with_callback<F>(&self, callback: Option<F>) -> LongshoreResult<DeployOutcome>
    where
        F: FnMut(DeployEvent),
    {
        let plan = self.plan()?;
        self.execute_with_callback(plan, callback)
    }

    /// Promote this engine's prefix to `alias_prefix` by server-side copy.
    pub fn link_to(&self, alias_prefix: &str) -> LongshoreResult<LinkOutcome> {
        reconcile::link(&self.store, &self.prefix, alias_prefix)
    }
}
