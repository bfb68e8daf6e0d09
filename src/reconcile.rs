//! Remote reconciliation
//!
//! Terminal steps after upload: prune remote objects with no local
//! counterpart, or promote a published version to an alias prefix via
//! server-side copy.

use crate::error::LongshoreResult;
use crate::inventory::{ListingFallback, RemoteInventory};
use crate::models::DeleteFailure;
use crate::store::ObjectStore;
use std::collections::BTreeSet;

/// Largest number of keys one delete request may carry.
pub const MAX_DELETE_BATCH: usize = 1000;

/// What pruning did.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Keys successfully removed.
    pub removed: Vec<String>,
    /// Keys the store refused to delete. Reported in aggregate, never fatal.
    pub failures: Vec<DeleteFailure>,
}

/// What linking did.
#[derive(Debug, Default)]
pub struct LinkOutcome {
    /// Destination keys written under the alias prefix.
    pub copied: Vec<String>,
}

/// Listing prefix for `prefix`: keys live under `prefix/`.
pub fn listing_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Delete every inventory key that has no local counterpart.
///
/// Deletes go out in batches of at most [`MAX_DELETE_BATCH`] keys. An empty
/// delete set issues no request at all. Per-key refusals inside a batch are
/// collected; they stop neither the batch nor the batches after it.
pub fn prune<S: ObjectStore>(
    store: &S,
    inventory: &RemoteInventory,
    local_keys: &BTreeSet<String>,
) -> LongshoreResult<PruneOutcome> {
    let stale: Vec<String> = inventory
        .keys()
        .filter(|key| !local_keys.contains(*key))
        .map(str::to_string)
        .collect();

    let mut outcome = PruneOutcome::default();
    for batch in stale.chunks(MAX_DELETE_BATCH) {
        let failures = store.delete_batch(batch)?;
        let failed: BTreeSet<&str> = failures.iter().map(|f| f.key.as_str()).collect();
        outcome.removed.extend(
            batch
                .iter()
                .filter(|key| !failed.contains(key.as_str()))
                .cloned(),
        );
        outcome.failures.extend(failures);
    }
    Ok(outcome)
}

/// Server-side copy of everything under `version` to the same relative path
/// under `alias`.
///
/// Idempotent: re-linking overwrites the alias keys with identical content.
/// Source keys are never touched.
pub fn link<S: ObjectStore>(
    store: &S,
    version: &str,
    alias: &str,
) -> LongshoreResult<LinkOutcome> {
    let inventory =
        RemoteInventory::fetch(store, &listing_prefix(version), ListingFallback::Error)?;

    let mut outcome = LinkOutcome::default();
    for source_key in inventory.keys() {
        let relative = source_key.strip_prefix(version).unwrap_or(source_key);
        let destination = format!("{alias}{relative}");
        store.copy(source_key, &destination)?;
        outcome.copied.push(destination);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn inventory_of(store: &MemoryStore, prefix: &str) -> RemoteInventory {
        RemoteInventory::fetch(store, prefix, ListingFallback::Error).unwrap()
    }

    fn keyset(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    // ==========================================================
    // Prune
    // ==========================================================

    #[test]
    fn test_prune_removes_exactly_the_remote_only_keys() {
        let store = MemoryStore::new();
        store.insert("qa/a.js", b"a");
        store.insert("qa/b.js", b"b");
        store.insert("qa/c.js", b"c");
        let inventory = inventory_of(&store, "qa/");

        let outcome = prune(&store, &inventory, &keyset(&["qa/a.js", "qa/c.js"])).unwrap();

        assert_eq!(outcome.removed, vec!["qa/b.js".to_string()]);
        assert!(outcome.failures.is_empty());
        assert!(store.contains("qa/a.js"));
        assert!(!store.contains("qa/b.js"));
        assert!(store.contains("qa/c.js"));
    }

    #[test]
    fn test_prune_empty_set_issues_no_request() {
        let store = MemoryStore::new();
        store.insert("qa/a.js", b"a");
        let inventory = inventory_of(&store, "qa/");

        let outcome = prune(&store, &inventory, &keyset(&["qa/a.js"])).unwrap();

        assert!(outcome.removed.is_empty());
        assert!(outcome.failures.is_empty());
        assert!(store.delete_batch_sizes().is_empty());
    }

    #[test]
    fn test_prune_batches_at_one_thousand_keys() {
        let store = MemoryStore::new();
        for i in 0..2500 {
            store.insert(&format!("qa/old/{i:04}.js"), b"x");
        }
        let inventory = inventory_of(&store, "qa/");

        let outcome = prune(&store, &inventory, &BTreeSet::new()).unwrap();

        assert_eq!(outcome.removed.len(), 2500);
        assert_eq!(store.delete_batch_sizes(), vec![1000, 1000, 500]);
        assert_eq!(store.object_count(), 0);
    }

    #[test]
    fn test_prune_exact_batch_boundary() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            store.insert(&format!("qa/{i:04}"), b"x");
        }
        let inventory = inventory_of(&store, "qa/");

        prune(&store, &inventory, &BTreeSet::new()).unwrap();

        assert_eq!(store.delete_batch_sizes(), vec![1000]);
    }

    #[test]
    fn test_prune_collects_per_key_failures() {
        let store = MemoryStore::new();
        store.insert("qa/a.js", b"a");
        store.insert("qa/locked.js", b"b");
        store.insert("qa/c.js", b"c");
        store.fail_delete_of("qa/locked.js");
        let inventory = inventory_of(&store, "qa/");

        let outcome = prune(&store, &inventory, &BTreeSet::new()).unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].key, "qa/locked.js");
        assert_eq!(
            outcome.removed,
            vec!["qa/a.js".to_string(), "qa/c.js".to_string()]
        );
        assert!(store.contains("qa/locked.js"));
    }

    // ==========================================================
    // Link
    // ==========================================================

    #[test]
    fn test_link_copies_preserving_relative_paths() {
        let store = MemoryStore::new();
        store.insert("1.0.0/x.js", b"bundle");
        store.insert("1.0.0/css/y.css", b"styles");

        let outcome = link(&store, "1.0.0", "staging").unwrap();

        assert_eq!(
            outcome.copied,
            vec!["staging/css/y.css".to_string(), "staging/x.js".to_string()]
        );
        assert_eq!(store.content_of("staging/x.js").unwrap(), b"bundle");
        assert_eq!(store.content_of("staging/css/y.css").unwrap(), b"styles");
        // Source version is untouched.
        assert_eq!(store.content_of("1.0.0/x.js").unwrap(), b"bundle");
        assert_eq!(store.content_of("1.0.0/css/y.css").unwrap(), b"styles");
    }

    #[test]
    fn test_link_is_idempotent() {
        let store = MemoryStore::new();
        store.insert("1.0.0/x.js", b"bundle");

        let first = link(&store, "1.0.0", "staging").unwrap();
        let count_after_first = store.object_count();
        let second = link(&store, "1.0.0", "staging").unwrap();

        assert_eq!(first.copied, second.copied);
        assert_eq!(store.object_count(), count_after_first);
        assert_eq!(store.content_of("staging/x.js").unwrap(), b"bundle");
    }

    #[test]
    fn test_link_does_not_cross_version_boundaries() {
        let store = MemoryStore::new();
        store.insert("1.0.0/x.js", b"v1");
        store.insert("1.0.0-beta/x.js", b"beta");

        link(&store, "1.0.0", "staging").unwrap();

        assert_eq!(store.content_of("staging/x.js").unwrap(), b"v1");
        assert!(!store.contains("staging-beta/x.js"));
    }

    #[test]
    fn test_link_empty_version_copies_nothing() {
        let store = MemoryStore::new();
        let outcome = link(&store, "9.9.9", "staging").unwrap();
        assert!(outcome.copied.is_empty());
    }

    #[test]
    fn test_listing_prefix_appends_one_slash() {
        assert_eq!(listing_prefix("qa"), "qa/");
        assert_eq!(listing_prefix("qa/"), "qa/");
    }
}
