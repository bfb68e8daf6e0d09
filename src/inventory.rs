//! Remote inventory
//!
//! The authoritative snapshot of what already exists under a key prefix.
//! Built once per run by draining every listing page; owned by that run and
//! never shared across runs.

use crate::error::LongshoreResult;
use crate::store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when the initial listing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ListingFallback {
    /// Propagate the error and stop the run.
    #[default]
    Error,
    /// Continue with an empty inventory. Every candidate then counts as new,
    /// so the run degrades to a full re-upload; callers must surface this.
    AssumeEmpty,
}

/// Map of destination key to store-reported fingerprint.
#[derive(Debug, Clone, Default)]
pub struct RemoteInventory {
    entries: BTreeMap<String, String>,
    assumed_empty: Option<String>,
}

impl RemoteInventory {
    /// Fetch every page under `prefix` from the store.
    pub fn fetch<S: ObjectStore>(
        store: &S,
        prefix: &str,
        fallback: ListingFallback,
    ) -> LongshoreResult<Self> {
        match Self::fetch_all(store, prefix) {
            Ok(inventory) => Ok(inventory),
            Err(err) if fallback == ListingFallback::AssumeEmpty => Ok(Self {
                entries: BTreeMap::new(),
                assumed_empty: Some(err.to_string()),
            }),
            Err(err) => Err(err),
        }
    }

    fn fetch_all<S: ObjectStore>(store: &S, prefix: &str) -> LongshoreResult<Self> {
        let mut entries = BTreeMap::new();
        let mut token: Option<String> = None;
        loop {
            let (page, next) = store.list_page(prefix, token.as_deref())?;
            for object in page {
                entries.insert(object.key, object.etag);
            }
            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        Ok(Self {
            entries,
            assumed_empty: None,
        })
    }

    /// Store-reported fingerprint for `key`, if the key exists remotely.
    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The listing error text when [`ListingFallback::AssumeEmpty`] engaged.
    pub fn assumed_empty(&self) -> Option<&str> {
        self.assumed_empty.as_deref()
    }
}
