//! A single named cache generation.
//!
//! Entries are held in a moka cache without capacity or TTL limits; age-based
//! eviction is the job of [`ExpiryScanner`](super::ExpiryScanner), which works
//! from each entry's capture timestamp rather than moka's insertion clock.
//!
//! Every write replaces a whole [`StoredResponse`] behind an `Arc`, so readers
//! see either no entry or a complete previously committed one.

use std::sync::Arc;
use std::time::SystemTime;

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use crate::types::{RequestIdentity, StoredResponse};

/// Named, isolated collection of stored responses.
pub struct Generation {
    name: String,
    entries: Cache<RequestIdentity, Arc<StoredResponse>>,
}

impl Generation {
    /// Create an empty generation.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let entries = Cache::builder().name(&name).build();
        Self { name, entries }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an entry.
    pub async fn get(&self, key: &RequestIdentity) -> Option<Arc<StoredResponse>> {
        self.entries.get(key).await
    }

    /// Insert or wholesale-replace an entry. Last writer wins.
    pub async fn put(&self, key: RequestIdentity, value: StoredResponse) {
        self.entries.insert(key, Arc::new(value)).await;
    }

    /// Remove an entry. Returns whether one was present.
    pub async fn delete(&self, key: &RequestIdentity) -> bool {
        self.entries.remove(key).await.is_some()
    }

    /// Remove an entry only if it is still the snapshot captured at `captured_at`.
    ///
    /// Used by the expiry sweep so that an entry refreshed after it was
    /// inspected is left alone.
    pub async fn delete_if_captured_at(
        &self,
        key: &RequestIdentity,
        captured_at: SystemTime,
    ) -> bool {
        let result = self
            .entries
            .entry(key.clone())
            .and_compute_with(|existing| {
                let op = match existing {
                    Some(entry) if entry.value().captured_at == captured_at => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        matches!(result, CompResult::Removed(_))
    }

    pub fn contains(&self, key: &RequestIdentity) -> bool {
        self.entries.contains_key(key)
    }

    /// Current keys. Order is not guaranteed.
    pub fn keys(&self) -> Vec<RequestIdentity> {
        self.entries.iter().map(|(k, _)| (*k).clone()).collect()
    }

    /// Point-in-time copy of every entry. Order is not guaranteed.
    pub fn snapshot(&self) -> Vec<(RequestIdentity, Arc<StoredResponse>)> {
        self.entries
            .iter()
            .map(|(k, v)| ((*k).clone(), v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}
