//! Response store and cache generations.
//!
//! - [`CacheStorage`] / [`MemoryStorage`]: catalog of named generations.
//! - [`Generation`]: one isolated set of `RequestIdentity → StoredResponse`
//!   entries.
//! - [`CacheService`]: explicitly constructed handle shared by the
//!   interceptor, the generation manager and the expiry scanner. Tracks which
//!   generation is current and which are installed but not yet active.
//! - [`ExpiryScanner`]: periodic age-based eviction in the current generation.

pub mod expiry;
pub mod generation;
pub mod storage;

pub use expiry::{ENTRY_TTL, ExpiryScanner, MIN_SCAN_INTERVAL, ScanConfig, SweepReport};
pub use generation::Generation;
pub use storage::{CacheStorage, MemoryStorage};

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, watch};

use crate::{HoardError, Result};

/// Shared handle to the response store and the current generation pointer.
///
/// Only the current generation is read or written by request handling.
/// Activation swaps the pointer; every handler resolves the current
/// generation per request, and receivers from [`subscribe`](Self::subscribe)
/// are notified immediately.
///
/// Every cache instance over one store must share one service: install and
/// activate are serialized through it, across deployment versions.
pub struct CacheService {
    storage: Arc<dyn CacheStorage>,
    current: watch::Sender<Option<String>>,
    lifecycle: Mutex<Lifecycle>,
}

/// Install/activate bookkeeping, guarded by the service-wide lifecycle lock.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pending: BTreeSet<String>,
}

impl Lifecycle {
    pub(crate) fn is_pending(&self, name: &str) -> bool {
        self.pending.contains(name)
    }

    pub(crate) fn mark_pending(&mut self, name: &str) {
        self.pending.insert(name.to_string());
    }

    /// Clear `name`, returning whether it was pending.
    pub(crate) fn take_pending(&mut self, name: &str) -> bool {
        self.pending.remove(name)
    }
}

impl CacheService {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            storage,
            current,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Service backed by a fresh [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Name of the current generation, if one has been activated.
    pub fn current_name(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Open the current generation.
    ///
    /// Fails with [`HoardError::NoActiveGeneration`] before the first
    /// activation and with [`HoardError::StoreUnavailable`] when the backend
    /// cannot produce it.
    pub async fn current(&self) -> Result<Arc<Generation>> {
        let name = self.current_name().ok_or(HoardError::NoActiveGeneration)?;
        self.storage.lookup(&name).await?.ok_or_else(|| {
            HoardError::StoreUnavailable(format!("current generation {name} is missing"))
        })
    }

    /// Watch the current generation name. The receiver sees every promotion.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }

    /// Generations installed and awaiting activation, by name.
    pub async fn pending(&self) -> Vec<String> {
        self.lifecycle.lock().await.pending.iter().cloned().collect()
    }

    /// Make `name` the current generation for all handlers.
    pub(crate) fn promote(&self, name: &str) {
        self.current.send_replace(Some(name.to_string()));
    }

    /// Hold the lifecycle lock. At most one install or activation runs per
    /// service at a time.
    pub(crate) async fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().await
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("current", &self.current_name())
            .finish()
    }
}
