//! Periodic age-based eviction.
//!
//! The scanner walks the current generation, computes each entry's age from
//! its capture timestamp and removes anything older than [`ENTRY_TTL`]. It
//! runs on its own timer, independent of request handling, and never takes a
//! lock that request handlers wait on: enumeration is a snapshot and each
//! removal is a per-entry compare-and-delete.
//!
//! A sweep that stops half way leaves a valid store; the next sweep picks up
//! whatever was missed.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::CacheService;
use crate::Result;
use crate::telemetry;

/// Maximum age of a stored entry. Fixed; not configurable per entry.
pub const ENTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Scheduling for the background sweep.
///
/// ```rust
/// # use hoard::cache::ScanConfig;
/// # use std::time::Duration;
/// let config = ScanConfig::new().interval(Duration::from_secs(600));
/// ```
/// Shortest period a spawned scanner ticks at.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Time between sweeps. Default: 1 hour.
    pub interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time between sweeps. [`ExpiryScanner::spawn`] raises
    /// anything shorter to [`MIN_SCAN_INTERVAL`].
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Summary of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub generation: String,
    pub scanned: usize,
    pub evicted: usize,
}

/// Background hygiene over the current generation.
pub struct ExpiryScanner {
    service: Arc<CacheService>,
    config: ScanConfig,
}

impl ExpiryScanner {
    pub fn new(service: Arc<CacheService>, config: ScanConfig) -> Self {
        Self { service, config }
    }

    /// Sweep using the wall clock.
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweep as if the current time were `now`.
    #[instrument(skip(self))]
    pub async fn sweep_at(&self, now: SystemTime) -> Result<SweepReport> {
        let generation = self.service.current().await?;
        let entries = generation.snapshot();
        let scanned = entries.len();
        let mut evicted = 0;

        for (key, entry) in entries {
            if entry.age(now) <= ENTRY_TTL {
                continue;
            }
            if generation
                .delete_if_captured_at(&key, entry.captured_at)
                .await
            {
                debug!(%key, "evicted expired entry");
                evicted += 1;
            }
        }

        metrics::counter!(telemetry::EVICTIONS_TOTAL).increment(evicted as u64);
        if evicted > 0 {
            info!(
                generation = generation.name(),
                scanned, evicted, "expiry sweep complete"
            );
        }

        Ok(SweepReport {
            generation: generation.name().to_string(),
            scanned,
            evicted,
        })
    }

    /// Run sweeps forever on the configured interval.
    ///
    /// Failures are logged and the next tick tries again. Abort the returned
    /// handle to stop.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.config.interval.max(MIN_SCAN_INTERVAL);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    warn!(error = %e, "expiry sweep failed");
                }
            }
        })
    }
}
