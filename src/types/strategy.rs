//! Fetch strategy tags produced by the policy classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a cacheable request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Live fetch first; stored entry on failure; synthesized unavailable otherwise.
    NetworkFirst,
    /// Stored entry first with a background refresh; live fetch on miss.
    CacheFirst,
    /// Live fetch first; stored entry on failure; offline fallback otherwise.
    Default,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheFirst => "cache_first",
            Strategy::Default => "default",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not cacheable: forwarded to the network untouched.
    Bypass,
    /// Cacheable, served by the given strategy.
    Cached(Strategy),
}

impl Classification {
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Classification::Cached(_))
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Classification::Bypass => None,
            Classification::Cached(s) => Some(*s),
        }
    }

    /// Metric label for this classification.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Bypass => "bypass",
            Classification::Cached(s) => s.as_str(),
        }
    }
}
