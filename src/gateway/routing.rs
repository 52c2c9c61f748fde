//! URL-pattern routing of requests to fetch strategies.
//!
//! Rules, in priority order:
//!
//! 1. Non-`GET` methods and unsupported schemes bypass the cache.
//! 2. Volatile media and API paths → [`Strategy::NetworkFirst`].
//! 3. Bundled static assets and icons → [`Strategy::CacheFirst`].
//! 4. Everything else → [`Strategy::Default`].
//!
//! The order matters: media must never be served long-term stale, while
//! static assets should skip the round-trip once fetched. Patterns are
//! matched against the URL path; the first matching rule wins.

use regex::Regex;
use reqwest::{Method, Url};
use serde::Deserialize;

use crate::Result;
use crate::types::{Classification, Request, Strategy};

/// Pattern tables for the classifier.
///
/// Used by both the builder (programmatic) and hoardd config (TOML):
///
/// ```toml
/// [policy]
/// network_first = ['/videos/.*\.(mp4|webm|ogg)', '/api/']
/// cache_first = ['/assets/.*\.(js|css|woff2?|ttf|eot)', '/icon/.*\.(png|svg|ico)']
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Path patterns served network-first.
    #[serde(default = "default_network_first")]
    pub network_first: Vec<String>,
    /// Path patterns served cache-first.
    #[serde(default = "default_cache_first")]
    pub cache_first: Vec<String>,
    /// URL schemes eligible for caching. Anything else bypasses.
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            network_first: default_network_first(),
            cache_first: default_cache_first(),
            schemes: default_schemes(),
        }
    }
}

fn default_network_first() -> Vec<String> {
    vec![r"/videos/.*\.(mp4|webm|ogg)".into(), "/api/".into()]
}

fn default_cache_first() -> Vec<String> {
    vec![
        r"/assets/.*\.(js|css|woff2?|ttf|eot)".into(),
        r"/icon/.*\.(png|svg|ico)".into(),
    ]
}

fn default_schemes() -> Vec<String> {
    vec!["http".into(), "https".into()]
}

impl PolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a network-first pattern.
    pub fn network_first(mut self, pattern: impl Into<String>) -> Self {
        self.network_first.push(pattern.into());
        self
    }

    /// Add a cache-first pattern.
    pub fn cache_first(mut self, pattern: impl Into<String>) -> Self {
        self.cache_first.push(pattern.into());
        self
    }
}

/// A single `(pattern, strategy)` pair.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pattern: Regex,
    strategy: Strategy,
}

impl PolicyRule {
    pub fn new(pattern: &str, strategy: Strategy) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            strategy,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Maps a request to exactly one [`Classification`].
#[derive(Debug, Clone)]
pub struct PolicyClassifier {
    rules: Vec<PolicyRule>,
    schemes: Vec<String>,
}

impl PolicyClassifier {
    /// Compile the pattern tables. Network-first rules take priority.
    pub fn new(config: &PolicyConfig) -> Result<Self> {
        let network_first = config
            .network_first
            .iter()
            .map(|p| PolicyRule::new(p, Strategy::NetworkFirst));
        let cache_first = config
            .cache_first
            .iter()
            .map(|p| PolicyRule::new(p, Strategy::CacheFirst));
        let rules = network_first.chain(cache_first).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            schemes: config.schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
        })
    }

    /// Ordered rules; first match wins.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn classify(&self, method: &Method, url: &Url) -> Classification {
        if *method != Method::GET || !self.schemes.iter().any(|s| s == url.scheme()) {
            return Classification::Bypass;
        }
        let strategy = self
            .rules
            .iter()
            .find(|rule| rule.matches(url.path()))
            .map(PolicyRule::strategy)
            .unwrap_or(Strategy::Default);
        Classification::Cached(strategy)
    }

    pub fn classify_request(&self, request: &Request) -> Classification {
        self.classify(&request.method, &request.url)
    }
}
