//! Configuration loading for hoardd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.hoard/config.toml` (user)
//! 3. `/etc/hoard/config.toml` (system)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::ScanConfig;
use crate::gateway::{DEFAULT_OFFLINE_DOCUMENT, DEFAULT_PREFIX, Hoard, HoardBuilder, PolicyConfig};
use crate::network::FetchConfig;
use crate::types::Manifest;
use crate::{DEFAULT_CACHE_VERSION, HoardError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub origin: OriginConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Install manifest. Omitting the section uses the built-in manifest.
    #[serde(default)]
    pub manifest: Manifest,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8741).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8741".to_string()
}

/// Upstream origin.
#[derive(Debug, Clone, Deserialize)]
pub struct OriginConfig {
    /// Base URL every request and manifest entry resolves against.
    pub base_url: String,
    /// Per-fetch timeout in seconds (default: 20).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Redirects followed before giving up (default: 5).
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_timeout() -> u64 {
    20
}

fn default_max_redirects() -> usize {
    5
}

/// Generation and expiry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Generation name prefix (default: `loza-games`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Deployment version tag (default: build-time `HOARD_CACHE_VERSION`).
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_offline_document")]
    pub offline_document: String,
    /// Seconds between expiry sweeps (default: 3600).
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default)]
    pub install_concurrency: Option<usize>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            version: default_version(),
            offline_document: default_offline_document(),
            scan_interval_secs: default_scan_interval(),
            install_concurrency: None,
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_version() -> String {
    DEFAULT_CACHE_VERSION.to_string()
}

fn default_offline_document() -> String {
    DEFAULT_OFFLINE_DOCUMENT.to_string()
}

fn default_scan_interval() -> u64 {
    3600
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.hoard/config.toml`
    /// 3. `/etc/hoard/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            HoardError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::parse(&content)
            .map_err(|e| HoardError::Configuration(format!("In config file {path:?}: {e}")))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HoardError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(HoardError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hoard").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/hoard/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(HoardError::Configuration(
            "No config file found. Create ~/.hoard/config.toml or /etc/hoard/config.toml"
                .to_string(),
        ))
    }

    /// A builder carrying every setting from this configuration.
    pub fn builder(&self) -> HoardBuilder {
        let mut fetch = FetchConfig::new()
            .timeout(Duration::from_secs(self.origin.timeout_secs))
            .max_redirects(self.origin.max_redirects);
        if let Some(ref agent) = self.origin.user_agent {
            fetch = fetch.user_agent(agent.clone());
        }

        let mut builder = Hoard::builder()
            .origin(self.origin.base_url.clone())
            .fetch_config(fetch)
            .prefix(self.cache.prefix.clone())
            .version(self.cache.version.clone())
            .offline_document(self.cache.offline_document.clone())
            .scan(ScanConfig::new().interval(Duration::from_secs(self.cache.scan_interval_secs)))
            .policy(self.policy.clone())
            .manifest(self.manifest.clone());
        if let Some(n) = self.cache.install_concurrency {
            builder = builder.install_concurrency(n);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [origin]
            base_url = "https://game.test"
        "#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:8741");
        assert_eq!(config.origin.timeout_secs, 20);
        assert_eq!(config.origin.max_redirects, 5);
        assert_eq!(config.cache.prefix, "loza-games");
        assert_eq!(config.cache.version, DEFAULT_CACHE_VERSION);
        assert_eq!(config.cache.offline_document, "/offline.html");
        assert_eq!(config.cache.scan_interval_secs, 3600);
        assert_eq!(config.manifest, Manifest::default());
        assert_eq!(config.policy.network_first.len(), 2);
    }

    #[test]
    fn zero_scan_interval_fails_build() {
        let toml = r#"
            [origin]
            base_url = "https://game.test"

            [cache]
            scan_interval_secs = 0
        "#;
        let err = Config::parse(toml).unwrap().builder().build().unwrap_err();
        assert!(matches!(err, HoardError::Configuration(_)));
    }

    #[test]
    fn origin_section_is_required() {
        let err = Config::parse("[server]\naddress = \"0.0.0.0:80\"\n").unwrap_err();
        assert!(matches!(err, HoardError::Configuration(_)));
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8080"

            [origin]
            base_url = "https://game.test"
            timeout_secs = 5
            user_agent = "loza-shell/2"

            [cache]
            prefix = "arcade"
            version = "v7"
            offline_document = "/offline/index.html"
            scan_interval_secs = 600
            install_concurrency = 2

            [policy]
            network_first = ['/live/']
            cache_first = ['\.wasm$']

            [manifest]
            shell = ["/", "/index.html"]

            [[manifest.media]]
            name = "intro"
            primary = "/videos/intro.webm"
        "#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        assert_eq!(config.origin.user_agent.as_deref(), Some("loza-shell/2"));
        assert_eq!(config.cache.version, "v7");
        assert_eq!(config.cache.install_concurrency, Some(2));
        assert_eq!(config.policy.network_first, vec!["/live/".to_string()]);
        assert_eq!(config.policy.schemes, vec!["http", "https"]);
        assert_eq!(config.manifest.shell.len(), 2);
        assert_eq!(config.manifest.media[0].poster, None);
        assert_eq!(config.manifest.len(), 3);
    }

    #[test]
    fn builder_applies_settings() {
        let toml = r#"
            [origin]
            base_url = "https://game.test"

            [cache]
            prefix = "arcade"
            version = "v7"
            offline_document = "/offline/index.html"

            [manifest]
            shell = ["/"]
        "#;
        let cache = Config::parse(toml).unwrap().builder().build().unwrap();
        assert_eq!(cache.lifecycle().generation_name(), "arcade-v7");
        assert_eq!(
            cache.lifecycle().manifest().shell,
            vec!["/".to_string(), "/offline/index.html".to_string()]
        );
    }

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[origin]\nbase_url = \"https://game.test\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.origin.base_url, "https://game.test");
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
