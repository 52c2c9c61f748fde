//! Hoard - offline-capable response cache for a single origin
//!
//! Hoard sits between a client and an origin server. Each request is
//! classified by URL pattern into a fetch strategy (network-first,
//! cache-first or network-with-fallback), served from a versioned local
//! store when appropriate, and refreshed opportunistically. Deployments
//! install a new cache generation from a manifest and activate it, dropping
//! superseded generations; a background scanner evicts entries older than
//! 24 hours.
//!
//! # Example
//!
//! ```rust,no_run
//! use hoard::{CacheWorker, Hoard, Request};
//!
//! #[tokio::main]
//! async fn main() -> hoard::Result<()> {
//!     let cache = Hoard::builder()
//!         .origin("https://game.example")
//!         .version("v4")
//!         .build()?;
//!
//!     let outcome = cache.on_install().await?;
//!     if outcome.skip_waiting() {
//!         cache.on_activate().await?;
//!     }
//!     let _scanner = cache.spawn_expiry();
//!
//!     let response = cache
//!         .intercept(&Request::get("https://game.example/videos/red.webm")?)
//!         .await;
//!     println!("{} from {:?}", response.status, response.source);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gateway;
pub mod network;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheService, CacheStorage, ExpiryScanner, Generation, MemoryStorage};
pub use error::{HoardError, Result};
pub use gateway::{
    ActivateReport, EmbeddedCache, GenerationManager, Hoard, HoardBuilder, InstallOutcome,
    PolicyClassifier, PolicyConfig, RequestInterceptor, StrategyEngine,
};
pub use network::{FetchConfig, Fetcher, HttpFetcher};
pub use traits::CacheWorker;
pub use version::{DEFAULT_CACHE_VERSION, PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    Classification, Manifest, MediaSet, Request, RequestIdentity, Response, ResponseKind,
    ResponseSource, StoredResponse, Strategy,
};
