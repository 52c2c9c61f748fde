//! hoardd: HTTP proxy hosting an [`EmbeddedCache`](crate::EmbeddedCache).
//!
//! - `config`: TOML configuration and its mapping onto the builder
//! - `proxy`: axum fallback router that hands every request to a
//!   [`CacheWorker`](crate::CacheWorker)

pub mod config;
pub mod proxy;

pub use config::Config;
pub use proxy::{ProxyState, router, serve};
