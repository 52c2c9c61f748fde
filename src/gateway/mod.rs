//! Cache gateway: classification, strategies, lifecycle, interception

mod builder;
mod embedded;
pub mod interceptor;
pub mod lifecycle;
pub mod routing;
pub mod strategy;

pub use builder::{DEFAULT_OFFLINE_DOCUMENT, DEFAULT_PREFIX, Hoard, HoardBuilder};
pub use embedded::EmbeddedCache;
pub use interceptor::RequestInterceptor;
pub use lifecycle::{
    ActivateReport, GenerationManager, InstallOutcome, generation_name, version_of,
};
pub use routing::{PolicyClassifier, PolicyConfig, PolicyRule};
pub use strategy::StrategyEngine;
