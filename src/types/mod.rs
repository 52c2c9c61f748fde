//! Public types for the Hoard API.

mod manifest;
mod request;
mod response;
mod strategy;

pub use manifest::{Manifest, MediaSet, ResolvedManifest};
pub use request::{Request, RequestIdentity};
pub use response::{Response, ResponseKind, ResponseSource, StoredResponse};
pub use strategy::{Classification, Strategy};
