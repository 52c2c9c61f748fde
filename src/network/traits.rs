//! Network fetch capability.

use async_trait::async_trait;

use crate::Result;
use crate::types::{Request, Response};

/// Something that can send a request to the origin.
///
/// Implementations return `Ok` for any HTTP answer, whatever its status, and
/// `Err` only when no answer was obtained (connection refused, DNS failure,
/// reset, ...). Callers bound every call with their own timeout.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetcher name for logging.
    fn name(&self) -> &str;

    async fn fetch(&self, request: &Request) -> Result<Response>;
}
