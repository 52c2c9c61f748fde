//! Version information with embedded git metadata.
//!
//! Two different versions live here: the crate's own build version, and the
//! cache deployment tag that names cache generations. They move independently;
//! the deployment tag only changes when the cached asset set changes.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown" if unavailable.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA (short) at build time, or "unknown" if unavailable.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Deployment tag used for generation names when none is configured.
///
/// Overridable at build time via `HOARD_CACHE_VERSION`.
pub const DEFAULT_CACHE_VERSION: &str = match option_env!("HOARD_CACHE_VERSION") {
    Some(tag) => tag,
    None => "v4",
};

/// Whether the working tree was dirty at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// Full version string: `{version}+{branch}.{sha}` or `{version}+{branch}.{sha}.dirty`.
///
/// Examples:
/// - `0.4.0+main.abc1234`
/// - `0.4.0+feature/foo.abc1234.dirty`
pub fn version_string() -> String {
    let dirty_suffix = if git_dirty() { ".dirty" } else { "" };
    format!(
        "{PKG_VERSION}+{GIT_BRANCH}.{}{dirty_suffix}",
        &GIT_SHA[..7.min(GIT_SHA.len())]
    )
}
