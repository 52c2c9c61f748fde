//! Pre-fetch manifest for a fresh cache generation.
//!
//! The manifest has two partitions. The *shell* (HTML, CSS, JS, icons) blocks
//! install: every entry must be fetched or the generation is discarded. The
//! *media* partition (posters and video clips) is fetched at install time too,
//! but failures there are logged and skipped.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{HoardError, Result};

/// One playable clip and its companion assets.
///
/// Any of the three URLs may be absent; a clip without a poster or without
/// the broadly-compatible fallback encoding is still valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSet {
    pub name: String,
    #[serde(default)]
    pub poster: Option<String>,
    /// Primary encoding (WebM).
    #[serde(default)]
    pub primary: Option<String>,
    /// Broadly-compatible fallback encoding (MP4).
    #[serde(default)]
    pub fallback: Option<String>,
}

impl MediaSet {
    /// The conventional `/videos/{name}` layout: poster, WebM, optimized MP4.
    pub fn conventional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            poster: Some(format!("/videos/{name}-poster.jpg")),
            primary: Some(format!("/videos/{name}.webm")),
            fallback: Some(format!("/videos/{name}_optimized.mp4")),
        }
    }

    /// Present URLs in poster, primary, fallback order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        [&self.poster, &self.primary, &self.fallback]
            .into_iter()
            .filter_map(|u| u.as_deref())
    }

    /// Playable sources, preferred encoding first.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        [&self.primary, &self.fallback]
            .into_iter()
            .filter_map(|u| u.as_deref())
    }
}

/// Ordered list of URLs pre-populated into a new generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Static application shell. Every entry must succeed for install to succeed.
    #[serde(default)]
    pub shell: Vec<String>,
    /// Media clips. Fetched best-effort.
    #[serde(default)]
    pub media: Vec<MediaSet>,
}

/// A manifest with every entry resolved against the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub shell: Vec<Url>,
    pub media: Vec<Url>,
}

const DEFAULT_SHELL: &[&str] = &[
    "/",
    "/index.html",
    "/assets/index-CHKBdGBU.css",
    "/assets/index-GrIU3NQ6.js",
    "/manifest.json",
    "/register-sw.js",
    "/icon/icon-192x192.png",
    "/icon/icon-512x512.png",
    "/icon/apple-touch-icon.png",
    "/icon/favicon.ico",
];

const DEFAULT_CLIPS: &[&str] = &[
    "intro", "black", "blue", "green", "pink", "purple", "red", "white", "yellow", "closing",
];

impl Default for Manifest {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.iter().map(|s| s.to_string()).collect(),
            media: DEFAULT_CLIPS
                .iter()
                .map(|name| MediaSet::conventional(name))
                .collect(),
        }
    }
}

impl Manifest {
    /// An empty manifest.
    pub fn empty() -> Self {
        Self {
            shell: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Append a shell entry.
    pub fn shell(mut self, url: impl Into<String>) -> Self {
        self.shell.push(url.into());
        self
    }

    /// Append a media set.
    pub fn media(mut self, set: MediaSet) -> Self {
        self.media.push(set);
        self
    }

    /// Total number of URLs across both partitions.
    pub fn len(&self) -> usize {
        self.shell.len() + self.media.iter().map(|m| m.urls().count()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve root-relative or absolute entries against `base`.
    ///
    /// Duplicates within a partition are dropped, keeping first occurrence.
    pub fn resolve(&self, base: &Url) -> Result<ResolvedManifest> {
        let shell = resolve_all(base, self.shell.iter().map(String::as_str))?;
        let media = resolve_all(base, self.media.iter().flat_map(MediaSet::urls))?;
        Ok(ResolvedManifest { shell, media })
    }
}

fn resolve_all<'a>(base: &Url, entries: impl Iterator<Item = &'a str>) -> Result<Vec<Url>> {
    let mut out: Vec<Url> = Vec::new();
    for entry in entries {
        let url = base.join(entry).map_err(|e| {
            HoardError::InvalidInput(format!("invalid manifest entry {entry:?}: {e}"))
        })?;
        if !out.contains(&url) {
            out.push(url);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_matches_deployed_assets() {
        let manifest = Manifest::default();
        assert_eq!(manifest.shell.len(), 10);
        assert_eq!(manifest.media.len(), 10);
        // 10 shell + 10 clips * (poster + webm + mp4)
        assert_eq!(manifest.len(), 40);
        assert_eq!(manifest.shell[0], "/");
    }

    #[test]
    fn conventional_media_layout() {
        let red = MediaSet::conventional("red");
        let urls: Vec<&str> = red.urls().collect();
        assert_eq!(
            urls,
            vec![
                "/videos/red-poster.jpg",
                "/videos/red.webm",
                "/videos/red_optimized.mp4"
            ]
        );
        let sources: Vec<&str> = red.sources().collect();
        assert_eq!(sources, vec!["/videos/red.webm", "/videos/red_optimized.mp4"]);
    }

    #[test]
    fn media_set_with_missing_encodings() {
        let clip = MediaSet {
            name: "intro".into(),
            poster: None,
            primary: None,
            fallback: Some("/videos/intro_optimized.mp4".into()),
        };
        assert_eq!(clip.urls().count(), 1);
        assert_eq!(clip.sources().next(), Some("/videos/intro_optimized.mp4"));
    }

    #[test]
    fn resolve_joins_root_relative_entries() {
        let base = Url::parse("https://game.test/").unwrap();
        let manifest = Manifest::empty()
            .shell("/")
            .shell("/index.html")
            .shell("https://cdn.test/font.woff2");
        let resolved = manifest.resolve(&base).unwrap();
        assert_eq!(resolved.shell[0].as_str(), "https://game.test/");
        assert_eq!(resolved.shell[1].as_str(), "https://game.test/index.html");
        assert_eq!(resolved.shell[2].as_str(), "https://cdn.test/font.woff2");
        assert!(resolved.media.is_empty());
    }

    #[test]
    fn resolve_drops_duplicates() {
        let base = Url::parse("https://game.test/").unwrap();
        let manifest = Manifest::empty().shell("/index.html").shell("index.html");
        assert_eq!(manifest.resolve(&base).unwrap().shell.len(), 1);
    }

    #[test]
    fn deserializes_from_toml_shape() {
        let json = r#"{
            "shell": ["/", "/index.html"],
            "media": [{"name": "red", "primary": "/videos/red.webm"}]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.shell.len(), 2);
        assert_eq!(manifest.media[0].poster, None);
        assert_eq!(manifest.len(), 3);
    }
}
