//! Shared types used across the generation pipeline.
//!
//! Route descriptors are deserialized straight out of `site.toml`, so every
//! string field defaults to empty: a descriptor with a missing title still
//! renders (with a degraded head) rather than silently disappearing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of the application that gets a prerendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDescriptor {
    /// Canonical site-relative path, e.g. `/about`. Unique within a registry.
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Comma-separated keyword list, used verbatim.
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub changefreq: ChangeFrequency,
    #[serde(default = "default_priority")]
    pub priority: f32,
    /// JSON-LD payload. Opaque to the pipeline; `null` omits the block.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub structured_data: serde_json::Value,
}

fn default_priority() -> f32 {
    0.5
}

impl RouteDescriptor {
    /// A descriptor with only a path set.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: String::new(),
            description: String::new(),
            keywords: String::new(),
            changefreq: ChangeFrequency::default(),
            priority: default_priority(),
            structured_data: serde_json::Value::Null,
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Output location relative to the output directory, using the clean-URL
    /// convention: `/` → `index.html`, `/a/b` → `a/b/index.html`.
    pub fn output_file(&self) -> String {
        if self.is_root() {
            "index.html".to_string()
        } else {
            format!("{}/index.html", self.path.trim_start_matches('/'))
        }
    }
}

/// Sitemap `<changefreq>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset tags lifted from the framework's built entry document.
///
/// Created once per build and shared read-only by every page render. Tags are
/// stored verbatim (attribute order and URL form untouched).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetManifest {
    /// Complete `<link rel="stylesheet" ...>` tags, in document order.
    pub stylesheets: Vec<String>,
    /// Complete `<script src=...></script>` elements, in document order.
    pub scripts: Vec<String>,
}

impl AssetManifest {
    pub fn is_empty(&self) -> bool {
        self.stylesheets.is_empty() && self.scripts.is_empty()
    }

    /// Scripts loaded as ES modules. These are deferred by the browser, so
    /// anything inline placed before them still runs first.
    pub fn module_scripts(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .map(String::as_str)
            .filter(|tag| is_module_script(tag))
    }

    pub fn classic_scripts(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .map(String::as_str)
            .filter(|tag| !is_module_script(tag))
    }
}

fn is_module_script(tag: &str) -> bool {
    let open = tag.split('>').next().unwrap_or(tag);
    [r#"type="module""#, "type='module'"].iter().any(|attr| {
        open.match_indices(attr)
            .any(|(i, _)| open[..i].ends_with(char::is_whitespace))
    })
}

/// One `<url>` block of the sitemap, derived 1:1 from a route.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub location: String,
    pub last_modified: String,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}
