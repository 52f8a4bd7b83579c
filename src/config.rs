//! Project configuration module.
//!
//! Handles loading, validating, and layering `site.toml`. The file lives in
//! the project root (next to the framework's `dist/` and `public/`
//! directories) and is merged on top of stock defaults, so a project only
//! writes the keys it cares about plus its route table.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options except the route table are optional - defaults shown below
//!
//! static_files = ["robots.txt", ".htaccess", "CNAME", "google-site-verification.html",
//!                 "humans.txt", "manifest.json", "status.json", ".nojekyll"]
//!
//! [site]
//! domain = "https://example.com"   # Canonical origin, no trailing slash needed
//! name = ""                        # og:site_name, author fallback
//! social_image = ""                # Absolute URL of the preview image
//! theme_color = ""
//! locale = "en"                    # <html lang>
//! author = ""
//! manifest = "/manifest.json"      # Web manifest href ("" = omit)
//!
//! [paths]
//! dist_dir = "dist"                # Framework output, and ours
//! public_dir = "public"            # Source of static_files
//! entry_document = "index.html"    # Built root document, relative to dist_dir
//!
//! [render]
//! strategy = "template"            # or "snapshot" (needs the `snapshot` feature)
//! mount_id = "root"
//! snapshot_timeout_secs = 10
//!
//! [redirect]
//! path_segments_to_keep = 0        # Base-path segments kept by the 404 redirect
//!
//! [fallback_assets]
//! stylesheet = "/assets/index.css"
//! script = "/assets/index.js"
//!
//! [[routes]]
//! path = "/about"
//! title = "About"
//! description = "..."
//! keywords = "..."
//! changefreq = "monthly"
//! priority = 0.7
//! [routes.structured_data]
//! "@context" = "https://schema.org"
//! "@type" = "AboutPage"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::RouteDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file inside the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public files copied verbatim into the output root when present.
    pub static_files: Vec<String>,
    pub site: SiteInfo,
    pub paths: PathsConfig,
    pub render: RenderConfig,
    pub redirect: RedirectConfig,
    pub fallback_assets: FallbackAssets,
    /// The route registry, in output order.
    pub routes: Vec<RouteDescriptor>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            static_files: default_static_files(),
            site: SiteInfo::default(),
            paths: PathsConfig::default(),
            render: RenderConfig::default(),
            redirect: RedirectConfig::default(),
            fallback_assets: FallbackAssets::default(),
            routes: Vec::new(),
        }
    }
}

fn default_static_files() -> Vec<String> {
    [
        "robots.txt",
        ".htaccess",
        "CNAME",
        "google-site-verification.html",
        "humans.txt",
        "manifest.json",
        "status.json",
        ".nojekyll",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain = &self.site.domain;
        let host = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"));
        match host {
            Some(rest) if !rest.trim_matches('/').is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "site.domain must be an absolute http(s) URL".into(),
                ));
            }
        }
        if domain.contains(['?', '#']) {
            return Err(ConfigError::Validation(
                "site.domain must not contain a query string or fragment".into(),
            ));
        }

        let mount = &self.render.mount_id;
        if mount.is_empty() || !mount.chars().all(|c| c.is_ascii_alphanumeric() || "-_".contains(c))
        {
            return Err(ConfigError::Validation(
                "render.mount_id must be a non-empty identifier ([A-Za-z0-9_-])".into(),
            ));
        }
        if self.render.snapshot_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "render.snapshot_timeout_secs must be at least 1".into(),
            ));
        }
        if self.render.strategy == RenderStrategy::Snapshot && !cfg!(feature = "snapshot") {
            return Err(ConfigError::Validation(
                "render.strategy = \"snapshot\" requires a build with the `snapshot` feature"
                    .into(),
            ));
        }

        if self.paths.dist_dir.is_empty() || self.paths.entry_document.is_empty() {
            return Err(ConfigError::Validation(
                "paths.dist_dir and paths.entry_document must not be empty".into(),
            ));
        }

        for name in &self.static_files {
            let plain = !name.is_empty()
                && name != "."
                && name != ".."
                && !name.contains(['/', '\\']);
            if !plain {
                return Err(ConfigError::Validation(format!(
                    "static_files entry {name:?} must be a plain file name"
                )));
            }
        }
        Ok(())
    }
}

/// Site-wide identity shared by every page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Canonical origin, e.g. `https://index.quietspace.club`.
    pub domain: String,
    /// Site name (`og:site_name`, fallback author).
    pub name: String,
    /// Absolute URL of the social preview image. Empty omits the image tags.
    pub social_image: String,
    /// `theme-color` meta value. Empty omits the tag.
    pub theme_color: String,
    /// Document language (`<html lang>`).
    pub locale: String,
    /// `author` meta value. Empty falls back to `name`.
    pub author: String,
    /// Web manifest href. Empty omits the link.
    pub manifest: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            domain: "https://example.com".to_string(),
            name: String::new(),
            social_image: String::new(),
            theme_color: String::new(),
            locale: "en".to_string(),
            author: String::new(),
            manifest: "/manifest.json".to_string(),
        }
    }
}

impl SiteInfo {
    /// `{domain}{path}` with exactly one slash between them.
    pub fn canonical_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.domain.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory the framework built into; generated pages land here too.
    pub dist_dir: String,
    /// Directory holding the fixed public files.
    pub public_dir: String,
    /// Built root document, relative to `dist_dir`.
    pub entry_document: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dist_dir: "dist".to_string(),
            public_dir: "public".to_string(),
            entry_document: "index.html".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn dist(&self, root: &Path) -> PathBuf {
        root.join(&self.dist_dir)
    }

    pub fn public(&self, root: &Path) -> PathBuf {
        root.join(&self.public_dir)
    }

    pub fn entry_document_path(&self, root: &Path) -> PathBuf {
        self.dist(root).join(&self.entry_document)
    }
}

/// How page documents are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Metadata-complete shell with an empty mount element.
    #[default]
    Template,
    /// Same shell with the mount element filled from a headless-browser run.
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub strategy: RenderStrategy,
    /// `id` of the element the application mounts into.
    pub mount_id: String,
    /// Per-route wait for the application to render (snapshot strategy).
    pub snapshot_timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strategy: RenderStrategy::default(),
            mount_id: "root".to_string(),
            snapshot_timeout_secs: 10,
        }
    }
}

/// SPA-redirect settings shared by the encoder and decoder scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Leading path segments that belong to the deployment base path.
    /// `0` for a site at the domain root, `1` for `https://host/repo/`.
    pub path_segments_to_keep: usize,
}

/// Asset URLs used when the built entry document can't supply any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackAssets {
    pub stylesheet: String,
    pub script: String,
}

impl Default for FallbackAssets {
    fn default() -> Self {
        Self {
            stylesheet: "/assets/index.css".to_string(),
            script: "/assets/index.js".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely; the route
///   array is therefore always taken whole from the overlay.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Resolve the build timestamp.
///
/// Honors `SOURCE_DATE_EPOCH` (seconds since the Unix epoch) for
/// reproducible builds; otherwise the current time.
pub fn build_time(source_date_epoch: Option<&str>) -> Result<DateTime<Utc>, ConfigError> {
    let Some(raw) = source_date_epoch else {
        return Ok(Utc::now());
    };
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| {
            ConfigError::Validation(format!("SOURCE_DATE_EPOCH {raw:?} is not a Unix timestamp"))
        })
}

/// Returns a fully-commented starter `site.toml`.
///
/// Used by the `gen-config` CLI command. Declares the directory site's
/// seven public routes.
pub fn stock_config_toml() -> &'static str {
    r##"# spa-prerender configuration
# ===========================
# Everything except the route table is optional; values shown for the
# [paths], [render], [redirect] and [fallback_assets] sections are the
# defaults. Unknown keys cause an error.

# Public files copied from paths.public_dir into the output root when present.
static_files = [
    "robots.txt",
    ".htaccess",
    "CNAME",
    "google-site-verification.html",
    "humans.txt",
    "manifest.json",
    "status.json",
    ".nojekyll",
]

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
domain = "https://index.quietspace.club"
name = "Quiet Space Club"
social_image = "https://index.quietspace.club/og-image.png"
theme_color = "#8B5CF6"
locale = "en"
author = "Quiet Space Club"
manifest = "/manifest.json"

# ---------------------------------------------------------------------------
# Locations (relative to the directory holding this file)
# ---------------------------------------------------------------------------
[paths]
dist_dir = "dist"
public_dir = "public"
entry_document = "index.html"

# ---------------------------------------------------------------------------
# Page rendering
# ---------------------------------------------------------------------------
[render]
# "template": metadata-complete shell, the app renders client-side.
# "snapshot": additionally captures the rendered app markup with headless
#             Chrome (binary must be built with the `snapshot` feature).
strategy = "template"
mount_id = "root"
snapshot_timeout_secs = 10

# ---------------------------------------------------------------------------
# Static-host deep links (404.html → ?redirect=...)
# ---------------------------------------------------------------------------
[redirect]
# Leading path segments that belong to the deployment base path.
# 0 when served from the domain root, 1 for https://user.github.io/repo/.
path_segments_to_keep = 0

# ---------------------------------------------------------------------------
# Used when dist/index.html is missing or references no assets
# ---------------------------------------------------------------------------
[fallback_assets]
stylesheet = "/assets/index.css"
script = "/assets/index.js"

# ---------------------------------------------------------------------------
# Routes (written and listed in the sitemap in this order)
# ---------------------------------------------------------------------------
[[routes]]
path = "/"
title = "Quiet Workspaces | Neuroinclusive Office Spaces Near You"
description = "Find neuroinclusive workspaces designed for focus and productivity. Discover quiet offices, private booths, and accessible coworking spaces that support neurodivergent professionals."
keywords = "quiet workspace, neuroinclusive office, coworking space, neurodivergent workspace, focus rooms, private office, accessible workspace, quiet office near me"
changefreq = "daily"
priority = 1.0
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "WebSite"
name = "NeuroIndex - Quiet Space Club"
url = "https://index.quietspace.club"
inLanguage = "en-US"
[routes.structured_data.potentialAction]
"@type" = "SearchAction"
target = "https://index.quietspace.club/spaces?query={search_term_string}"
query-input = "required name=search_term_string"
[routes.structured_data.publisher]
"@type" = "Organization"
name = "Quiet Space Club"
url = "https://index.quietspace.club"
logo = "https://index.quietspace.club/og-image.png"

[[routes]]
path = "/spaces"
title = "Browse Quiet Workspaces | Filter by Location & Amenities"
description = "Browse our curated directory of quiet workspaces. Filter by location, amenities, and accessibility features to find your perfect neuroinclusive office space."
keywords = "browse workspaces, quiet office directory, neuroinclusive coworking, accessible office spaces, workspace finder, quiet rooms, focus spaces"
changefreq = "daily"
priority = 0.9
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "CollectionPage"
name = "Browse Quiet Workspaces"
url = "https://index.quietspace.club/spaces"

[[routes]]
path = "/workspace-providers"
title = "For Workspace Providers | Partner with Quiet Space Club"
description = "Are you a workspace provider interested in serving neurodivergent professionals? Learn how to partner with us and make your space more inclusive."
keywords = "workspace provider partnership, neuroinclusive coworking partner, quiet office listing, accessible workspace certification, inclusive office space"
changefreq = "weekly"
priority = 0.8
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "WebPage"
name = "For Workspace Providers"
url = "https://index.quietspace.club/workspace-providers"

[[routes]]
path = "/about"
title = "About Quiet Space Club | Neuroinclusive Workspace Directory"
description = "Learn about our mission to make workspaces more accessible for neurodivergent professionals. Discover how we're building a more inclusive future of work."
keywords = "about quiet space club, neuroinclusive mission, neurodivergent workspace advocacy, accessible office spaces, inclusive coworking"
changefreq = "monthly"
priority = 0.7
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "Organization"
name = "Quiet Space Club"
description = "Connecting neurodivergent individuals with inclusive, accessible workspaces"
url = "https://index.quietspace.club"
logo = "https://index.quietspace.club/og-image.png"

[[routes]]
path = "/how-it-works"
title = "How It Works | Find & Book Quiet Workspaces Easily"
description = "Learn how to find, book, and access neuroinclusive workspaces through our platform. Simple steps to secure your perfect quiet office space."
keywords = "how to book workspace, quiet office booking, neuroinclusive workspace guide, coworking booking process, workspace reservation"
changefreq = "monthly"
priority = 0.7
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "WebPage"
name = "How It Works"
url = "https://index.quietspace.club/how-it-works"

[[routes]]
path = "/resources"
title = "Resources | Guides for Neurodivergent Professionals"
description = "Access guides, tips, and resources for neurodivergent professionals navigating the modern workplace. Tools for creating inclusive work environments."
keywords = "neurodivergent resources, workplace accessibility guides, neuroinclusive tips, professional development neurodivergent, workplace accommodations"
changefreq = "weekly"
priority = 0.6
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "WebPage"
name = "Resources"
url = "https://index.quietspace.club/resources"

[[routes]]
path = "/contact"
title = "Contact Us | Get in Touch with Quiet Space Club"
description = "Have questions about our neuroinclusive workspaces? Get in touch with our team for support, partnerships, or to list your quiet office space."
keywords = "contact quiet space club, workspace partnerships, list your space, neuroinclusive support, quiet office questions"
changefreq = "monthly"
priority = 0.5
[routes.structured_data]
"@context" = "https://schema.org"
"@type" = "ContactPage"
name = "Contact Quiet Space Club"
url = "https://index.quietspace.club/contact"
"##
}
