//! Shared test utilities for the spa-prerender test suite.
//!
//! Provides a sample route registry (the directory site's seven public
//! pages), a framework-built entry document, and a temp-project builder that
//! lays out `dist/` and `public/` the way a finished framework build would.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = setup_project();
//! let config = project_config();
//! let registry = sample_registry();
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{SiteConfig, SiteInfo};
use crate::registry::Registry;
use crate::types::{ChangeFrequency, RouteDescriptor};

/// What `vite build` leaves in `dist/index.html`.
pub const VITE_ENTRY_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <link rel="icon" type="image/svg+xml" href="/favicon.svg" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Quiet Space Club</title>
    <script type="module" crossorigin src="/assets/index-Dk3f9a.js"></script>
    <link rel="modulepreload" crossorigin href="/assets/vendor-Q1w2e3.js">
    <link rel="stylesheet" crossorigin href="/assets/index-B7x2kQ.css">
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

/// 2026-10-19T12:00:00Z, the build time used by deterministic tests.
pub fn fixed_build_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn sample_site() -> SiteInfo {
    SiteInfo {
        domain: "https://index.quietspace.club".to_string(),
        name: "Quiet Space Club".to_string(),
        social_image: "https://index.quietspace.club/og-image.png".to_string(),
        theme_color: "#8B5CF6".to_string(),
        locale: "en".to_string(),
        author: "Quiet Space Club".to_string(),
        manifest: "/manifest.json".to_string(),
    }
}

fn route(
    path: &str,
    title: &str,
    changefreq: ChangeFrequency,
    priority: f32,
    schema_type: &str,
) -> RouteDescriptor {
    RouteDescriptor {
        path: path.to_string(),
        title: title.to_string(),
        description: format!("{title} - neuroinclusive workspaces."),
        keywords: "quiet workspace, neuroinclusive office".to_string(),
        changefreq,
        priority,
        structured_data: serde_json::json!({
            "@context": "https://schema.org",
            "@type": schema_type,
            "name": title,
        }),
    }
}

/// The seven public routes of the directory site, root first.
pub fn sample_routes() -> Vec<RouteDescriptor> {
    use ChangeFrequency::*;
    vec![
        route("/", "Quiet Workspaces", Daily, 1.0, "WebSite"),
        route("/spaces", "Browse Quiet Workspaces", Daily, 0.9, "CollectionPage"),
        route("/workspace-providers", "For Workspace Providers", Weekly, 0.8, "WebPage"),
        route("/about", "About Quiet Space Club", Monthly, 0.7, "Organization"),
        route("/how-it-works", "How It Works", Monthly, 0.7, "WebPage"),
        route("/resources", "Resources", Weekly, 0.6, "WebPage"),
        route("/contact", "Contact Us", Monthly, 0.5, "ContactPage"),
    ]
}

pub fn sample_registry() -> Registry {
    Registry::new(sample_routes(), &[]).unwrap()
}

/// A project directory with a built `dist/` and a `public/` holding a
/// couple of the configured static files.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dist = tmp.path().join("dist");
    fs::create_dir_all(dist.join("assets")).unwrap();
    fs::write(dist.join("index.html"), VITE_ENTRY_DOCUMENT).unwrap();
    fs::write(dist.join("assets/index-Dk3f9a.js"), "console.log('app');").unwrap();
    fs::write(dist.join("assets/index-B7x2kQ.css"), "body{margin:0}").unwrap();

    let public = tmp.path().join("public");
    fs::create_dir_all(&public).unwrap();
    fs::write(public.join("robots.txt"), "User-agent: *\nAllow: /\n").unwrap();
    fs::write(public.join("CNAME"), "index.quietspace.club\n").unwrap();
    tmp
}

/// Config for a project created by [`setup_project`].
pub fn project_config() -> SiteConfig {
    SiteConfig {
        site: sample_site(),
        routes: sample_routes(),
        ..SiteConfig::default()
    }
}

/// Relative paths of every file under `root`, sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files);
    files.sort();
    files
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap();
            files.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
