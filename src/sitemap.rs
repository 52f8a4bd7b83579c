//! Sitemap generation.
//!
//! One `<url>` per registered route, in registry order:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2026-10-19</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! Every entry shares the build date as `lastmod`, so the document is fully
//! determined by the registry, the domain and the build time.

use crate::config::SiteInfo;
use crate::registry::Registry;
use crate::types::SitemapEntry;
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

pub const SITEMAP_FILENAME: &str = "sitemap.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub fn sitemap_entries(
    registry: &Registry,
    site: &SiteInfo,
    build_time: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let last_modified = build_time.format("%Y-%m-%d").to_string();
    registry
        .routes()
        .iter()
        .map(|route| SitemapEntry {
            location: site.canonical_url(&route.path),
            last_modified: last_modified.clone(),
            change_frequency: route.changefreq,
            priority: route.priority,
        })
        .collect()
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 160);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for entry in entries {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape(entry.location.as_str()));
        xml.push_str("</loc>\n    <lastmod>");
        xml.push_str(&entry.last_modified);
        xml.push_str("</lastmod>\n    <changefreq>");
        xml.push_str(entry.change_frequency.as_str());
        xml.push_str("</changefreq>\n    <priority>");
        xml.push_str(&format_priority(entry.priority));
        xml.push_str("</priority>\n  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Shortest form that reads back as the configured value, always with a
/// fractional part (`1.0`, `0.75`).
fn format_priority(priority: f32) -> String {
    if priority.fract() == 0.0 {
        format!("{priority:.1}")
    } else {
        priority.to_string()
    }
}
