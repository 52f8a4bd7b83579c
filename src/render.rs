//! Page document rendering.
//!
//! Every route gets one self-contained HTML document: full SEO head (title,
//! description, canonical link, Open Graph and Twitter cards, JSON-LD), a
//! `<noscript>` fallback for crawlers that don't execute scripts, the
//! application mount element, the built asset tags, and the SPA-redirect
//! decoder.
//!
//! ## Strategies
//!
//! [`PageRenderer`] is the seam between "what a page looks like" and "how
//! its body is obtained". [`TemplateRenderer`] leaves the mount element
//! empty and lets the application render client-side; the snapshot
//! strategy (`snapshot` module, behind the feature of the same name) fills
//! it with markup captured from a headless browser. Both produce the same
//! head through [`render_page`].
//!
//! ## Body order
//!
//! ```text
//! <noscript>…</noscript>
//! <div id="root"></div>
//! stylesheet links
//! classic (non-module) scripts
//! decoder script            ← rewrites history before any router runs
//! module scripts            ← deferred, so they always run after the decoder
//! ```

use crate::config::{RedirectConfig, SiteInfo};
use crate::redirect;
use crate::types::{AssetManifest, RouteDescriptor};
use chrono::{DateTime, Datelike, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use thiserror::Error;

const ROBOTS: &str = "index, follow, max-snippet:-1, max-image-preview:large, max-video-preview:-1";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("browser snapshot of {path} failed: {message}")]
    Snapshot { path: String, message: String },
    #[error("could not start snapshot renderer: {0}")]
    SnapshotSetup(String),
}

/// Build-wide inputs shared by every page render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub site: &'a SiteInfo,
    pub assets: &'a AssetManifest,
    pub redirect: &'a RedirectConfig,
    pub mount_id: &'a str,
    pub build_time: DateTime<Utc>,
}

/// Produces the complete document for one route.
pub trait PageRenderer {
    /// Short strategy name for progress output.
    fn name(&self) -> &'static str;

    fn render(
        &self,
        route: &RouteDescriptor,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError>;
}

/// Metadata-complete shell; the application renders into an empty mount.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl PageRenderer for TemplateRenderer {
    fn name(&self) -> &'static str {
        "template"
    }

    fn render(
        &self,
        route: &RouteDescriptor,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError> {
        Ok(render_page(route, ctx, None).into_string())
    }
}

/// Render a route's document.
///
/// Total over any descriptor: an empty title or description is rendered as
/// an empty string, empty keywords drop the keywords tag, and a `null`
/// structured-data payload drops the JSON-LD block. `prerendered` is trusted
/// markup placed inside the mount element.
pub fn render_page(
    route: &RouteDescriptor,
    ctx: &RenderContext<'_>,
    prerendered: Option<&str>,
) -> Markup {
    let site = ctx.site;
    let canonical = site.canonical_url(&route.path);
    let title = route.title.as_str();
    let description = route.description.as_str();
    let author = if site.author.is_empty() {
        site.name.as_str()
    } else {
        site.author.as_str()
    };
    let twitter_card = if site.social_image.is_empty() {
        "summary"
    } else {
        "summary_large_image"
    };

    html! {
        (DOCTYPE)
        html lang=(site.locale) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(description);
                @if !route.keywords.is_empty() {
                    meta name="keywords" content=(route.keywords);
                }
                link rel="canonical" href=(canonical);

                meta property="og:type" content="website";
                meta property="og:url" content=(canonical);
                meta property="og:title" content=(title);
                meta property="og:description" content=(description);
                @if !site.social_image.is_empty() {
                    meta property="og:image" content=(site.social_image);
                }
                @if !site.name.is_empty() {
                    meta property="og:site_name" content=(site.name);
                }

                meta name="twitter:card" content=(twitter_card);
                meta name="twitter:url" content=(canonical);
                meta name="twitter:title" content=(title);
                meta name="twitter:description" content=(description);
                @if !site.social_image.is_empty() {
                    meta name="twitter:image" content=(site.social_image);
                }

                @if !site.theme_color.is_empty() {
                    meta name="theme-color" content=(site.theme_color);
                }
                @if !site.manifest.is_empty() {
                    link rel="manifest" href=(site.manifest);
                }
                meta name="robots" content=(ROBOTS);
                meta name="googlebot" content="index, follow";
                @if !author.is_empty() {
                    meta name="author" content=(author);
                    meta name="copyright" content={
                        "© " (ctx.build_time.year()) " " (author) ". All rights reserved."
                    };
                }

                @if !route.structured_data.is_null() {
                    script type="application/ld+json" {
                        (PreEscaped(json_ld(&route.structured_data)))
                    }
                }
            }
            body {
                noscript {
                    div.noscript-fallback {
                        h1 { (title) }
                        @if !description.is_empty() {
                            p { (description) }
                        }
                        p {
                            "Please enable JavaScript to view the full interactive experience at "
                            a href=(canonical) { (canonical) }
                        }
                    }
                }
                div id=(ctx.mount_id) {
                    @if let Some(markup) = prerendered {
                        (PreEscaped(markup))
                    }
                }
                @for tag in &ctx.assets.stylesheets {
                    (PreEscaped(tag))
                }
                @for tag in ctx.assets.classic_scripts() {
                    (PreEscaped(tag))
                }
                script { (PreEscaped(redirect::decoder_script(ctx.redirect))) }
                @for tag in ctx.assets.module_scripts() {
                    (PreEscaped(tag))
                }
            }
        }
    }
}

/// Pretty JSON safe to embed in a `<script>` element.
///
/// `<`, `>` and `&` can only occur inside JSON strings, where their `\u`
/// escapes are equivalent, so `</script>` can never close the element early.
fn json_ld(value: &serde_json::Value) -> String {
    format!("{value:#}")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
