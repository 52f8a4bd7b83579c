//! # spa-prerender
//!
//! Build-time SEO prerendering for a single-page application deployed to a
//! static host. Runs after the framework's own build and turns `dist/` into
//! a crawlable site: one metadata-complete HTML document per registered
//! route, a sitemap, a not-found document that restores deep links, and the
//! host-support files from `public/`.
//!
//! # Pipeline
//!
//! ```text
//! FrameworkBuilt → AssetsResolved → PagesWritten → SitemapWritten → StaticFilesCopied → Done
//!
//! dist/index.html  ─┐
//! site.toml routes ─┼─▶ render each route ─▶ dist/<route>/index.html
//!                   │                       dist/404.html
//!                   │                       dist/sitemap.xml
//! public/*         ─┴─────────────────────▶ dist/robots.txt, CNAME, …
//! ```
//!
//! The pipeline is sequential and fails fast: the first step that fails
//! stops the build with a non-zero exit. A missing or tag-less entry
//! document is the one tolerated problem; pages then reference a fallback
//! asset manifest and the build logs a warning.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Route descriptors, asset manifest, sitemap entries |
//! | [`registry`] | Validated, ordered route registry |
//! | [`assets`] | Extracts stylesheet and script tags from the built entry document |
//! | [`render`] | `PageRenderer` trait and the Maud template renderer |
//! | `snapshot` | Headless Chrome renderer (feature `snapshot`) |
//! | [`redirect`] | Deep-link restoration: 404 encoder, bootstrap decoder, and a Rust model of both |
//! | [`writer`] | Clean-URL output writer and the output directory lock |
//! | [`sitemap`] | `sitemap.xml` generation |
//! | [`static_files`] | Copies fixed public files into the output root |
//! | [`pipeline`] | Build state machine, progress events, build report |
//! | [`config`] | `site.toml` loading, stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Render Strategies Behind One Trait
//!
//! Pages come from a [`render::PageRenderer`]. The template strategy leaves
//! the mount element empty and relies on the head and `<noscript>` content
//! for crawlers; the snapshot strategy fills the mount with what the real
//! application rendered in headless Chrome. Both produce the same head, so
//! switching strategy in `site.toml` changes nothing else.
//!
//! ## Script Order
//!
//! The deep-link decoder must rewrite the URL before the client router reads
//! it. Pages place it after the mount element and any classic scripts but
//! before the module entry script, and module scripts are deferred, so the
//! decoder always runs first.
//!
//! ## One Decode, No Reload
//!
//! The decoder percent-decodes the `redirect` parameter once and restores
//! it with `history.replaceState`. Only site-relative targets are accepted.
//! Malformed values are ignored and the router falls through to its own
//! not-found view.
//!
//! ## Deterministic Output
//!
//! Given the same registry, entry document and build time, every generated
//! file is byte-identical. JSON-LD keys keep their declaration order and the
//! build time can be pinned with `SOURCE_DATE_EPOCH`.

pub mod assets;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod redirect;
pub mod registry;
pub mod render;
pub mod sitemap;
#[cfg(feature = "snapshot")]
pub mod snapshot;
pub mod static_files;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
