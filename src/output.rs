//! CLI output formatting for the build and check commands.
//!
//! # Route-First Display
//!
//! Routes are shown by their positional index and title, with the output
//! file they produce on the same line and the URL path, description and
//! sitemap hints as indented context. Assets are printed as the exact tags
//! the pages will carry, so a broken reference is visible in the log.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! ==> Resolving assets
//!     <link rel="stylesheet" crossorigin href="/assets/index-B7x2kQ.css">
//!     <script type="module" crossorigin src="/assets/index-Dk3f9a.js"></script>
//! ==> Writing pages
//!     / → index.html
//!     /about → about/index.html
//!     404 → 404.html
//! ==> Writing sitemap
//!     sitemap.xml (7 urls)
//! ==> Copying static files
//!     robots.txt
//!     CNAME
//!     skipped: .htaccess, humans.txt
//! ==> Releasing output lock
//! ==> Build complete: 7 pages, 7 sitemap urls, 2 static files → dist (template)
//! ```
//!
//! ## Check
//!
//! ```text
//! Routes
//! 001 Quiet Workspaces → index.html
//!     Path: /
//!     Description: Neuroinclusive workspaces for focused work.
//!     Sitemap: daily, 1.0
//!
//! Assets
//!     <script type="module" crossorigin src="/assets/index-Dk3f9a.js"></script>
//!
//! Static files
//!     robots.txt
//!     CNAME (absent)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure. Warnings go to stderr through [`print_warning`].

use crate::assets::Resolution;
use crate::pipeline::{BuildEvent, BuildReport, Stage};
use crate::registry::Registry;
use crate::types::AssetManifest;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn step_heading(stage: Stage) -> String {
    let step = stage.step();
    let mut chars = step.chars();
    match chars.next() {
        Some(first) => format!("==> {}{}", first.to_uppercase(), chars.as_str()),
        None => "==>".to_string(),
    }
}

fn asset_lines(manifest: &AssetManifest) -> Vec<String> {
    manifest
        .stylesheets
        .iter()
        .chain(&manifest.scripts)
        .map(|tag| format!("    {tag}"))
        .collect()
}

// ============================================================================
// Build
// ============================================================================

/// Stdout lines for one build event.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Step(stage) => vec![step_heading(*stage)],
        BuildEvent::AssetsResolved { manifest, fallback } => {
            let mut lines = asset_lines(manifest);
            if fallback.is_some() {
                lines.push("    (fallback manifest)".to_string());
            }
            lines
        }
        BuildEvent::PageWritten { path, output } => vec![format!("    {path} → {output}")],
        BuildEvent::NotFoundWritten { output } => vec![format!("    404 → {output}")],
        BuildEvent::SitemapWritten { output, entries } => {
            vec![format!("    {output} ({entries} urls)")]
        }
        BuildEvent::StaticFilesCopied { copied, skipped } => {
            let mut lines: Vec<String> = copied.iter().map(|name| format!("    {name}")).collect();
            if !skipped.is_empty() {
                lines.push(format!("    skipped: {}", skipped.join(", ")));
            }
            lines
        }
    }
}

/// Stderr warning carried by a build event, if any.
pub fn build_warning(event: &BuildEvent) -> Option<String> {
    match event {
        BuildEvent::AssetsResolved {
            fallback: Some(reason),
            ..
        } => Some(format!("{reason}; using fallback asset manifest")),
        _ => None,
    }
}

pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
    if let Some(warning) = build_warning(event) {
        print_warning(&warning);
    }
}

pub fn format_build_summary(report: &BuildReport) -> Vec<String> {
    vec![format!(
        "==> Build complete: {} pages, {} sitemap urls, {} static files → {} ({})",
        report.pages,
        report.sitemap_entries,
        report.static_files,
        report.out_dir.display(),
        report.renderer,
    )]
}

pub fn print_build_summary(report: &BuildReport) {
    for line in format_build_summary(report) {
        println!("{}", line);
    }
}

pub fn print_warning(message: &str) {
    eprintln!("warning: {}", message);
}

// ============================================================================
// Check
// ============================================================================

/// Route inventory, resolved assets and static file presence.
///
/// `static_files` pairs each configured name with whether it exists in the
/// public directory.
pub fn format_check_output(
    registry: &Registry,
    resolution: &Resolution,
    static_files: &[(String, bool)],
) -> Vec<String> {
    let mut lines = vec!["Routes".to_string()];

    for (i, route) in registry.routes().iter().enumerate() {
        let title = if route.title.is_empty() {
            "(untitled)"
        } else {
            route.title.as_str()
        };
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            title,
            route.output_file()
        ));
        lines.push(format!("    Path: {}", route.path));
        if !route.description.is_empty() {
            lines.push(format!(
                "    Description: {}",
                truncate_desc(&route.description, 60)
            ));
        }
        lines.push(format!(
            "    Sitemap: {}, {:.1}",
            route.changefreq, route.priority
        ));
    }

    lines.push(String::new());
    lines.push("Assets".to_string());
    lines.extend(asset_lines(&resolution.manifest));
    if let Some(reason) = &resolution.fallback {
        lines.push(format!("    (fallback: {reason})"));
    }

    if !static_files.is_empty() {
        lines.push(String::new());
        lines.push("Static files".to_string());
        for (name, present) in static_files {
            if *present {
                lines.push(format!("    {name}"));
            } else {
                lines.push(format!("    {name} (absent)"));
            }
        }
    }

    lines
}

pub fn print_check_output(
    registry: &Registry,
    resolution: &Resolution,
    static_files: &[(String, bool)],
) {
    for line in format_check_output(registry, resolution, static_files) {
        println!("{}", line);
    }
}
