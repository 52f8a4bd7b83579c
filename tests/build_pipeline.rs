//! End-to-end tests that drive the compiled binary against a temp project.
//!
//! The project uses the stock `site.toml` printed by `gen-config`, a built
//! `dist/` shaped like a Vite build and a `public/` holding some of the
//! configured static files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ENTRY_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <title>Quiet Space Club</title>
    <script type="module" crossorigin src="/assets/index-Dk3f9a.js"></script>
    <link rel="stylesheet" crossorigin href="/assets/index-B7x2kQ.css">
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

/// 2026-10-19T12:00:00Z
const BUILD_EPOCH: &str = "1792411200";

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spa-prerender"));
    cmd.env("SOURCE_DATE_EPOCH", BUILD_EPOCH);
    cmd
}

fn run(root: &Path, args: &[&str]) -> Output {
    bin()
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run spa-prerender")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let config = bin().arg("gen-config").output().unwrap();
    assert!(config.status.success());
    fs::write(root.join("site.toml"), &config.stdout).unwrap();

    fs::create_dir_all(root.join("dist/assets")).unwrap();
    fs::write(root.join("dist/index.html"), ENTRY_DOCUMENT).unwrap();
    fs::write(root.join("dist/assets/index-Dk3f9a.js"), "").unwrap();
    fs::write(root.join("dist/assets/index-B7x2kQ.css"), "").unwrap();

    fs::create_dir_all(root.join("public")).unwrap();
    fs::write(root.join("public/robots.txt"), "User-agent: *\nAllow: /\n").unwrap();
    fs::write(root.join("public/CNAME"), "index.quietspace.club\n").unwrap();
    fs::write(root.join("public/.nojekyll"), "").unwrap();
    tmp
}

fn page_files(dist: &Path) -> Vec<String> {
    let mut pages = Vec::new();
    if dist.join("index.html").is_file() {
        pages.push("index.html".to_string());
    }
    for entry in fs::read_dir(dist).unwrap() {
        let path = entry.unwrap().path();
        if path.join("index.html").is_file() {
            let name = path.file_name().unwrap().to_string_lossy();
            pages.push(format!("{name}/index.html"));
        }
    }
    pages.sort();
    pages
}

#[test]
fn build_writes_every_route_sitemap_and_static_files() {
    let project = setup_project();

    let output = run(project.path(), &["build"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let dist = project.path().join("dist");
    assert_eq!(
        page_files(&dist),
        [
            "about/index.html",
            "contact/index.html",
            "how-it-works/index.html",
            "index.html",
            "resources/index.html",
            "spaces/index.html",
            "workspace-providers/index.html",
        ]
    );

    let sitemap = fs::read_to_string(dist.join("sitemap.xml")).unwrap();
    assert_eq!(sitemap.matches("<url>").count(), 7);
    assert_eq!(sitemap.matches("<lastmod>2026-10-19</lastmod>").count(), 7);
    assert!(sitemap.contains("<loc>https://index.quietspace.club/</loc>"));
    assert!(sitemap.contains("<loc>https://index.quietspace.club/contact</loc>"));

    assert!(dist.join("404.html").is_file());
    assert!(dist.join("robots.txt").is_file());
    assert!(dist.join("CNAME").is_file());
    assert!(dist.join(".nojekyll").is_file());
    assert!(!dist.join(".htaccess").exists());

    let out = stdout(&output);
    assert!(out.contains("==> Writing pages"));
    assert!(out.contains("    /about → about/index.html"));
    assert!(out.contains("==> Build complete: 7 pages"));
}

#[test]
fn generated_page_carries_route_metadata() {
    let project = setup_project();
    assert!(run(project.path(), &["build"]).status.success());

    let html = fs::read_to_string(project.path().join("dist/spaces/index.html")).unwrap();
    assert!(html.contains("<title>Browse Quiet Workspaces | Filter by Location &amp; Amenities</title>"));
    assert!(html.contains(r#"<link rel="canonical" href="https://index.quietspace.club/spaces">"#));
    assert!(html.contains(r#"<script type="application/ld+json">"#));
    assert!(html.contains(r#""@type": "CollectionPage""#));
    assert!(html.contains(r#"<script type="module" crossorigin src="/assets/index-Dk3f9a.js"></script>"#));
    assert!(html.contains("<noscript>"));

    let not_found = fs::read_to_string(project.path().join("dist/404.html")).unwrap();
    assert!(not_found.contains("noindex"));
    assert!(not_found.contains("redirect="));
}

#[test]
fn repeated_builds_are_identical() {
    let project = setup_project();
    assert!(run(project.path(), &["build"]).status.success());
    let first = fs::read(project.path().join("dist/about/index.html")).unwrap();
    let first_sitemap = fs::read(project.path().join("dist/sitemap.xml")).unwrap();

    fs::write(project.path().join("dist/index.html"), ENTRY_DOCUMENT).unwrap();
    assert!(run(project.path(), &["build"]).status.success());

    assert_eq!(first, fs::read(project.path().join("dist/about/index.html")).unwrap());
    assert_eq!(first_sitemap, fs::read(project.path().join("dist/sitemap.xml")).unwrap());
}

#[test]
fn missing_entry_document_warns_and_succeeds() {
    let project = setup_project();
    fs::remove_file(project.path().join("dist/index.html")).unwrap();

    let output = run(project.path(), &["build"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("warning:"));
    assert!(stderr(&output).contains("fallback"));
    assert_eq!(page_files(&project.path().join("dist")).len(), 7);
    let root = fs::read_to_string(project.path().join("dist/index.html")).unwrap();
    assert!(root.contains("/assets/index.js"));
}

#[test]
fn write_failure_exits_non_zero_and_names_the_step() {
    let project = setup_project();
    fs::write(project.path().join("dist/about"), "blocks the about/ directory").unwrap();

    let output = run(project.path(), &["build"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.starts_with("error: build failed while writing pages"), "{err}");
    assert!(!project.path().join("dist/sitemap.xml").exists());
}

#[test]
fn invalid_route_table_fails_before_writing() {
    let project = setup_project();
    let config = fs::read_to_string(project.path().join("site.toml")).unwrap();
    fs::write(
        project.path().join("site.toml"),
        config.replace(r#"path = "/contact""#, r#"path = "/about""#),
    )
    .unwrap();

    let output = run(project.path(), &["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("/about"));
    let root = fs::read_to_string(project.path().join("dist/index.html")).unwrap();
    assert_eq!(root, ENTRY_DOCUMENT);
}

#[test]
fn check_lists_routes_without_writing() {
    let project = setup_project();

    let output = run(project.path(), &["check"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("001 Quiet Workspaces | Neuroinclusive Office Spaces Near You → index.html"));
    assert!(out.contains("    CNAME"));
    assert!(out.contains("    .htaccess (absent)"));
    assert!(out.contains("==> Site is valid"));
    assert!(!project.path().join("dist/sitemap.xml").exists());
}

#[test]
fn render_prints_one_document() {
    let project = setup_project();

    let output = run(project.path(), &["render", "/about"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let html = stdout(&output);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<link rel="canonical" href="https://index.quietspace.club/about">"#));
    assert!(!project.path().join("dist/about").exists());
}

#[test]
fn render_unknown_route_fails() {
    let project = setup_project();

    let output = run(project.path(), &["render", "/nowhere"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no route registered"));
}
