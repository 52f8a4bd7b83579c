//! Build orchestration.
//!
//! A strictly sequential state machine:
//!
//! ```text
//! FrameworkBuilt → AssetsResolved → PagesWritten → SitemapWritten → StaticFilesCopied → Done
//! ```
//!
//! Each transition is one blocking step. The first failing step aborts the
//! build; nothing after it runs and the error names the step. The asset
//! fallback is not a failure: it is reported as a warning and the build
//! carries on with the fallback manifest.
//!
//! The output directory is locked for the whole run (see
//! [`OutputLock`](crate::writer::OutputLock)). Progress is streamed as
//! [`BuildEvent`]s to an optional channel so the caller decides how to
//! present it.

use crate::assets::{self, AssetError, FallbackReason};
use crate::config::{RenderStrategy, SiteConfig};
use crate::redirect;
use crate::registry::Registry;
use crate::render::{PageRenderer, RenderContext, RenderError, TemplateRenderer};
use crate::sitemap::{self, SITEMAP_FILENAME};
use crate::static_files::{self, CopyError};
use crate::types::AssetManifest;
use crate::writer::{OutputLock, OutputWriter, WriteError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const NOT_FOUND_FILENAME: &str = "404.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FrameworkBuilt,
    AssetsResolved,
    PagesWritten,
    SitemapWritten,
    StaticFilesCopied,
    Done,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::FrameworkBuilt => Some(Stage::AssetsResolved),
            Stage::AssetsResolved => Some(Stage::PagesWritten),
            Stage::PagesWritten => Some(Stage::SitemapWritten),
            Stage::SitemapWritten => Some(Stage::StaticFilesCopied),
            Stage::StaticFilesCopied => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// The step that leaves this state.
    pub fn step(self) -> &'static str {
        match self {
            Stage::FrameworkBuilt => "resolving assets",
            Stage::AssetsResolved => "writing pages",
            Stage::PagesWritten => "writing sitemap",
            Stage::SitemapWritten => "copying static files",
            Stage::StaticFilesCopied => "releasing output lock",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FrameworkBuilt => "framework built",
            Stage::AssetsResolved => "assets resolved",
            Stage::PagesWritten => "pages written",
            Stage::SitemapWritten => "sitemap written",
            Stage::StaticFilesCopied => "static files copied",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Copy(#[from] CopyError),
}

/// A failed build: the last state reached and what went wrong leaving it.
#[derive(Error, Debug)]
#[error("build failed while {}: {source}", .stage.step())]
pub struct BuildError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl BuildError {
    fn at(stage: Stage) -> impl FnOnce(StageError) -> BuildError {
        move |source| BuildError { stage, source }
    }
}

/// Progress reported while a build runs.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A step is starting from the given state.
    Step(Stage),
    AssetsResolved {
        manifest: AssetManifest,
        fallback: Option<FallbackReason>,
    },
    PageWritten {
        path: String,
        output: String,
    },
    NotFoundWritten {
        output: String,
    },
    SitemapWritten {
        output: String,
        entries: usize,
    },
    StaticFilesCopied {
        copied: Vec<String>,
        skipped: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Always [`Stage::Done`] for a successful build.
    pub stage: Stage,
    pub out_dir: PathBuf,
    pub renderer: &'static str,
    pub pages: usize,
    pub sitemap_entries: usize,
    pub static_files: usize,
    pub used_fallback: bool,
}

/// Pick the configured render strategy.
#[cfg_attr(not(feature = "snapshot"), allow(unused_variables))]
pub fn renderer_for(config: &SiteConfig, root: &Path) -> Result<Box<dyn PageRenderer>, RenderError> {
    match config.render.strategy {
        RenderStrategy::Template => Ok(Box::new(TemplateRenderer)),
        #[cfg(feature = "snapshot")]
        RenderStrategy::Snapshot => Ok(Box::new(crate::snapshot::SnapshotRenderer::new(
            &config.paths.dist(root),
            &config.paths.entry_document_path(root),
            std::time::Duration::from_secs(config.render.snapshot_timeout_secs),
        )?)),
        #[cfg(not(feature = "snapshot"))]
        RenderStrategy::Snapshot => Err(RenderError::SnapshotSetup(
            "this binary was built without the `snapshot` feature".to_string(),
        )),
    }
}

/// Run the whole build for the project at `root`.
pub fn build(
    root: &Path,
    config: &SiteConfig,
    registry: &Registry,
    renderer: &dyn PageRenderer,
    build_time: DateTime<Utc>,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildReport, BuildError> {
    let emit = |event: BuildEvent| {
        if let Some(tx) = &events {
            let _ = tx.send(event);
        }
    };
    let out_dir = config.paths.dist(root);
    let writer = OutputWriter::new(&out_dir);

    // FrameworkBuilt → AssetsResolved
    let mut stage = Stage::FrameworkBuilt;
    emit(BuildEvent::Step(stage));
    let lock = OutputLock::acquire(&out_dir)
        .map_err(StageError::from)
        .map_err(BuildError::at(stage))?;
    let resolution = assets::resolve(
        &config.paths.entry_document_path(root),
        &config.fallback_assets,
    )
    .map_err(StageError::from)
    .map_err(BuildError::at(stage))?;
    let used_fallback = resolution.fallback.is_some();
    emit(BuildEvent::AssetsResolved {
        manifest: resolution.manifest.clone(),
        fallback: resolution.fallback.clone(),
    });
    stage = advance(stage);

    // AssetsResolved → PagesWritten
    emit(BuildEvent::Step(stage));
    let ctx = RenderContext {
        site: &config.site,
        assets: &resolution.manifest,
        redirect: &config.redirect,
        mount_id: &config.render.mount_id,
        build_time,
    };
    for route in registry.routes() {
        let html = renderer
            .render(route, &ctx)
            .map_err(StageError::from)
            .map_err(BuildError::at(stage))?;
        writer
            .write_route(route, &html)
            .map_err(StageError::from)
            .map_err(BuildError::at(stage))?;
        emit(BuildEvent::PageWritten {
            path: route.path.clone(),
            output: route.output_file(),
        });
    }
    let not_found = redirect::render_not_found(&config.site, &config.redirect);
    writer
        .write_file(NOT_FOUND_FILENAME, &not_found.into_string())
        .map_err(StageError::from)
        .map_err(BuildError::at(stage))?;
    emit(BuildEvent::NotFoundWritten {
        output: NOT_FOUND_FILENAME.to_string(),
    });
    stage = advance(stage);

    // PagesWritten → SitemapWritten
    emit(BuildEvent::Step(stage));
    let entries = sitemap::sitemap_entries(registry, &config.site, build_time);
    writer
        .write_file(SITEMAP_FILENAME, &sitemap::render_sitemap(&entries))
        .map_err(StageError::from)
        .map_err(BuildError::at(stage))?;
    emit(BuildEvent::SitemapWritten {
        output: SITEMAP_FILENAME.to_string(),
        entries: entries.len(),
    });
    stage = advance(stage);

    // SitemapWritten → StaticFilesCopied
    emit(BuildEvent::Step(stage));
    let copied = static_files::copy_static_files(
        &config.paths.public(root),
        &out_dir,
        &config.static_files,
    )
    .map_err(StageError::from)
    .map_err(BuildError::at(stage))?;
    let static_count = copied.copied.len();
    emit(BuildEvent::StaticFilesCopied {
        copied: copied.copied,
        skipped: copied.skipped,
    });
    stage = advance(stage);

    // StaticFilesCopied → Done
    emit(BuildEvent::Step(stage));
    lock.release()
        .map_err(StageError::from)
        .map_err(BuildError::at(stage))?;
    stage = advance(stage);

    Ok(BuildReport {
        stage,
        out_dir,
        renderer: renderer.name(),
        pages: registry.len(),
        sitemap_entries: entries.len(),
        static_files: static_count,
        used_fallback,
    })
}

fn advance(stage: Stage) -> Stage {
    stage.next().unwrap_or(Stage::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::RouteDescriptor;
    use crate::writer::LOCK_FILENAME;
    use std::fs;
    use std::sync::mpsc;

    fn run(root: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
        let registry = Registry::new(config.routes.clone(), &config.static_files).unwrap();
        build(
            root,
            config,
            &registry,
            &TemplateRenderer,
            fixed_build_time(),
            None,
        )
    }

    struct FailingRenderer(&'static str);

    impl PageRenderer for FailingRenderer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn render(
            &self,
            route: &RouteDescriptor,
            ctx: &RenderContext<'_>,
        ) -> Result<String, RenderError> {
            if route.path == self.0 {
                return Err(RenderError::Snapshot {
                    path: route.path.clone(),
                    message: "mount never populated".into(),
                });
            }
            TemplateRenderer.render(route, ctx)
        }
    }

    #[test]
    fn stages_advance_in_order() {
        let mut stage = Stage::FrameworkBuilt;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            [
                Stage::FrameworkBuilt,
                Stage::AssetsResolved,
                Stage::PagesWritten,
                Stage::SitemapWritten,
                Stage::StaticFilesCopied,
                Stage::Done,
            ]
        );
    }

    #[test]
    fn seven_routes_build_seven_pages_and_sitemap() {
        let project = setup_project();
        let config = project_config();

        let report = run(project.path(), &config).unwrap();

        assert_eq!(report.stage, Stage::Done);
        assert!(!project.path().join("dist").join(LOCK_FILENAME).exists());
        assert_eq!(report.pages, 7);
        assert_eq!(report.sitemap_entries, 7);
        assert!(!report.used_fallback);

        let dist = project.path().join("dist");
        let pages: Vec<_> = list_files(&dist)
            .into_iter()
            .filter(|f| f.ends_with("index.html"))
            .collect();
        assert_eq!(pages.len(), 7);
        assert_eq!(pages.iter().filter(|p| !p.contains('/')).count(), 1);
        for dir in [
            "spaces",
            "workspace-providers",
            "about",
            "how-it-works",
            "resources",
            "contact",
        ] {
            assert!(pages.contains(&format!("{dir}/index.html")), "{dir}");
        }

        let sitemap = fs::read_to_string(dist.join("sitemap.xml")).unwrap();
        assert_eq!(sitemap.matches("<url>").count(), 7);
        assert_eq!(sitemap.matches("<lastmod>2026-10-19</lastmod>").count(), 7);

        assert!(dist.join("404.html").is_file());
        assert!(dist.join("robots.txt").is_file());
        assert!(dist.join("CNAME").is_file());
        assert!(!dist.join(LOCK_FILENAME).exists());
    }

    #[test]
    fn pages_reference_built_assets() {
        let project = setup_project();
        run(project.path(), &project_config()).unwrap();

        let about = fs::read_to_string(project.path().join("dist/about/index.html")).unwrap();
        assert!(about.contains("/assets/index-Dk3f9a.js"));
        assert!(about.contains("/assets/index-B7x2kQ.css"));
        assert!(about.contains(r#"<link rel="canonical" href="https://index.quietspace.club/about">"#));
    }

    #[test]
    fn missing_entry_document_falls_back_and_succeeds() {
        let project = setup_project();
        fs::remove_file(project.path().join("dist/index.html")).unwrap();
        let config = project_config();

        let report = run(project.path(), &config).unwrap();

        assert!(report.used_fallback);
        assert_eq!(report.pages, 7);
        let root = fs::read_to_string(project.path().join("dist/index.html")).unwrap();
        assert!(root.starts_with("<!DOCTYPE html>"));
        assert!(root.contains(&config.fallback_assets.script));
        assert!(root.contains(&config.fallback_assets.stylesheet));
    }

    #[test]
    fn missing_dist_directory_still_builds() {
        let project = setup_project();
        fs::remove_dir_all(project.path().join("dist")).unwrap();

        let report = run(project.path(), &project_config()).unwrap();

        assert!(report.used_fallback);
        assert!(project.path().join("dist/contact/index.html").is_file());
    }

    #[test]
    fn write_failure_aborts_remaining_steps() {
        let project = setup_project();
        fs::write(project.path().join("dist/about"), "a file, not a directory").unwrap();

        let err = run(project.path(), &project_config()).unwrap_err();

        assert_eq!(err.stage, Stage::AssetsResolved);
        assert!(matches!(err.source, StageError::Write(_)));
        assert!(err.to_string().starts_with("build failed while writing pages"));
        let dist = project.path().join("dist");
        assert!(!dist.join("sitemap.xml").exists());
        assert!(!dist.join("robots.txt").exists());
        assert!(!dist.join(LOCK_FILENAME).exists());
    }

    #[test]
    fn render_failure_aborts_build() {
        let project = setup_project();
        let config = project_config();
        let registry = sample_registry();

        let err = build(
            project.path(),
            &config,
            &registry,
            &FailingRenderer("/how-it-works"),
            fixed_build_time(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err.source, StageError::Render(_)));
        assert!(err.to_string().contains("/how-it-works"));
        let dist = project.path().join("dist");
        assert!(dist.join("about/index.html").is_file());
        assert!(!dist.join("resources").exists());
        assert!(!dist.join("sitemap.xml").exists());
    }

    #[test]
    fn held_lock_refuses_build() {
        let project = setup_project();
        let lock = project.path().join("dist").join(LOCK_FILENAME);
        fs::write(&lock, "4242\n").unwrap();

        let err = run(project.path(), &project_config()).unwrap_err();

        assert_eq!(err.stage, Stage::FrameworkBuilt);
        assert!(matches!(err.source, StageError::Write(WriteError::Locked(_))));
        // Another build's lock is left alone and nothing was generated.
        assert!(lock.is_file());
        let root = fs::read_to_string(project.path().join("dist/index.html")).unwrap();
        assert_eq!(root, VITE_ENTRY_DOCUMENT);
    }

    #[test]
    fn events_follow_stage_order() {
        let project = setup_project();
        let config = project_config();
        let (tx, rx) = mpsc::channel();

        build(
            project.path(),
            &config,
            &sample_registry(),
            &TemplateRenderer,
            fixed_build_time(),
            Some(tx),
        )
        .unwrap();

        let events: Vec<_> = rx.iter().collect();
        let steps: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BuildEvent::Step(stage) => Some(*stage),
                _ => None,
            })
            .collect();
        assert_eq!(
            steps,
            [
                Stage::FrameworkBuilt,
                Stage::AssetsResolved,
                Stage::PagesWritten,
                Stage::SitemapWritten,
                Stage::StaticFilesCopied,
            ]
        );
        let pages: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BuildEvent::PageWritten { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(pages.first(), Some(&"/"));
        assert_eq!(pages.len(), 7);
        assert!(events.iter().any(|e| matches!(
            e,
            BuildEvent::StaticFilesCopied { copied, .. } if copied.len() == 2
        )));
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let project = setup_project();
        let config = project_config();
        run(project.path(), &config).unwrap();
        let first = fs::read_to_string(project.path().join("dist/spaces/index.html")).unwrap();

        // The root page now replaces the entry document; restore it as a
        // fresh framework build would.
        fs::write(project.path().join("dist/index.html"), VITE_ENTRY_DOCUMENT).unwrap();
        run(project.path(), &config).unwrap();
        let second = fs::read_to_string(project.path().join("dist/spaces/index.html")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_strategy_without_feature_is_rejected() {
        if cfg!(feature = "snapshot") {
            return;
        }
        let mut config = project_config();
        config.render.strategy = RenderStrategy::Snapshot;
        let project = setup_project();

        let err = renderer_for(&config, project.path()).err().unwrap();
        assert!(err.to_string().contains("snapshot"));
    }
}
