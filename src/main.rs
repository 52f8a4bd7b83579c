use clap::{Parser, Subcommand};
use spa_prerender::registry::Registry;
use spa_prerender::render::{PageRenderer, RenderContext};
use spa_prerender::{assets, config, output, pipeline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("BUILD_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("BUILD_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "spa-prerender")]
#[command(about = "Prerender SEO pages and a sitemap for a built single-page application")]
#[command(long_about = "\
Prerender SEO pages and a sitemap for a built single-page application

Run after the framework build. Every route declared in site.toml gets its own
metadata-complete HTML document so crawlers and link previews see real
titles, descriptions and structured data, and static hosts serve clean URLs.

Project layout:

  site.toml                        # Site metadata and route table
  public/                          # robots.txt, CNAME, … copied when present
  dist/                            # Framework build output (input and output)
  ├── index.html                   # Entry document → replaced by the / page
  └── assets/                      # Hashed bundles referenced by every page

Generated into dist/:

  index.html, <route>/index.html   # One document per route
  404.html                         # Restores deep links on static hosts
  sitemap.xml                      # One <url> per route

Set SOURCE_DATE_EPOCH to pin the build time for reproducible output.
Run 'spa-prerender gen-config' to generate a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root containing site.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate pages, 404.html, sitemap and static files into the dist directory
    Build,
    /// Validate config and routes and show what a build would produce
    Check,
    /// Print one route's document to stdout
    Render {
        /// Route path, e.g. /about
        path: String,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build => {
            let (site, registry) = load(&cli.root)?;
            let build_time = source_build_time()?;
            let renderer = pipeline::renderer_for(&site, &cli.root)?;

            println!(
                "==> Prerendering {} routes into {}",
                registry.len(),
                site.paths.dist(&cli.root).display()
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_build_event(&event);
                }
            });
            let result = pipeline::build(
                &cli.root,
                &site,
                &registry,
                renderer.as_ref(),
                build_time,
                Some(tx),
            );
            let _ = printer.join();
            output::print_build_summary(&result?);
        }
        Command::Check => {
            let (site, registry) = load(&cli.root)?;
            println!("==> Checking {}", cli.root.display());
            let resolution = assets::resolve(
                &site.paths.entry_document_path(&cli.root),
                &site.fallback_assets,
            )?;
            let public = site.paths.public(&cli.root);
            let statics: Vec<(String, bool)> = site
                .static_files
                .iter()
                .map(|name| (name.clone(), public.join(name).is_file()))
                .collect();
            output::print_check_output(&registry, &resolution, &statics);
            if let Some(reason) = &resolution.fallback {
                output::print_warning(&format!("{reason}; pages would use the fallback assets"));
            }
            println!("==> Site is valid");
        }
        Command::Render { path } => {
            let (site, registry) = load(&cli.root)?;
            let route = registry
                .get(&path)
                .ok_or_else(|| format!("no route registered for {path:?}"))?;
            let resolution = assets::resolve(
                &site.paths.entry_document_path(&cli.root),
                &site.fallback_assets,
            )?;
            if let Some(reason) = &resolution.fallback {
                output::print_warning(&format!("{reason}; using fallback asset manifest"));
            }
            let renderer = pipeline::renderer_for(&site, &cli.root)?;
            let ctx = RenderContext {
                site: &site.site,
                assets: &resolution.manifest,
                redirect: &site.redirect,
                mount_id: &site.render.mount_id,
                build_time: source_build_time()?,
            };
            print!("{}", renderer.render(route, &ctx)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `site.toml` and validate its route table.
fn load(root: &Path) -> Result<(config::SiteConfig, Registry), Box<dyn std::error::Error>> {
    let site = config::load_config(root)?;
    let registry = Registry::new(site.routes.clone(), &site.static_files)?;
    Ok((site, registry))
}

fn source_build_time() -> Result<chrono::DateTime<chrono::Utc>, config::ConfigError> {
    let epoch = std::env::var("SOURCE_DATE_EPOCH").ok();
    config::build_time(epoch.as_deref())
}
