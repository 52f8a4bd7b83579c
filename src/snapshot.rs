//! Headless-browser render strategy.
//!
//! Boots the built application in headless Chrome, once per route, and
//! captures what it renders into the mount element. The captured markup is
//! placed inside the same document [`render_page`] produces, so crawlers get
//! real content while the head stays identical to the template strategy.
//!
//! The application is served from a loopback HTTP server rooted at the dist
//! directory (module scripts refuse to load from `file://`). Any request that
//! doesn't name an existing file gets the original entry document, the way a
//! development server answers client-side routes. The entry document is read
//! into memory up front because the build overwrites `dist/index.html` with
//! the root route's page.

use crate::render::{PageRenderer, RenderContext, RenderError, render_page};
use crate::types::RouteDescriptor;
use headless_chrome::{Browser, LaunchOptions};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

pub struct SnapshotRenderer {
    browser: Browser,
    server: Arc<Server>,
    worker: Option<JoinHandle<()>>,
    origin: String,
    timeout: Duration,
}

impl SnapshotRenderer {
    /// Start the loopback server and launch Chrome.
    pub fn new(
        dist_dir: &Path,
        entry_document: &Path,
        timeout: Duration,
    ) -> Result<Self, RenderError> {
        let entry = std::fs::read(entry_document).map_err(|e| {
            setup_error(format!("reading {}: {e}", entry_document.display()))
        })?;

        let server = Server::http("127.0.0.1:0").map_err(|e| setup_error(e.to_string()))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| setup_error("server has no TCP address".into()))?;
        let server = Arc::new(server);

        let worker = {
            let server = Arc::clone(&server);
            let root = dist_dir.to_path_buf();
            std::thread::spawn(move || serve(&server, &root, &entry))
        };

        let browser = Browser::new(LaunchOptions {
            window_size: Some((1280, 800)),
            ..Default::default()
        })
        .map_err(|e| setup_error(format!("launching Chrome: {e}")))?;

        Ok(Self {
            browser,
            server,
            worker: Some(worker),
            origin: format!("http://{addr}"),
            timeout,
        })
    }

    fn capture(&self, route: &RouteDescriptor, mount_id: &str) -> anyhow::Result<String> {
        let tab = self.browser.new_tab()?;
        tab.set_default_timeout(self.timeout);

        let result = (|| -> anyhow::Result<String> {
            tab.navigate_to(&format!("{}{}", self.origin, route.path))?
                .wait_until_navigated()?;
            tab.wait_for_element(&format!("#{mount_id} > *"))?;
            let markup = tab
                .evaluate(
                    &format!("document.getElementById('{mount_id}').innerHTML"),
                    false,
                )?
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            Ok(markup)
        })();

        let _ = tab.close(true);
        result
    }
}

impl PageRenderer for SnapshotRenderer {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn render(
        &self,
        route: &RouteDescriptor,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError> {
        let markup = self
            .capture(route, ctx.mount_id)
            .map_err(|e| RenderError::Snapshot {
                path: route.path.clone(),
                message: format!("{e:#}"),
            })?;
        Ok(render_page(route, ctx, Some(&markup)).into_string())
    }
}

impl Drop for SnapshotRenderer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn setup_error(message: String) -> RenderError {
    RenderError::SnapshotSetup(message)
}

fn serve(server: &Server, root: &Path, entry: &[u8]) {
    for request in server.incoming_requests() {
        let (body, content_type) = match resolve_request(root, request.url()) {
            Some(file) => match std::fs::read(&file) {
                Ok(body) => (body, content_type(&file)),
                Err(_) => (entry.to_vec(), "text/html; charset=utf-8"),
            },
            None => (entry.to_vec(), "text/html; charset=utf-8"),
        };
        let mut response = Response::from_data(body);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
            response = response.with_header(header);
        }
        let _ = request.respond(response);
    }
}

/// Static file for a request URL, or `None` when the entry document should
/// be served instead.
fn resolve_request(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("/");
    let path = percent_decode_str(path).decode_utf8().ok()?;
    let rel = path.trim_start_matches('/');
    if rel.is_empty() || rel == "index.html" {
        return None;
    }
    if rel.split('/').any(|s| s == ".." || s == "." || s.contains('\\')) {
        return None;
    }
    let file = root.join(rel);
    file.is_file().then_some(file)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "webmanifest" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
