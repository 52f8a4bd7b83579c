//! Deep-link support for static hosts.
//!
//! A static host answers every unmatched path with one generic `404.html`.
//! That document carries the **encoder**: it folds the requested path, query
//! and fragment into a single `redirect` query parameter and replaces the
//! current history entry with the application root. The application
//! bootstrap carries the **decoder**: before the client router starts it
//! reads `redirect`, decodes it, and restores the real URL with
//! `history.replaceState`.
//!
//! ```text
//! GET /spaces?query=abc          → host serves 404.html
//!   encoder: location.replace("/?redirect=%2Fspaces%3Fquery%3Dabc")
//! GET /?redirect=...              → host serves index.html
//!   decoder: history.replaceState(null, "", "/spaces?query=abc")
//!   router:  matches /spaces?query=abc
//! ```
//!
//! Both steps replace rather than push, so the history stack ends with a
//! single entry for the intended URL.
//!
//! ## Base path
//!
//! When the site is served below a prefix (`https://user.github.io/repo/`),
//! `path_segments_to_keep` says how many leading path segments belong to
//! that prefix. The encoder keeps them in the root URL and encodes only the
//! remainder; the decoder re-attaches the same prefix.
//!
//! The JavaScript is generated here, and [`encode`] / [`decode`] model the
//! same algorithm in Rust so its contract can be tested without a browser.

use crate::config::{RedirectConfig, SiteInfo};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Query parameter carrying the encoded location.
pub const REDIRECT_PARAM: &str = "redirect";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The parts of `window.location` the protocol touches.
///
/// `search` includes its leading `?` and `hash` its leading `#`; both are
/// empty when absent, exactly like the browser properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Location {
    /// Split a path-relative URL (`/a?b#c`) into its parts.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.find('#') {
            Some(i) => (&url[..i], &url[i..]),
            None => (url, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let pathname = if pathname.is_empty() { "/" } else { pathname };
        Self {
            pathname: pathname.to_string(),
            // A bare `?` or `#` reads back as empty in the browser.
            search: if search == "?" { String::new() } else { search.to_string() },
            hash: if hash == "#" { String::new() } else { hash.to_string() },
        }
    }

    /// Path, query and fragment joined back together.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// `encodeURIComponent`.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// `decodeURIComponent`, returning `None` where the browser would throw.
pub fn decode_component(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Leading path segments that make up the deployment base (no trailing `/`).
///
/// Empty at the domain root, so `{base}/` and `{base}{target}` always start
/// with exactly one `/`.
fn base_path(pathname: &str, keep: usize) -> String {
    pathname
        .split('/')
        .take(1 + keep)
        .collect::<Vec<_>>()
        .join("/")
        .trim_end_matches('/')
        .to_string()
}

fn has_redirect_param(search: &str) -> bool {
    raw_param(search, REDIRECT_PARAM).is_some()
}

/// Raw (still encoded) value of a query parameter.
fn raw_param<'a>(search: &'a str, name: &str) -> Option<&'a str> {
    search
        .strip_prefix('?')
        .unwrap_or(search)
        .split('&')
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
}

/// Encoder side: the URL the not-found document should replace itself with.
///
/// Returns `None` when the encoder must not act: the location is already the
/// application root, lies at or above the base path, or already carries a
/// `redirect` parameter. That keeps the encoding at most one layer deep when
/// the not-found page reloads.
pub fn encode(location: &Location, config: &RedirectConfig) -> Option<Location> {
    let keep = config.path_segments_to_keep;
    let base = base_path(&location.pathname, keep);
    let root = format!("{base}/");

    if location.pathname.split('/').count() <= 1 + keep
        || location.pathname == root
        || has_redirect_param(&location.search)
    {
        return None;
    }

    let remainder: Vec<&str> = location.pathname.split('/').skip(1 + keep).collect();
    let target = format!(
        "/{}{}{}",
        remainder.join("/"),
        location.search,
        location.hash
    );

    Some(Location {
        pathname: root,
        search: format!("?{REDIRECT_PARAM}={}", encode_component(&target)),
        hash: String::new(),
    })
}

/// Decoder side: the location the application should start on.
///
/// Identity when there is no `redirect` parameter, when its value is not
/// valid percent-encoding, or when it does not decode to a site-relative
/// path. In those cases the router sees the URL as-is.
pub fn decode(location: &Location, config: &RedirectConfig) -> Location {
    let Some(raw) = raw_param(&location.search, REDIRECT_PARAM) else {
        return location.clone();
    };
    let Some(target) = decode_component(raw) else {
        return location.clone();
    };
    if !is_site_relative(&target) {
        return location.clone();
    }

    let base = base_path(&location.pathname, config.path_segments_to_keep);
    Location::parse(&format!("{base}{target}"))
}

/// Starts with exactly one `/`, so it cannot name another origin.
fn is_site_relative(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

// ============================================================================
// Browser side
// ============================================================================

/// Script for the not-found document. Mirrors [`encode`].
pub fn encoder_script(config: &RedirectConfig) -> String {
    format!(
        r#"(function () {{
  var keep = {keep};
  var l = window.location;
  var segments = l.pathname.split('/');
  if (segments.length <= 1 + keep) return;
  var root = segments.slice(0, 1 + keep).join('/').replace(/\/+$/, '') + '/';
  if (l.pathname === root || /(?:^\?|&){param}=/.test(l.search)) return;
  var target = '/' + segments.slice(1 + keep).join('/') + l.search + l.hash;
  l.replace(root + '?{param}=' + encodeURIComponent(target));
}})();"#,
        keep = config.path_segments_to_keep,
        param = REDIRECT_PARAM,
    )
}

/// Script for the application bootstrap. Mirrors [`decode`].
///
/// Must run before the router reads the location.
pub fn decoder_script(config: &RedirectConfig) -> String {
    format!(
        r#"(function () {{
  var keep = {keep};
  var l = window.location;
  var m = /(?:^\?|&){param}=([^&]*)/.exec(l.search);
  if (!m) return;
  var target;
  try {{ target = decodeURIComponent(m[1]); }} catch (e) {{ return; }}
  if (target.charAt(0) !== '/' || target.charAt(1) === '/' || target.charAt(1) === '\\') return;
  var base = l.pathname.split('/').slice(0, 1 + keep).join('/').replace(/\/+$/, '');
  window.history.replaceState(null, '', base + target);
}})();"#,
        keep = config.path_segments_to_keep,
        param = REDIRECT_PARAM,
    )
}

/// The generic document a static host serves for unmatched paths.
pub fn render_not_found(site: &SiteInfo, config: &RedirectConfig) -> Markup {
    let title = if site.name.is_empty() {
        "Redirecting…".to_string()
    } else {
        format!("Redirecting… | {}", site.name)
    };

    html! {
        (DOCTYPE)
        html lang=(site.locale) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="robots" content="noindex";
                title { (title) }
                script { (PreEscaped(encoder_script(config))) }
            }
            body {
                p { "Redirecting to the main application…" }
            }
        }
    }
}
