//! Asset reference resolution.
//!
//! The framework build emits a root document whose `<link rel="stylesheet">`
//! and `<script src=...>` tags carry content-hashed file names. Every
//! prerendered page must embed exactly those tags, so they are lifted out of
//! the built document verbatim (attribute order, quoting and URL form are
//! left alone).
//!
//! A missing or tag-less entry document is not an error: the resolver falls
//! back to a conventional manifest so pages can still be produced from a
//! partial build. The caller reports the fallback as a warning.

use crate::config::FallbackAssets;
use crate::types::AssetManifest;
use maud::html;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").unwrap());
static STYLESHEET_REL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\srel\s*=\s*["']?stylesheet\b"#).unwrap());
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*?\ssrc\s*=[^>]*>\s*</script\s*>").unwrap()
});

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read entry document {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Why the fallback manifest was used instead of the built document's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The entry document does not exist.
    Missing(PathBuf),
    /// The entry document exists but references no stylesheets or scripts.
    NoAssetTags(PathBuf),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(path) => write!(f, "{} not found", path.display()),
            Self::NoAssetTags(path) => {
                write!(f, "{} references no stylesheets or scripts", path.display())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub manifest: AssetManifest,
    /// Set when `manifest` is the fallback rather than the extracted tags.
    pub fallback: Option<FallbackReason>,
}

/// Resolve the asset manifest from the built entry document.
///
/// Only an unreadable (as opposed to absent) document is an error.
pub fn resolve(entry_document: &Path, fallback: &FallbackAssets) -> Result<Resolution, AssetError> {
    let markup = match fs::read_to_string(entry_document) {
        Ok(markup) => markup,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Resolution {
                manifest: fallback_manifest(fallback),
                fallback: Some(FallbackReason::Missing(entry_document.to_path_buf())),
            });
        }
        Err(source) => {
            return Err(AssetError::Read {
                path: entry_document.to_path_buf(),
                source,
            });
        }
    };

    let manifest = extract_assets(&markup);
    if manifest.is_empty() {
        return Ok(Resolution {
            manifest: fallback_manifest(fallback),
            fallback: Some(FallbackReason::NoAssetTags(entry_document.to_path_buf())),
        });
    }

    Ok(Resolution {
        manifest,
        fallback: None,
    })
}

/// Pull stylesheet links and external scripts out of a document, in order.
pub fn extract_assets(markup: &str) -> AssetManifest {
    let markup = COMMENT.replace_all(markup, "");

    let stylesheets = LINK
        .find_iter(&markup)
        .map(|m| m.as_str())
        .filter(|tag| STYLESHEET_REL.is_match(tag))
        .map(str::to_string)
        .collect();

    let scripts = SCRIPT
        .find_iter(&markup)
        .map(|m| m.as_str().to_string())
        .collect();

    AssetManifest {
        stylesheets,
        scripts,
    }
}

/// The conventional single-stylesheet, single-module-script manifest.
pub fn fallback_manifest(fallback: &FallbackAssets) -> AssetManifest {
    let stylesheet = html! { link rel="stylesheet" href=(fallback.stylesheet); };
    let script = html! { script type="module" crossorigin src=(fallback.script) {} };
    AssetManifest {
        stylesheets: vec![stylesheet.into_string()],
        scripts: vec![script.into_string()],
    }
}
