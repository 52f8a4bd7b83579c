//! Writes rendered documents into the output directory.
//!
//! Each route maps to `<path>/index.html` under the output root so static
//! hosts serve it at the clean URL; the root route maps to `index.html`
//! itself, replacing the framework's entry document. Existing files are
//! overwritten unconditionally.
//!
//! Concurrent builds into one directory are refused via [`OutputLock`], an
//! advisory lock file created exclusively and removed when dropped.

use crate::types::RouteDescriptor;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LOCK_FILENAME: &str = ".spa-prerender.lock";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "output directory is locked by another build ({}); remove it if no build is running",
        .0.display()
    )]
    Locked(PathBuf),
}

impl WriteError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute target for a route's document.
    pub fn route_target(&self, route: &RouteDescriptor) -> PathBuf {
        self.root.join(route.output_file())
    }

    /// Write a route's document, creating intermediate directories.
    pub fn write_route(&self, route: &RouteDescriptor, html: &str) -> Result<PathBuf, WriteError> {
        let target = self.route_target(route);
        write_creating_parents(&target, html.as_bytes())?;
        Ok(target)
    }

    /// Write a file at a path relative to the output root.
    pub fn write_file(&self, rel: &str, contents: &str) -> Result<PathBuf, WriteError> {
        let target = self.root.join(rel);
        write_creating_parents(&target, contents.as_bytes())?;
        Ok(target)
    }
}

fn write_creating_parents(target: &Path, contents: &[u8]) -> Result<(), WriteError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
    }
    fs::write(target, contents).map_err(|e| WriteError::io(target, e))
}

/// Held for the duration of a build. Dropping it releases the directory.
#[derive(Debug)]
pub struct OutputLock {
    path: PathBuf,
    released: bool,
}

impl OutputLock {
    pub fn acquire(dir: &Path) -> Result<Self, WriteError> {
        fs::create_dir_all(dir).map_err(|e| WriteError::io(dir, e))?;
        let path = dir.join(LOCK_FILENAME);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(WriteError::Locked(path));
            }
            Err(e) => return Err(WriteError::io(&path, e)),
        };
        writeln!(file, "{}", std::process::id()).map_err(|e| WriteError::io(&path, e))?;
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file, reporting failure instead of ignoring it.
    pub fn release(mut self) -> Result<(), WriteError> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| WriteError::io(&self.path, e))
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}
