//! The route registry: the ordered table of pages that get prerendered.
//!
//! Registry order is the order pages are written and the order of entries in
//! `sitemap.xml`. Construction validates the table once so later stages can
//! assume every path is well-formed and maps to exactly one output file.

use crate::types::RouteDescriptor;
use std::collections::HashSet;
use thiserror::Error;

/// Top-level output names the pipeline writes itself.
const RESERVED_OUTPUTS: [&str; 3] = ["index.html", "404.html", "sitemap.xml"];

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("no routes configured")]
    Empty,
    #[error("route path {path:?} is invalid: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("route path {0:?} is declared more than once")]
    DuplicatePath(String),
    #[error("routes {first:?} and {second:?} both write {output}")]
    DuplicateOutput {
        first: String,
        second: String,
        output: String,
    },
    #[error("route path {path:?} collides with generated file {name}")]
    ReservedName { path: String, name: String },
    #[error("route {path:?} has priority {priority}, expected 0.0-1.0")]
    Priority { path: String, priority: f32 },
}

#[derive(Debug, Clone)]
pub struct Registry {
    routes: Vec<RouteDescriptor>,
}

impl Registry {
    /// Validate and wrap a list of routes.
    ///
    /// `extra_reserved` names additional top-level files (the copied public
    /// files) that a route's first segment must not shadow.
    pub fn new(
        routes: Vec<RouteDescriptor>,
        extra_reserved: &[String],
    ) -> Result<Self, RegistryError> {
        if routes.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut paths = HashSet::new();
        let mut outputs: Vec<(String, &str)> = Vec::with_capacity(routes.len());

        for route in &routes {
            validate_path(&route.path)?;

            if !(0.0..=1.0).contains(&route.priority) {
                return Err(RegistryError::Priority {
                    path: route.path.clone(),
                    priority: route.priority,
                });
            }

            if !route.is_root() {
                let first = route.path[1..].split('/').next().unwrap_or_default();
                let reserved = RESERVED_OUTPUTS
                    .iter()
                    .copied()
                    .chain(extra_reserved.iter().map(String::as_str))
                    .find(|name| name.eq_ignore_ascii_case(first));
                if let Some(name) = reserved {
                    return Err(RegistryError::ReservedName {
                        path: route.path.clone(),
                        name: name.to_string(),
                    });
                }
            }

            if !paths.insert(route.path.as_str()) {
                return Err(RegistryError::DuplicatePath(route.path.clone()));
            }

            // Case-insensitive filesystems fold `/About` and `/about` together.
            let output = route.output_file();
            if let Some((_, first)) = outputs
                .iter()
                .find(|(o, _)| o.eq_ignore_ascii_case(&output))
            {
                return Err(RegistryError::DuplicateOutput {
                    first: first.to_string(),
                    second: route.path.clone(),
                    output,
                });
            }
            outputs.push((output, route.path.as_str()));
        }

        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.path == path)
    }
}

fn validate_path(path: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path == "/" {
        return Ok(());
    }
    if path.contains(['?', '#']) {
        return Err(invalid("must not contain a query string or fragment"));
    }
    if path.contains('\\') {
        return Err(invalid("must not contain backslashes"));
    }
    if path.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    for segment in path[1..].split('/') {
        match segment {
            "" => return Err(invalid("must not contain empty segments")),
            "." | ".." => return Err(invalid("must not contain '.' or '..' segments")),
            _ => {}
        }
    }
    Ok(())
}
