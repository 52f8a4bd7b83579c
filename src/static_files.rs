//! Copies host-support files (robots.txt, CNAME, verification pages) from
//! the public directory into the output root.
//!
//! The list is fixed by configuration. Names missing from the public
//! directory are skipped without complaint; a site simply may not have a
//! `.htaccess`. Anything that exists but can't be copied is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("copying {} to {}: {source}", .from.display(), .to.display())]
pub struct CopyError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CopyReport {
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn copy_static_files(
    public_dir: &Path,
    out_dir: &Path,
    names: &[String],
) -> Result<CopyReport, CopyError> {
    let mut report = CopyReport::default();

    for name in names {
        let from = public_dir.join(name);
        if !from.is_file() {
            report.skipped.push(name.clone());
            continue;
        }
        let to = out_dir.join(name);
        fs::copy(&from, &to).map_err(|source| CopyError {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        report.copied.push(name.clone());
    }

    Ok(report)
}
