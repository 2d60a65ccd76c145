//! Installed package state, derived from the filesystem on demand.
//!
//! A package is installed when `<install_dir>/<owner>-<name>/` exists; its
//! size is the number of markdown files beneath it. Nothing is cached.

use crate::error::{Error, Result};
use crate::github::is_markdown;
use crate::locator::PackageId;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Namespace directory of a package.
pub fn package_dir(install_dir: &Path, id: &PackageId) -> PathBuf {
    install_dir.join(id.namespace())
}

/// Count markdown files under the package's namespace directory.
/// A missing directory counts as zero.
pub fn count_installed_files(install_dir: &Path, id: &PackageId) -> Result<usize> {
    let root = package_dir(install_dir, id);
    if !root.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&root).to_path_buf();
            Error::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_markdown(&entry.file_name().to_string_lossy()) {
            count += 1;
        }
    }
    Ok(count)
}
