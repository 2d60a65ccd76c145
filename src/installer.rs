//! Materializes packages under `<install_dir>/<owner>-<name>/`.

use crate::error::{Error, Result};
use crate::github::{RemoteFile, RemoteRepository};
use crate::local::package_dir;
use crate::locator::PackageId;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Fetches package content through a remote and writes it to disk.
pub struct Installer<'a> {
    client: &'a dyn RemoteRepository,
}

impl<'a> Installer<'a> {
    pub fn new(client: &'a dyn RemoteRepository) -> Self {
        Self { client }
    }

    /// Install the package's markdown files from its current default branch.
    ///
    /// Returns the number of files written. If a write fails part-way, the
    /// files already written stay on disk and the count is carried in
    /// [`Error::Write`].
    pub fn install_package(&self, id: &PackageId, install_dir: &Path) -> Result<usize> {
        let info = self.client.get_repository(id)?;
        let reference = info.default_branch.as_str();
        tracing::debug!("installing {id} from '{reference}'");

        let files = self.client.list_markdown_files(id, reference)?;
        let target = package_dir(install_dir, id);
        fs::create_dir_all(&target).map_err(|e| Error::Write {
            path: target.clone(),
            written: 0,
            source: e,
        })?;

        let mut written = 0;
        for file in &files {
            write_file(&target, file, written)?;
            written += 1;
        }

        tracing::info!("installed {written} file(s) for {id}");
        Ok(written)
    }
}

/// Remove `<install_dir>/<owner>-<name>/` recursively.
pub fn uninstall_package(id: &PackageId, install_dir: &Path) -> Result<()> {
    let target = package_dir(install_dir, id);
    if !target.is_dir() {
        return Err(Error::NotInstalled(id.key()));
    }
    fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;
    tracing::info!("removed {}", target.display());
    Ok(())
}

/// Resolve a remote path below `target`. Only normal components are kept,
/// so a remote path can never escape the namespace directory.
fn local_path(target: &Path, remote_path: &str) -> Option<PathBuf> {
    let relative: PathBuf = Path::new(remote_path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(target.join(relative))
}

fn write_file(target: &Path, file: &RemoteFile, written: usize) -> Result<()> {
    let path = local_path(target, &file.path).ok_or_else(|| Error::Write {
        path: target.join(&file.path),
        written,
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file path"),
    })?;

    let fail = |source| Error::Write {
        path: path.clone(),
        written,
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    fs::write(&path, &file.content).map_err(fail)
}
