//! Project-level operations: init, install, install-all, uninstall, list.
//!
//! The manifest is reloaded for every operation and saved after every
//! successful mutation.

use crate::error::{Error, Result};
use crate::github::RemoteRepository;
use crate::installer::{self, Installer};
use crate::local::count_installed_files;
use crate::locator::PackageId;
use crate::manifest::Manifest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of `init_project`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub name: String,
    pub install_dir: String,
    pub gitignore_updated: bool,
}

/// Create `skillmaster.json` and the install directory in `root`.
///
/// `install_dir` is the user's preferred directory name; an empty value
/// keeps the manifest default. An existing manifest is only replaced when
/// `overwrite` is set. If a `.gitignore` exists and does not mention the
/// install directory, an entry is appended.
pub fn init_project(root: &Path, install_dir: &str, overwrite: bool) -> Result<InitReport> {
    if Manifest::exists(root) && !overwrite {
        return Err(Error::ManifestExists(Manifest::path(root)));
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let mut manifest = Manifest::new(&name);
    if !install_dir.trim().is_empty() {
        manifest.config.install_dir = install_dir.trim().to_string();
    }
    manifest.save(root)?;

    let install_dir = manifest.install_dir(root);
    fs::create_dir_all(&install_dir).map_err(|e| Error::io(&install_dir, e))?;

    let gitignore_updated = match update_gitignore(root, &manifest.config.install_dir) {
        Ok(updated) => updated,
        Err(e) => {
            tracing::warn!("could not update .gitignore: {e}");
            false
        }
    };

    Ok(InitReport {
        name,
        install_dir: manifest.config.install_dir,
        gitignore_updated,
    })
}

/// Append `<install_dir>/` to an existing `.gitignore` unless it is already
/// mentioned. Returns true if the file changed.
fn update_gitignore(root: &Path, install_dir: &str) -> Result<bool> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return Ok(false);
    }

    let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    if content.contains(install_dir) {
        return Ok(false);
    }

    let mut addition = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        addition.push('\n');
    }
    addition.push_str(&format!(
        "\n# SkillMaster installation directory\n{install_dir}/\n"
    ));

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .map_err(|e| Error::io(&path, e))?;
    file.write_all(addition.as_bytes())
        .map_err(|e| Error::io(&path, e))?;
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// Content was fetched and written
    Installed,
    /// Files were already present and no reinstall was requested
    AlreadyInstalled,
}

/// Outcome of a single package install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub id: PackageId,
    pub version: String,
    pub files: usize,
    pub status: InstallStatus,
}

/// Outcome of installing every manifest dependency
#[derive(Debug, Default)]
pub struct BatchReport {
    pub installed: Vec<InstallReport>,
    pub failed: Vec<(String, Error)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.installed.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One row of `list_packages`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStatus {
    pub key: String,
    pub version: String,
    /// Installed markdown files; `None` if the key is not a valid identifier
    pub files: Option<usize>,
}

impl PackageStatus {
    pub fn is_installed(&self) -> bool {
        self.files.is_some_and(|n| n > 0)
    }
}

/// Dependencies of the project at `root` with their installed file counts,
/// sorted by key.
pub fn list_packages(root: &Path) -> Result<(Manifest, Vec<PackageStatus>)> {
    let manifest = Manifest::load(root)?;
    let install_dir = manifest.install_dir(root);

    let packages = manifest
        .dependencies
        .iter()
        .map(|(key, version)| {
            let files = PackageId::parse(key).ok().map(|id| {
                count_installed_files(&install_dir, &id).unwrap_or_else(|e| {
                    tracing::warn!("could not count files for {key}: {e}");
                    0
                })
            });
            PackageStatus {
                key: key.clone(),
                version: version.clone(),
                files,
            }
        })
        .collect();

    Ok((manifest, packages))
}

/// Remove a package's files and its manifest entry. Needs no remote.
pub fn uninstall(root: &Path, id: &PackageId) -> Result<()> {
    let mut manifest = Manifest::load(root)?;
    installer::uninstall_package(id, &manifest.install_dir(root))?;
    manifest.remove_dependency(&id.key());
    manifest.save(root)
}

/// A project directory bound to a remote.
pub struct Project<'a> {
    root: PathBuf,
    client: &'a dyn RemoteRepository,
}

impl<'a> Project<'a> {
    pub fn new(root: impl Into<PathBuf>, client: &'a dyn RemoteRepository) -> Self {
        Self {
            root: root.into(),
            client,
        }
    }

    /// Install one package and record it in the manifest.
    ///
    /// Without `force`, a package that already has files on disk is not
    /// refetched; only its version label is refreshed.
    pub fn install(&self, id: &PackageId, force: bool) -> Result<InstallReport> {
        let mut manifest = Manifest::load(&self.root)?;
        let install_dir = manifest.install_dir(&self.root);

        let report = self.install_one(id, &install_dir, force)?;
        manifest.add_dependency(id.key(), report.version.clone());
        manifest.save(&self.root)?;
        Ok(report)
    }

    /// Install every dependency declared in the manifest.
    ///
    /// A failing package is logged and collected; the rest still run. The
    /// manifest is saved after each successful package.
    pub fn install_all(&self, force: bool) -> Result<BatchReport> {
        let mut manifest = Manifest::load(&self.root)?;
        let install_dir = manifest.install_dir(&self.root);
        let keys: Vec<String> = manifest.dependencies.keys().cloned().collect();

        let mut batch = BatchReport::default();
        for key in keys {
            let outcome =
                PackageId::parse(&key).and_then(|id| self.install_one(&id, &install_dir, force));
            match outcome {
                Ok(report) => {
                    manifest.add_dependency(key, report.version.clone());
                    manifest.save(&self.root)?;
                    batch.installed.push(report);
                }
                Err(e) => {
                    tracing::warn!("failed to install {key}: {e}");
                    batch.failed.push((key, e));
                }
            }
        }
        Ok(batch)
    }

    fn install_one(
        &self,
        id: &PackageId,
        install_dir: &Path,
        force: bool,
    ) -> Result<InstallReport> {
        let version = self.client.resolve_version(id);

        let existing = count_installed_files(install_dir, id)?;
        if existing > 0 && !force {
            tracing::info!("{id} already installed ({existing} file(s)), skipping download");
            return Ok(InstallReport {
                id: id.clone(),
                version,
                files: existing,
                status: InstallStatus::AlreadyInstalled,
            });
        }

        let files = Installer::new(self.client).install_package(id, install_dir)?;
        Ok(InstallReport {
            id: id.clone(),
            version,
            files,
            status: InstallStatus::Installed,
        })
    }
}
