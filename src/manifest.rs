//! Project manifest (`skillmaster.json`).

use crate::config::DEFAULT_INSTALL_DIR;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "skillmaster.json";

const INITIAL_VERSION: &str = "1.0.0";

fn default_install_dir() -> String {
    DEFAULT_INSTALL_DIR.to_string()
}

fn default_auto_merge() -> bool {
    true
}

/// The `config` section of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
    #[serde(default = "default_auto_merge")]
    pub auto_merge: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            auto_merge: default_auto_merge(),
        }
    }
}

/// Declared dependencies of a project, keyed by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub config: ProjectConfig,
}

/// `"dependencies": null` loads as an empty map.
fn null_as_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: INITIAL_VERSION.to_string(),
            dependencies: BTreeMap::new(),
            config: ProjectConfig::default(),
        }
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE_NAME)
    }

    pub fn exists(dir: &Path) -> bool {
        Self::path(dir).is_file()
    }

    /// Load the manifest from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound(path))
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let mut manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
                path: path.clone(),
                source,
            })?;
        if manifest.config.install_dir.trim().is_empty() {
            manifest.config.install_dir = default_install_dir();
        }
        Ok(manifest)
    }

    /// Write the manifest to `dir` as pretty-printed JSON.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = Self::path(dir);
        let mut content =
            serde_json::to_string_pretty(self).map_err(|e| Error::io(&path, e.into()))?;
        content.push('\n');
        std::fs::write(&path, content).map_err(|e| Error::io(path, e))
    }

    /// Insert or overwrite a dependency.
    pub fn add_dependency(&mut self, key: impl Into<String>, version: impl Into<String>) {
        self.dependencies.insert(key.into(), version.into());
    }

    /// Remove a dependency. Absent keys are ignored.
    pub fn remove_dependency(&mut self, key: &str) {
        self.dependencies.remove(key);
    }

    /// Install directory resolved against the project root.
    pub fn install_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.config.install_dir)
    }
}
