//! Content-addressable cache of resolved binary dependencies.

use crate::downloader::Downloader;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use terraflex_core::{Error, Result};
use tracing::info;

/// Caches resolved binaries under `<XDG_DATA_HOME>/terraflex/<name>-v<version>`.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    cache_root: PathBuf,
}

impl DependencyResolver {
    /// Resolve the cache root from the platform's data directory.
    ///
    /// # Errors
    /// Returns an error if the platform has no resolvable data directory.
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "terraflex")
            .ok_or_else(|| Error::DependencyMissing("no resolvable data directory".to_string()))?;
        Ok(Self {
            cache_root: dirs.data_dir().to_path_buf(),
        })
    }

    /// Build a resolver rooted at an explicit directory (used by tests and
    /// by callers that override `XDG_DATA_HOME`-equivalent config).
    #[must_use]
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    /// The directory binaries are cached under.
    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    fn expected_paths(&self, names: &[&str], version: &str) -> BTreeMap<String, PathBuf> {
        names
            .iter()
            .map(|name| {
                (
                    (*name).to_string(),
                    self.cache_root.join(format!("{name}-v{version}")),
                )
            })
            .collect()
    }

    /// Ensure every binary in `names` at `version` exists locally,
    /// downloading via `downloader` if any are missing.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created or the
    /// download fails.
    pub async fn ensure_installed(
        &self,
        names: &[&str],
        version: &str,
        downloader: &dyn Downloader,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let expected = self.expected_paths(names, version);
        if expected.values().all(|p| p.exists()) {
            return Ok(expected);
        }

        std::fs::create_dir_all(&self.cache_root)
            .map_err(|e| Error::io(self.cache_root.display().to_string(), e))?;
        info!(?names, version, "downloading dependency");
        downloader.download(version, &expected).await?;
        Ok(expected)
    }

    /// Look up an already-resolved binary path by name and version.
    ///
    /// # Errors
    /// Returns `DependencyMissing` if the binary has not been installed.
    pub fn require(&self, name: &str, version: &str) -> Result<PathBuf> {
        let path = self.cache_root.join(format!("{name}-v{version}"));
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::DependencyMissing(format!(
                "{name} v{version} has not been resolved"
            )))
        }
    }
}
