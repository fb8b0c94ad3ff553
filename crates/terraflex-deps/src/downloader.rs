//! The network leg of dependency resolution.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use terraflex_core::Result;

/// Fetches one versioned dependency and places its binaries at the paths
/// `expected_paths` names.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `version` and populate every path in `expected_paths`.
    async fn download(&self, version: &str, expected_paths: &BTreeMap<String, PathBuf>) -> Result<()>;
}

/// Move `src` to `dest`, replacing anything already there, then mark it
/// executable (unix only — a no-op on other platforms).
pub fn move_executable_to_dest(src: &std::path::Path, dest: &std::path::Path) -> Result<()> {
    if src == dest {
        return Ok(());
    }
    if dest.exists() {
        std::fs::remove_file(dest).map_err(|e| terraflex_core::Error::io(dest.display().to_string(), e))?;
    }
    std::fs::rename(src, dest).map_err(|e| terraflex_core::Error::io(dest.display().to_string(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| terraflex_core::Error::io(dest.display().to_string(), e))?;
    }
    Ok(())
}
