//! Downloads the `age`/`age-keygen` release tarball from GitHub.

use crate::downloader::{move_executable_to_dest, Downloader};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use terraflex_core::{Error, Result};
use tracing::info;

const RELEASE_URL_TEMPLATE: &str =
    "https://github.com/FiloSottile/age/releases/download/v{version}/age-v{version}-{platform}.tar.gz";

fn platform_suffix() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => match std::env::consts::OS {
            "macos" => "darwin-amd64",
            "windows" => "windows-amd64",
            _ => "linux-amd64",
        },
        "aarch64" => match std::env::consts::OS {
            "macos" => "darwin-arm64",
            "windows" => "windows-arm64",
            _ => "linux-arm64",
        },
        _ => "linux-amd64",
    }
}

/// Fetches the official `age` release archive for the host platform and
/// installs `age`/`age-keygen` into the resolver's cache.
#[derive(Debug, Default)]
pub struct AgeDownloader;

impl AgeDownloader {
    /// Build a downloader with no configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Downloader for AgeDownloader {
    async fn download(&self, version: &str, expected_paths: &BTreeMap<String, PathBuf>) -> Result<()> {
        let url = RELEASE_URL_TEMPLATE
            .replace("{version}", version)
            .replace("{platform}", platform_suffix());
        info!(url, "downloading age release");

        let response = reqwest::get(&url)
            .await
            .map_err(|e| Error::DriverFailure(format!("failed to download age: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::DriverFailure(format!(
                "failed to download age: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::DriverFailure(format!("failed to read age response: {e}")))?;

        let extract_dir = tempfile::tempdir().map_err(|e| Error::io("age extract dir", e))?;
        {
            let tar = flate2::read::GzDecoder::new(bytes.as_ref());
            let mut archive = tar::Archive::new(tar);
            archive
                .unpack(extract_dir.path())
                .map_err(|e| Error::DriverFailure(format!("failed to extract age archive: {e}")))?;
        }

        let age_bin = extract_dir.path().join("age").join("age");
        let age_dest = expected_paths
            .get("age")
            .ok_or_else(|| Error::DependencyMissing("age binary was not requested".to_string()))?;
        move_executable_to_dest(&age_bin, age_dest)?;

        let age_keygen_bin = extract_dir.path().join("age").join("age-keygen");
        let age_keygen_dest = expected_paths.get("age-keygen").ok_or_else(|| {
            Error::DependencyMissing("age-keygen binary was not requested".to_string())
        })?;
        move_executable_to_dest(&age_keygen_bin, age_keygen_dest)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_suffix_is_nonempty() {
        assert!(!platform_suffix().is_empty());
    }
}
