//! Configuration-specific error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating `terraflex.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist at the expected path.
    #[error("configuration file not found: {path:?}")]
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },

    /// YAML syntax or schema error.
    #[error("invalid YAML in {path:?}: {source}")]
    InvalidYaml {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The document's `version` field could not be parsed as a version.
    #[error("invalid version string {version:?}: {source}")]
    InvalidVersion {
        /// The raw version string from the document.
        version: String,
        /// Underlying parse error.
        #[source]
        source: semver::Error,
    },

    /// The document's major version is older than what this build supports.
    #[error(
        "configuration version {found} is older than {required} - please upgrade the config file"
    )]
    UpgradeConfig {
        /// Version found in the document.
        found: String,
        /// Version required by this build.
        required: String,
    },

    /// The document's major version is newer than what this build supports.
    #[error(
        "configuration version {found} is newer than {required} - please upgrade terraflex"
    )]
    UpgradeTool {
        /// Version found in the document.
        found: String,
        /// Version required by this build.
        required: String,
    },

    /// A stack, provider, or transformer reference does not resolve.
    #[error("{0}")]
    Invalid(String),

    /// I/O failure reading the config file.
    #[error("io error at {path:?}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for terraflex_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::ConfigInvalid(err.to_string())
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ConfigError>;
