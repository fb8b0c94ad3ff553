//! Reading `terraflex.yaml` off disk.

use crate::error::{ConfigError, Result};
use crate::types::ConfigFile;
use crate::validate;
use std::path::Path;

/// Read and validate a config file from `path`.
///
/// # Errors
/// Returns an error if the file is missing, malformed, fails the version
/// gate, or references an undeclared provider/transformer.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ConfigFile =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::InvalidYaml {
            path: path.to_path_buf(),
            source,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_missing_file_errors() {
        let err = load(Path::new("/nonexistent/terraflex.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraflex.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
version: "2.0.0"
storage_providers:
  local:
    type: local
    base_dir: /tmp/terraflex
transformers: {{}}
stacks:
  main:
    state_storage:
      provider: local
    transformers: []
"#
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.stacks.len(), 1);
    }

    #[test]
    fn load_rejects_stale_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraflex.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0.0"
storage_providers: {{}}
transformers: {{}}
stacks: {{}}
"#
        )
        .unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UpgradeConfig { .. }));
    }
}
