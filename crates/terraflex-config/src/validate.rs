//! Version gate and cross-reference validation for [`ConfigFile`].

use crate::error::{ConfigError, Result};
use crate::types::{ConfigFile, CONFIG_VERSION};
use semver::Version;

/// Parse a version string leniently: `"2"` is accepted as `"2.0.0"`,
/// `"2.1"` as `"2.1.0"`, mirroring the looseness of the original config's
/// `packaging.version.Version` parser.
fn parse_lenient(raw: &str) -> std::result::Result<Version, semver::Error> {
    let parts = raw.split('.').count();
    let padded = match parts {
        1 => format!("{raw}.0.0"),
        2 => format!("{raw}.0"),
        _ => raw.to_string(),
    };
    Version::parse(&padded)
}

/// Check `config.version` against [`CONFIG_VERSION`]: equal major is
/// accepted regardless of minor/patch, a lower major means the document
/// is stale, a higher major means this build is stale.
pub fn check_version(config: &ConfigFile) -> Result<()> {
    let found = parse_lenient(&config.version).map_err(|source| ConfigError::InvalidVersion {
        version: config.version.clone(),
        source,
    })?;
    let required = parse_lenient(CONFIG_VERSION).expect("CONFIG_VERSION is valid");

    if found.major < required.major {
        return Err(ConfigError::UpgradeConfig {
            found: found.to_string(),
            required: required.to_string(),
        });
    }
    if found.major > required.major {
        return Err(ConfigError::UpgradeTool {
            found: found.to_string(),
            required: required.to_string(),
        });
    }
    Ok(())
}

/// Verify every stack's provider and transformer references resolve to a
/// declared entry.
pub fn check_references(config: &ConfigFile) -> Result<()> {
    for (stack_name, stack) in &config.stacks {
        let provider = &stack.state_storage.provider;
        if !config.storage_providers.contains_key(provider) {
            return Err(ConfigError::Invalid(format!(
                "stack '{stack_name}' references undeclared storage provider '{provider}'"
            )));
        }
        for transformer in &stack.transformers {
            if !config.transformers.contains_key(transformer) {
                return Err(ConfigError::Invalid(format!(
                    "stack '{stack_name}' references undeclared transformer '{transformer}'"
                )));
            }
        }
    }
    Ok(())
}

/// Run the full validation pipeline: version gate, then reference checks.
pub fn validate(config: &ConfigFile) -> Result<()> {
    check_version(config)?;
    check_references(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StackConfig, StorageProviderConfig, StorageProviderUsageConfig};
    use std::collections::BTreeMap;

    fn sample_config(version: &str) -> ConfigFile {
        let mut storage_providers = BTreeMap::new();
        storage_providers.insert(
            "local".to_string(),
            StorageProviderConfig {
                provider_type: "local".to_string(),
                extra: BTreeMap::new(),
            },
        );
        let mut stacks = BTreeMap::new();
        stacks.insert(
            "main".to_string(),
            StackConfig {
                state_storage: StorageProviderUsageConfig {
                    provider: "local".to_string(),
                    params: None,
                },
                transformers: vec![],
            },
        );
        ConfigFile {
            version: version.to_string(),
            storage_providers,
            transformers: BTreeMap::new(),
            stacks,
        }
    }

    #[test]
    fn equal_major_is_accepted() {
        assert!(check_version(&sample_config("2")).is_ok());
        assert!(check_version(&sample_config("2.3.1")).is_ok());
    }

    #[test]
    fn lower_major_requires_upgrade_of_config() {
        let err = check_version(&sample_config("1")).unwrap_err();
        assert!(matches!(err, ConfigError::UpgradeConfig { .. }));
    }

    #[test]
    fn higher_major_requires_upgrade_of_tool() {
        let err = check_version(&sample_config("3")).unwrap_err();
        assert!(matches!(err, ConfigError::UpgradeTool { .. }));
    }

    #[test]
    fn dangling_provider_reference_is_rejected() {
        let mut config = sample_config("2");
        config.stacks.get_mut("main").unwrap().state_storage.provider = "ghost".to_string();
        assert!(check_references(&config).is_err());
    }

    #[test]
    fn dangling_transformer_reference_is_rejected() {
        let mut config = sample_config("2");
        config.stacks.get_mut("main").unwrap().transformers = vec!["ghost".to_string()];
        assert!(check_references(&config).is_err());
    }
}
