//! The shape of `terraflex.yaml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version the config format is pinned to. The major component is the
/// compatibility gate; minor/patch are accepted freely.
pub const CONFIG_VERSION: &str = "2.0.0";

/// Untyped parameter bag passed straight through to a provider or
/// transformer factory.
pub type Params = serde_json::Value;

/// How a stack reaches its state storage: which provider, with which
/// params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageProviderUsageConfig {
    pub provider: String,
    #[serde(default)]
    pub params: Option<Params>,
}

/// A named, typed storage provider declaration. `extra` carries whatever
/// fields that provider type needs beyond `type` itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A named, typed transformer declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    #[serde(rename = "type")]
    pub transformer_type: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One stack: where its state lives and which transformers wrap it, in
/// application order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    pub state_storage: StorageProviderUsageConfig,
    #[serde(default)]
    pub transformers: Vec<String>,
}

/// The full parsed `terraflex.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub storage_providers: BTreeMap<String, StorageProviderConfig>,
    #[serde(default)]
    pub transformers: BTreeMap<String, TransformerConfig>,
    #[serde(default)]
    pub stacks: BTreeMap<String, StackConfig>,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
version: "2.0.0"
storage_providers:
  local:
    type: local
    base_dir: /tmp/terraflex
transformers: {}
stacks:
  main:
    state_storage:
      provider: local
    transformers: []
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.stacks["main"].state_storage.provider, "local");
    }
}
