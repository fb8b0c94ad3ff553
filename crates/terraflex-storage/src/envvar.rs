//! Environment-variable storage driver: read-only.

use crate::traits::Readable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use terraflex_core::{Error, FromParams, ItemKey, Result};

/// Key naming the environment variable to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarKey {
    pub key: String,
}

impl ItemKey for EnvVarKey {
    fn as_string(&self) -> String {
        self.key.clone()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl FromParams for EnvVarKey {
    fn from_params(params: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(params.clone()).map_err(Error::from)
    }
}

/// Reads item bytes straight out of the process environment. Has no
/// write or lock support — construction never fails, since there is no
/// backing resource to validate.
#[derive(Debug, Default)]
pub struct EnvVarDriver;

impl EnvVarDriver {
    /// Construct a new driver. There is no configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Readable for EnvVarDriver {
    async fn get_file(&self, key: &dyn ItemKey) -> Result<Vec<u8>> {
        let key = key
            .as_any()
            .downcast_ref::<EnvVarKey>()
            .ok_or_else(|| Error::UnsupportedCapability("key is not an EnvVarKey".to_string()))?;
        std::env::var(&key.key)
            .map(String::into_bytes)
            .map_err(|_| Error::NotFound(format!("environment variable {}", key.key)))
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_existing_variable() {
        // SAFETY: test-only, single-threaded access to this var name.
        unsafe {
            std::env::set_var("TERRAFLEX_TEST_ENVVAR", "value");
        }
        let driver = EnvVarDriver::new();
        let key = EnvVarKey {
            key: "TERRAFLEX_TEST_ENVVAR".to_string(),
        };
        let data = driver.get_file(&key).await.unwrap();
        assert_eq!(data, b"value");
        unsafe {
            std::env::remove_var("TERRAFLEX_TEST_ENVVAR");
        }
    }

    #[tokio::test]
    async fn missing_variable_is_not_found() {
        let driver = EnvVarDriver::new();
        let key = EnvVarKey {
            key: "TERRAFLEX_TEST_MISSING_VAR".to_string(),
        };
        let err = driver.get_file(&key).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
