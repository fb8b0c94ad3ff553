//! Static registry mapping a config `type` tag to the factory that builds
//! the corresponding storage driver or transformer.
//!
//! Populated by explicit `register_*` calls at CLI startup rather than by
//! dynamic plugin discovery — there is no stable dynamic-loading story to
//! reach for, so built-ins are wired in-process instead.

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use terraflex_core::{Error, ItemKey, Result};
use terraflex_storage::DriverHandle;
use terraflex_transform::Transformer;

/// Builds a [`DriverHandle`] from a provider's raw config params.
pub type StorageProviderFactory =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<DriverHandle>> + Send + Sync>;

/// Builds a boxed [`Transformer`] from a transformer's raw config params.
pub type TransformerFactory =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<Arc<dyn Transformer>>> + Send + Sync>;

/// Validates a per-stack key parameter map into a concrete [`ItemKey`]
/// for a given storage provider type — the registry-level analog of
/// [`terraflex_core::FromParams`], since the engine only ever holds a
/// provider's `type` tag, not its concrete Rust type.
pub type ItemKeyFactory = Arc<dyn Fn(serde_json::Value) -> Result<Arc<dyn ItemKey>> + Send + Sync>;

/// Immutable lookup table from config `type` tag to factory, built once
/// at startup.
#[derive(Default, Clone)]
pub struct Registry {
    storage_providers: HashMap<&'static str, StorageProviderFactory>,
    transformers: HashMap<&'static str, TransformerFactory>,
    item_keys: HashMap<&'static str, ItemKeyFactory>,
}

impl Registry {
    /// Look up the factory registered for a storage provider `type` tag.
    ///
    /// # Errors
    /// Returns `UnknownProvider` if no factory was registered under this
    /// name.
    pub fn storage_provider(&self, type_name: &str) -> Result<&StorageProviderFactory> {
        self.storage_providers
            .get(type_name)
            .ok_or_else(|| Error::UnknownProvider(type_name.to_string()))
    }

    /// Look up the factory registered for a transformer `type` tag.
    ///
    /// # Errors
    /// Returns `UnknownTransformer` if no factory was registered under
    /// this name.
    pub fn transformer(&self, type_name: &str) -> Result<&TransformerFactory> {
        self.transformers
            .get(type_name)
            .ok_or_else(|| Error::UnknownTransformer(type_name.to_string()))
    }

    /// Look up the item-key constructor registered for a storage
    /// provider `type` tag.
    ///
    /// # Errors
    /// Returns `UnknownProvider` if no factory was registered under this
    /// name.
    pub fn item_key(&self, type_name: &str) -> Result<&ItemKeyFactory> {
        self.item_keys
            .get(type_name)
            .ok_or_else(|| Error::UnknownProvider(type_name.to_string()))
    }
}

/// Accumulates `register_*` calls before producing an immutable
/// [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    storage_providers: HashMap<&'static str, StorageProviderFactory>,
    transformers: HashMap<&'static str, TransformerFactory>,
    item_keys: HashMap<&'static str, ItemKeyFactory>,
}

impl RegistryBuilder {
    /// Start with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a storage provider factory under `type_name`.
    #[must_use]
    pub fn register_storage_provider(mut self, type_name: &'static str, factory: StorageProviderFactory) -> Self {
        self.storage_providers.insert(type_name, factory);
        self
    }

    /// Register a transformer factory under `type_name`.
    #[must_use]
    pub fn register_transformer(mut self, type_name: &'static str, factory: TransformerFactory) -> Self {
        self.transformers.insert(type_name, factory);
        self
    }

    /// Register an item-key constructor under `type_name`.
    #[must_use]
    pub fn register_item_key(mut self, type_name: &'static str, factory: ItemKeyFactory) -> Self {
        self.item_keys.insert(type_name, factory);
        self
    }

    /// Freeze the builder into a [`Registry`].
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            storage_providers: self.storage_providers,
            transformers: self.transformers,
            item_keys: self.item_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraflex_storage::EnvVarDriver;

    #[tokio::test]
    async fn unregistered_provider_is_unknown() {
        let registry = RegistryBuilder::new().build();
        let err = registry.storage_provider("local").unwrap_err();
        assert!(matches!(err, Error::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn registered_provider_resolves_and_invokes() {
        let factory: StorageProviderFactory = Arc::new(|_params| {
            Box::pin(async move { Ok(DriverHandle::Readable(Arc::new(EnvVarDriver::new()))) })
        });
        let registry = RegistryBuilder::new()
            .register_storage_provider("envvar", factory)
            .build();

        let built = registry.storage_provider("envvar").unwrap();
        let handle = built(serde_json::json!({})).await.unwrap();
        assert!(matches!(handle, DriverHandle::Readable(_)));
    }
}
