//! Wires the static registry, resolves config-declared storage
//! providers and transformers into live instances, and assembles the
//! per-stack [`StateLockController`].
//!
//! Mirrors the original's `create_storage_providers` / `generate_transformers`
//! / `generate_stacks` / `initialize_controller` sequence: storage
//! providers are built first since transformers (specifically the
//! encryption transformer's key material) and stacks both depend on
//! them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use terraflex_config::{ConfigFile, StackConfig};
use terraflex_core::{Error, FromParams, ItemKey, Result};
use terraflex_deps::{AgeDownloader, DependencyResolver};
use terraflex_engine::{Stack, StateLockController};
use terraflex_registry::{ItemKeyFactory, Registry, RegistryBuilder, StorageProviderFactory, TransformerFactory};
use terraflex_storage::{DriverHandle, EnvVarDriver, EnvVarKey, GitDriver, GitKey, LocalDriver, LocalKey};
use terraflex_transform::{AgeKeyHelper, EncryptionTransformer, KeyHelper, Transformer};

const AGE_VERSION: &str = "1.2.0";

fn string_param(params: &serde_json::Value, key: &str) -> Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::ConfigInvalid(format!("missing required field `{key}`")))
}

/// Build the compile-time registry of known storage providers,
/// transformers, and their item-key constructors.
///
/// `state_dir` is the base directory the git driver derives its default
/// `clone_path` under when a stack doesn't configure one explicitly.
#[must_use]
pub fn build_registry(state_dir: PathBuf) -> Registry {
    let local_provider: StorageProviderFactory = Arc::new(|params| {
        Box::pin(async move {
            let folder = string_param(&params, "folder")?;
            let folder_mode = params.get("folder_mode").and_then(serde_json::Value::as_u64).unwrap_or(0o700) as u32;
            let file_mode = params.get("file_mode").and_then(serde_json::Value::as_u64).unwrap_or(0o600) as u32;
            let driver = LocalDriver::new(folder, folder_mode, file_mode)?;
            Ok(DriverHandle::Lockable(Arc::new(driver)))
        })
    });

    let envvar_provider: StorageProviderFactory =
        Arc::new(|_params| Box::pin(async move { Ok(DriverHandle::Readable(Arc::new(EnvVarDriver::new()))) }));

    let git_provider: StorageProviderFactory = Arc::new(move |params| {
        let state_dir = state_dir.clone();
        Box::pin(async move {
            let origin_url = string_param(&params, "origin_url")?;
            let clone_path = params
                .get("clone_path")
                .and_then(|v| v.as_str())
                .map(PathBuf::from);
            let r#ref = params
                .get("ref")
                .and_then(|v| v.as_str())
                .unwrap_or("main")
                .to_string();
            let driver = GitDriver::new(origin_url, clone_path, r#ref, &state_dir).await?;
            Ok(DriverHandle::Lockable(Arc::new(driver)))
        })
    });

    let local_key: ItemKeyFactory =
        Arc::new(|params| Ok(Arc::new(LocalKey::from_params(&params)?) as Arc<dyn ItemKey>));
    let git_key: ItemKeyFactory = Arc::new(|params| Ok(Arc::new(GitKey::from_params(&params)?) as Arc<dyn ItemKey>));
    let envvar_key: ItemKeyFactory =
        Arc::new(|params| Ok(Arc::new(EnvVarKey::from_params(&params)?) as Arc<dyn ItemKey>));

    let encryption_transformer: TransformerFactory = Arc::new(|params| {
        Box::pin(async move {
            let private_key = string_param(&params, "private_key")?.into_bytes();
            let age_path = string_param(&params, "age_path")?;
            let keygen_path = string_param(&params, "keygen_path")?;
            let helper: Arc<dyn KeyHelper> = Arc::new(AgeKeyHelper::new(age_path.into(), keygen_path.into()));
            let transformer = EncryptionTransformer::new(helper, private_key).await?;
            Ok(Arc::new(transformer) as Arc<dyn Transformer>)
        })
    });

    RegistryBuilder::new()
        .register_storage_provider("local", local_provider)
        .register_storage_provider("envvar", envvar_provider)
        .register_storage_provider("git", git_provider)
        .register_item_key("local", local_key)
        .register_item_key("git", git_key)
        .register_item_key("envvar", envvar_key)
        .register_transformer("encryption", encryption_transformer)
        .build()
}

/// Resolve the `age`/`age-keygen` binaries, downloading them into the
/// local cache on first use.
///
/// # Errors
/// Returns `DependencyMissing` if resolution or download fails.
pub async fn ensure_age_binaries(resolver: &DependencyResolver) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    let downloader = AgeDownloader::new();
    let paths = resolver
        .ensure_installed(&["age", "age-keygen"], AGE_VERSION, &downloader)
        .await?;
    Ok((paths["age"].clone(), paths["age-keygen"].clone()))
}

async fn build_storage_providers(
    config: &ConfigFile,
    registry: &Registry,
) -> Result<HashMap<String, DriverHandle>> {
    let mut providers = HashMap::new();
    for (name, provider_cfg) in &config.storage_providers {
        let factory = registry.storage_provider(&provider_cfg.provider_type)?;
        let params = serde_json::to_value(&provider_cfg.extra)?;
        let driver = factory(params).await?;
        providers.insert(name.clone(), driver);
    }
    Ok(providers)
}

/// Resolve a transformer's configured key material from whichever
/// storage provider it names, then build the live transformer.
///
/// Intentionally bypasses the registry for the storage read: the
/// registry's [`terraflex_registry::TransformerFactory`] signature only
/// carries already-resolved params, so indirection through
/// `import_from_storage` is resolved here, once, before the factory call
/// — the same place the original performs it.
async fn build_transformers(
    config: &ConfigFile,
    registry: &Registry,
    storage_providers: &HashMap<String, DriverHandle>,
    age_path: &std::path::Path,
    keygen_path: &std::path::Path,
) -> Result<HashMap<String, Arc<dyn Transformer>>> {
    let mut transformers = HashMap::new();
    for (name, transformer_cfg) in &config.transformers {
        match transformer_cfg.transformer_type.as_str() {
            "encryption" => {
                let import = transformer_cfg
                    .extra
                    .get("import_from_storage")
                    .ok_or_else(|| Error::ConfigInvalid("encryption transformer requires import_from_storage".into()))?;
                let provider_name = import
                    .get("provider")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::ConfigInvalid("import_from_storage requires provider".into()))?;
                let key_params = import.get("params").cloned().unwrap_or(serde_json::Value::Null);

                let driver = storage_providers
                    .get(provider_name)
                    .ok_or_else(|| Error::UnknownProvider(provider_name.to_string()))?;
                let provider_type = &config
                    .storage_providers
                    .get(provider_name)
                    .ok_or_else(|| Error::UnknownProvider(provider_name.to_string()))?
                    .provider_type;
                let key = build_item_key(registry, provider_type, key_params)?;
                let private_key = driver.as_readable().get_file(key.as_ref()).await?;

                let params = serde_json::json!({
                    "private_key": String::from_utf8(private_key)
                        .map_err(|e| Error::ConfigInvalid(format!("private key is not valid utf-8: {e}")))?,
                    "age_path": age_path.display().to_string(),
                    "keygen_path": keygen_path.display().to_string(),
                });
                let factory = registry.transformer("encryption")?;
                transformers.insert(name.clone(), factory(params).await?);
            }
            other => return Err(Error::UnknownTransformer(other.to_string())),
        }
    }
    Ok(transformers)
}

fn build_item_key(registry: &Registry, provider_type: &str, params: serde_json::Value) -> Result<Arc<dyn ItemKey>> {
    let factory = registry.item_key(provider_type)?;
    factory(params)
}

async fn build_stacks(
    config: &ConfigFile,
    registry: &Registry,
    storage_providers: &HashMap<String, DriverHandle>,
    transformers: &HashMap<String, Arc<dyn Transformer>>,
) -> Result<HashMap<String, Stack>> {
    let mut stacks = HashMap::new();
    for (stack_name, stack_cfg) in &config.stacks {
        let StackConfig {
            state_storage,
            transformers: transformer_names,
        } = stack_cfg;

        let driver = storage_providers
            .get(&state_storage.provider)
            .ok_or_else(|| Error::UnknownStack(format!("{stack_name} references undeclared provider {}", state_storage.provider)))?
            .clone();

        if driver.as_writable().is_none() {
            return Err(Error::UnsupportedCapability(format!(
                "provider {} backing stack {stack_name} is not writable",
                state_storage.provider
            )));
        }

        let provider_type = &config
            .storage_providers
            .get(&state_storage.provider)
            .ok_or_else(|| Error::UnknownProvider(state_storage.provider.clone()))?
            .provider_type;
        let params = state_storage.params.clone().unwrap_or(serde_json::Value::Null);
        let key = build_item_key(registry, provider_type, params)?;

        let mut stack_transformers = Vec::with_capacity(transformer_names.len());
        for transformer_name in transformer_names {
            let transformer = transformers
                .get(transformer_name)
                .ok_or_else(|| Error::UnknownTransformer(transformer_name.clone()))?;
            stack_transformers.push(transformer.clone());
        }

        stacks.insert(stack_name.clone(), Stack::new(driver, key, stack_transformers));
    }
    Ok(stacks)
}

/// Load `terraflex.yaml` from `config_path` and assemble a fully wired
/// [`StateLockController`].
///
/// # Errors
/// Returns an error if the config fails to load/validate, if it names
/// an unregistered provider or transformer type, or if resolving the
/// encryption helper binaries fails.
pub async fn initialize_controller(config_path: &std::path::Path) -> Result<StateLockController> {
    let config = terraflex_config::load(config_path)?;
    let resolver = DependencyResolver::new()?;
    let state_dir = resolver.cache_root().to_path_buf();
    let registry = build_registry(state_dir);

    let needs_age = config.transformers.values().any(|t| t.transformer_type == "encryption");
    let (age_path, keygen_path) = if needs_age {
        ensure_age_binaries(&resolver).await?
    } else {
        (std::path::PathBuf::new(), std::path::PathBuf::new())
    };

    let storage_providers = build_storage_providers(&config, &registry).await?;
    let transformers = build_transformers(&config, &registry, &storage_providers, &age_path, &keygen_path).await?;
    let stacks = build_stacks(&config, &registry, &storage_providers, &transformers).await?;

    Ok(StateLockController::new(stacks))
}
