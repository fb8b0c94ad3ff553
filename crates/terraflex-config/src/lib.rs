//! Parsing and validation of `terraflex.yaml`.
//!
//! The document is deliberately loose: a storage provider or transformer
//! entry only requires a `type` tag, the rest of its fields are opaque
//! params handed to that type's factory. This crate only owns the shape
//! and the version gate, not the meaning of any one provider's params.

pub mod error;
pub mod loader;
pub mod types;
pub mod validate;

pub use error::{ConfigError, Result};
pub use loader::load;
pub use types::{
    ConfigFile, Params, StackConfig, StorageProviderConfig, StorageProviderUsageConfig,
    TransformerConfig, CONFIG_VERSION,
};
