//! Narrow subprocess-orchestration seam a key helper must implement.
//!
//! Separating this from [`crate::encryption::EncryptionTransformer`] means
//! a second key scheme only needs a new `KeyHelper` impl, not a rewrite of
//! the transformer itself.

use async_trait::async_trait;
use terraflex_core::Result;

/// Drives the external binaries behind one authenticated-encryption
/// scheme (e.g. `age`/`age-keygen`).
#[async_trait]
pub trait KeyHelper: Send + Sync {
    /// Derive the public key from `private_key` bytes.
    async fn derive_public(&self, private_key: &[u8]) -> Result<Vec<u8>>;
    /// Encrypt `content` to `public_key`.
    async fn encrypt(&self, public_key: &[u8], content: &[u8]) -> Result<Vec<u8>>;
    /// Decrypt `content` using `private_key`.
    async fn decrypt(&self, private_key: &[u8], content: &[u8]) -> Result<Vec<u8>>;
}
