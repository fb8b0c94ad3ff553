//! Authenticated-encryption [`Transformer`].
//!
//! The private key itself is resolved by the caller from whatever
//! storage driver the config points at (`import_from_storage`) — this
//! type only needs the resulting bytes and a [`KeyHelper`] to drive the
//! binaries that do the actual cryptography.

use crate::helper::KeyHelper;
use crate::traits::Transformer;
use async_trait::async_trait;
use std::sync::Arc;
use terraflex_core::Result;

/// Encrypts on write, decrypts on read, using a [`KeyHelper`]-backed
/// scheme (currently only `age`).
pub struct EncryptionTransformer {
    helper: Arc<dyn KeyHelper>,
    private_key: Vec<u8>,
    public_key: Vec<u8>,
}

impl EncryptionTransformer {
    /// Resolve the public key from `private_key` once and cache both for
    /// the transformer's lifetime.
    ///
    /// # Errors
    /// Returns an error if public-key derivation fails (e.g. the helper
    /// binary is missing or the key material is malformed).
    pub async fn new(helper: Arc<dyn KeyHelper>, private_key: Vec<u8>) -> Result<Self> {
        let public_key = helper.derive_public(&private_key).await?;
        Ok(Self {
            helper,
            private_key,
            public_key,
        })
    }
}

#[async_trait]
impl Transformer for EncryptionTransformer {
    async fn encode(&self, _file_name: &str, content: &[u8]) -> Result<Vec<u8>> {
        self.helper.encrypt(&self.public_key, content).await
    }

    async fn decode(&self, _file_name: &str, content: &[u8]) -> Result<Vec<u8>> {
        self.helper.decrypt(&self.private_key, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHelper {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KeyHelper for FakeHelper {
        async fn derive_public(&self, private_key: &[u8]) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("derive_public".to_string());
            Ok([b"pub:", private_key].concat())
        }

        async fn encrypt(&self, public_key: &[u8], content: &[u8]) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("encrypt".to_string());
            Ok([public_key, b":", content].concat())
        }

        async fn decrypt(&self, private_key: &[u8], content: &[u8]) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push("decrypt".to_string());
            let prefix = [private_key, b":"].concat();
            Ok(content
                .strip_prefix(prefix.as_slice())
                .unwrap_or(content)
                .to_vec())
        }
    }

    #[tokio::test]
    async fn encode_then_decode_recovers_plaintext() {
        let helper = Arc::new(FakeHelper::default());
        let transformer = EncryptionTransformer::new(helper, b"private-key".to_vec())
            .await
            .unwrap();

        let encoded = transformer.encode("main.tfstate", b"plaintext").await.unwrap();
        let decoded = transformer.decode("main.tfstate", &encoded).await.unwrap();
        assert_eq!(decoded, b"plaintext");
    }
}
