//! The reversible content transformer seam.

use async_trait::async_trait;
use terraflex_core::Result;

/// A reversible transformation applied to an item's bytes between the
/// storage driver and the HTTP surface. `decode(encode(x)) == x` for any
/// `x` a caller may legally store.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transform content on its way out to storage (e.g. encrypt).
    async fn encode(&self, file_name: &str, content: &[u8]) -> Result<Vec<u8>>;
    /// Transform content on its way back from storage (e.g. decrypt).
    async fn decode(&self, file_name: &str, content: &[u8]) -> Result<Vec<u8>>;
}
