//! A single named unit of state: its driver and its transformer pipeline.

use std::sync::Arc;
use terraflex_core::ItemKey;
use terraflex_storage::DriverHandle;
use terraflex_transform::Transformer;

/// One configured stack: a storage target plus the ordered chain of
/// transforms applied between the driver and the HTTP surface.
pub struct Stack {
    pub(crate) driver: DriverHandle,
    pub(crate) key: Arc<dyn ItemKey>,
    pub(crate) transformers: Vec<Arc<dyn Transformer>>,
}

impl Stack {
    /// Build a stack from its resolved driver, item key (used for both
    /// the state object and its associated lock), and transformer chain
    /// (applied in this order on write, reversed on read).
    #[must_use]
    pub fn new(driver: DriverHandle, key: Arc<dyn ItemKey>, transformers: Vec<Arc<dyn Transformer>>) -> Self {
        Self {
            driver,
            key,
            transformers,
        }
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("driver", &self.driver)
            .field("key", &self.key.as_string())
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
