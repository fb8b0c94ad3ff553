//! Capability traits and the [`DriverHandle`] that exposes them uniformly.

use async_trait::async_trait;
use std::sync::Arc;
use terraflex_core::{ItemKey, LockBody, Result};

/// A driver that can read items.
#[async_trait]
pub trait Readable: Send + Sync {
    /// Fetch the bytes stored at `key`.
    async fn get_file(&self, key: &dyn ItemKey) -> Result<Vec<u8>>;
}

/// A driver that can read and write items. Every writable driver is
/// readable.
#[async_trait]
pub trait Writable: Readable {
    /// Write `data` to `key`, creating parent structure as needed.
    async fn put_file(&self, key: &dyn ItemKey, data: &[u8]) -> Result<()>;
    /// Remove the item at `key`.
    async fn delete_file(&self, key: &dyn ItemKey) -> Result<()>;
}

/// A driver that additionally supports advisory locking. Every lockable
/// driver is writable.
#[async_trait]
pub trait Lockable: Writable {
    /// Read the lock currently held on `key`, if any.
    async fn read_lock(&self, key: &dyn ItemKey) -> Result<LockBody>;
    /// Acquire the lock on `key`. The push/commit (or equivalent) that
    /// performs this is the sole linearization point — implementations
    /// must not pre-check existence and must treat a failed acquisition
    /// attempt as the conflict signal itself.
    async fn acquire_lock(&self, key: &dyn ItemKey, data: &LockBody) -> Result<()>;
    /// Release the lock on `key`.
    async fn release_lock(&self, key: &dyn ItemKey) -> Result<()>;
}

/// The capability a constructed driver actually has, as a closed set of
/// trait objects rather than a trait hierarchy a caller must downcast
/// through. Callers feature-detect by matching this enum instead of
/// probing with `Any::downcast`.
#[derive(Clone)]
pub enum DriverHandle {
    /// Read-only driver (e.g. environment variables).
    Readable(Arc<dyn Readable>),
    /// Read-write driver with no locking support.
    Writable(Arc<dyn Writable>),
    /// Read-write driver with locking support.
    Lockable(Arc<dyn Lockable>),
}

impl DriverHandle {
    /// Every driver is at least readable.
    #[must_use]
    pub fn as_readable(&self) -> Arc<dyn Readable> {
        match self {
            Self::Readable(r) => r.clone(),
            Self::Writable(w) => w.clone(),
            Self::Lockable(l) => l.clone(),
        }
    }

    /// Present only if the driver is writable or better.
    #[must_use]
    pub fn as_writable(&self) -> Option<Arc<dyn Writable>> {
        match self {
            Self::Readable(_) => None,
            Self::Writable(w) => Some(w.clone()),
            Self::Lockable(l) => Some(l.clone()),
        }
    }

    /// Present only if the driver supports locking.
    #[must_use]
    pub fn as_lockable(&self) -> Option<Arc<dyn Lockable>> {
        match self {
            Self::Lockable(l) => Some(l.clone()),
            Self::Readable(_) | Self::Writable(_) => None,
        }
    }
}

impl std::fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Readable(_) => "Readable",
            Self::Writable(_) => "Writable",
            Self::Lockable(_) => "Lockable",
        };
        f.debug_tuple("DriverHandle").field(&kind).finish()
    }
}
