//! The state/lock controller: looks stacks up by name, enforces driver
//! capability and lock ownership, and folds the transformer chain around
//! driver I/O.

use crate::stack::Stack;
use std::collections::HashMap;
use std::sync::Arc;
use terraflex_core::{Data, Error, LockBody, Result};
use tokio::sync::Mutex;

/// Maps stack name to its (mutex-guarded) [`Stack`] and serializes
/// operations on each stack.
///
/// The mutex is not a correctness requirement of the wire protocol — the
/// lock protocol is — but it prevents interleaved in-process requests
/// from racing a driver's working tree, which matters most for the
/// repository-backed driver.
#[derive(Clone, Default)]
pub struct StateLockController {
    stacks: HashMap<String, Arc<Mutex<Stack>>>,
}

impl StateLockController {
    /// Build a controller over the given set of stacks.
    #[must_use]
    pub fn new(stacks: HashMap<String, Stack>) -> Self {
        Self {
            stacks: stacks
                .into_iter()
                .map(|(name, stack)| (name, Arc::new(Mutex::new(stack))))
                .collect(),
        }
    }

    fn lookup(&self, stack_name: &str) -> Result<Arc<Mutex<Stack>>> {
        self.stacks
            .get(stack_name)
            .cloned()
            .ok_or_else(|| Error::UnknownStack(stack_name.to_string()))
    }

    /// Fetch the current state document, or `None` if nothing has been
    /// written yet.
    pub async fn get(&self, stack_name: &str) -> Result<Option<Data>> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        let raw = match stack.driver.as_readable().get_file(stack.key.as_ref()).await {
            Ok(bytes) => bytes,
            Err(Error::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };

        let file_name = stack.key.as_string();
        let mut content = raw;
        for transformer in stack.transformers.iter().rev() {
            content = transformer.decode(&file_name, &content).await?;
        }

        let value = serde_json::from_slice(&content)?;
        Ok(Some(value))
    }

    /// Overwrite the state document, provided `lock_id` matches the
    /// currently held lock.
    pub async fn put(&self, stack_name: &str, lock_id: &str, value: &Data) -> Result<()> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        let writable = stack
            .driver
            .as_writable()
            .ok_or_else(|| Error::UnsupportedCapability(format!("stack {stack_name} is read-only")))?;
        Self::check_lock(&stack, lock_id).await?;

        let file_name = stack.key.as_string();
        let mut content = serde_json::to_vec(value)?;
        for transformer in &stack.transformers {
            content = transformer.encode(&file_name, &content).await?;
        }

        writable.put_file(stack.key.as_ref(), &content).await
    }

    /// Remove the state document, provided `lock_id` matches the
    /// currently held lock.
    pub async fn delete(&self, stack_name: &str, lock_id: &str) -> Result<()> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        let writable = stack
            .driver
            .as_writable()
            .ok_or_else(|| Error::UnsupportedCapability(format!("stack {stack_name} is read-only")))?;
        Self::check_lock(&stack, lock_id).await?;

        writable.delete_file(stack.key.as_ref()).await
    }

    /// Read the currently held lock, if any.
    ///
    /// # Errors
    /// Returns `UnsupportedCapability` if the driver doesn't support
    /// locking at all.
    pub async fn read_lock(&self, stack_name: &str) -> Result<Option<LockBody>> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        let lockable = stack
            .driver
            .as_lockable()
            .ok_or_else(|| Error::UnsupportedCapability(format!("stack {stack_name} does not support locking")))?;

        match lockable.read_lock(stack.key.as_ref()).await {
            Ok(body) => Ok(Some(body)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Acquire a lock. A no-op on drivers that don't support locking —
    /// locking is best-effort for non-lockable media.
    pub async fn lock(&self, stack_name: &str, body: &LockBody) -> Result<()> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        match stack.driver.as_lockable() {
            Some(lockable) => lockable.acquire_lock(stack.key.as_ref(), body).await,
            None => Ok(()),
        }
    }

    /// Release the lock. A no-op on drivers that don't support locking.
    pub async fn unlock(&self, stack_name: &str) -> Result<()> {
        let handle = self.lookup(stack_name)?;
        let stack = handle.lock().await;

        match stack.driver.as_lockable() {
            Some(lockable) => lockable.release_lock(stack.key.as_ref()).await,
            None => Ok(()),
        }
    }

    /// Validate that `lock_id` matches the lock currently held on this
    /// stack.
    ///
    /// Drivers that don't support locking at all reject `Put`/`Delete`
    /// with `UnsupportedCapability` rather than the placeholder-lock
    /// behavior a reader might expect from a writable-but-unlockable
    /// medium: a synthetic lock would let an unauthenticated caller
    /// write state without ever having proven it holds anything.
    async fn check_lock(stack: &Stack, lock_id: &str) -> Result<LockBody> {
        let lockable = stack.driver.as_lockable().ok_or_else(|| {
            Error::UnsupportedCapability("stack has no locking medium to check against".to_string())
        })?;

        match lockable.read_lock(stack.key.as_ref()).await {
            Ok(held) if held.id == lock_id => Ok(held),
            Ok(_) => Err(Error::lock_conflict("lock is held by a different ID", lock_id)),
            Err(Error::NotFound(_)) => Err(Error::lock_conflict("no lock held", lock_id)),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for StateLockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateLockController")
            .field("stacks", &self.stacks.keys().collect::<Vec<_>>())
            .finish()
    }
}
