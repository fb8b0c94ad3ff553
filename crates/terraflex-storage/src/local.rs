//! Local-directory storage driver: writable and lockable.

use crate::traits::{Lockable, Readable, Writable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use terraflex_core::{Error, FromParams, ItemKey, LockBody, Result};

/// Key identifying a file relative to the driver's root, `folders/allowed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalKey {
    pub path: String,
}

impl ItemKey for LocalKey {
    fn as_string(&self) -> String {
        self.path.clone()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl FromParams for LocalKey {
    fn from_params(params: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(params.clone()).map_err(Error::from)
    }
}

fn downcast(key: &dyn ItemKey) -> Result<&LocalKey> {
    key.as_any()
        .downcast_ref::<LocalKey>()
        .ok_or_else(|| Error::UnsupportedCapability("key is not a LocalKey".to_string()))
}

/// Stores state and locks as plain files under `folder`.
#[derive(Debug)]
pub struct LocalDriver {
    folder: PathBuf,
    #[cfg_attr(not(unix), allow(dead_code))]
    file_mode: u32,
}

impl LocalDriver {
    /// Create the backing directory (mode `folder_mode` on unix) if it
    /// does not already exist.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(folder: impl Into<PathBuf>, folder_mode: u32, file_mode: u32) -> Result<Self> {
        let folder = folder.into();
        if !folder.exists() {
            std::fs::create_dir_all(&folder).map_err(|e| Error::io(folder.display().to_string(), e))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&folder, std::fs::Permissions::from_mode(folder_mode))
                    .map_err(|e| Error::io(folder.display().to_string(), e))?;
            }
            #[cfg(not(unix))]
            {
                let _ = folder_mode;
            }
        }
        Ok(Self { folder, file_mode })
    }

    fn state_path(&self, key: &LocalKey) -> PathBuf {
        self.folder.join(&key.path)
    }

    fn lock_path(&self, key: &LocalKey) -> PathBuf {
        self.folder.join("locks").join(format!("{}.lock", key.path))
    }

    async fn apply_file_mode(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(self.file_mode))
                .await
                .map_err(|e| Error::io(path.display().to_string(), e))?;
        }
        #[cfg(not(unix))]
        {
            let _ = path;
        }
        Ok(())
    }
}

#[async_trait]
impl Readable for LocalDriver {
    async fn get_file(&self, key: &dyn ItemKey) -> Result<Vec<u8>> {
        let key = downcast(key)?;
        let path = self.state_path(key);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::io(path.display().to_string(), e)
            }
        })
    }
}

#[async_trait]
impl Writable for LocalDriver {
    async fn put_file(&self, key: &dyn ItemKey, data: &[u8]) -> Result<()> {
        let key = downcast(key)?;
        let path = self.state_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent.display().to_string(), e))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        self.apply_file_mode(&path).await
    }

    async fn delete_file(&self, key: &dyn ItemKey) -> Result<()> {
        let key = downcast(key)?;
        let path = self.state_path(key);
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::io(path.display().to_string(), e)
            }
        })
    }
}

#[async_trait]
impl Lockable for LocalDriver {
    async fn read_lock(&self, key: &dyn ItemKey) -> Result<LockBody> {
        let key = downcast(key)?;
        let path = self.lock_path(key);
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::io(path.display().to_string(), e)
            }
        })?;
        serde_json::from_slice(&raw).map_err(Error::from)
    }

    async fn acquire_lock(&self, key: &dyn ItemKey, data: &LockBody) -> Result<()> {
        let key = downcast(key)?;
        let path = self.lock_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent.display().to_string(), e))?;
        }
        let body = serde_json::to_vec(data).map_err(Error::from)?;

        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::lock_conflict(
                        format!("lock already held at {}", path.display()),
                        data.id.clone(),
                    )
                } else {
                    Error::io(path.display().to_string(), e)
                }
            })?;
        file.write_all(&body)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        self.apply_file_mode(&path).await
    }

    async fn release_lock(&self, key: &dyn ItemKey) -> Result<()> {
        let key = downcast(key)?;
        let path = self.lock_path(key);
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::io(path.display().to_string(), e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> LocalKey {
        LocalKey { path: path.to_string() }
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalDriver::new(dir.path(), 0o700, 0o600).unwrap();
        let k = key("main.tfstate");
        driver.put_file(&k, b"hello").await.unwrap();
        let data = driver.get_file(&k).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn get_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalDriver::new(dir.path(), 0o700, 0o600).unwrap();
        let err = driver.get_file(&key("missing.tfstate")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn second_lock_acquisition_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalDriver::new(dir.path(), 0o700, 0o600).unwrap();
        let k = key("main.tfstate");
        let body = LockBody {
            id: "l1".to_string(),
            operation: "OperationTypeApply".to_string(),
            who: "alice".to_string(),
            version: "1.0.0".to_string(),
            created: "2026-07-27T00:00:00Z".to_string(),
        };
        driver.acquire_lock(&k, &body).await.unwrap();
        let err = driver.acquire_lock(&k, &body).await.unwrap_err();
        assert!(matches!(err, Error::LockConflict { .. }));
    }

    #[tokio::test]
    async fn release_then_reacquire_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalDriver::new(dir.path(), 0o700, 0o600).unwrap();
        let k = key("main.tfstate");
        let body = LockBody {
            id: "l1".to_string(),
            operation: "OperationTypeApply".to_string(),
            who: "alice".to_string(),
            version: "1.0.0".to_string(),
            created: "2026-07-27T00:00:00Z".to_string(),
        };
        driver.acquire_lock(&k, &body).await.unwrap();
        driver.release_lock(&k).await.unwrap();
        driver.acquire_lock(&k, &body).await.unwrap();
    }
}
