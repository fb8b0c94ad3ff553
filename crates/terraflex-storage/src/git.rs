//! Git-branch-locked repository driver: writable and lockable.
//!
//! A lock is a branch named `locks/<key>`. Acquisition pushes that branch;
//! a push failure is the only conflict signal — there is no existence
//! pre-check, since a pre-check followed by a push is itself a race.
//! Every operation shells out to the `git` binary rather than using a
//! library, matching the preference the rest of the workspace shows for
//! mutating network operations.

use crate::traits::{Lockable, Readable, Writable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use terraflex_core::{Error, FromParams, ItemKey, LockBody, Result};
use tokio::process::Command;
use tracing::debug;

/// Key identifying a file relative to the repository root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitKey {
    pub path: String,
}

impl ItemKey for GitKey {
    fn as_string(&self) -> String {
        self.path.clone()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl FromParams for GitKey {
    fn from_params(params: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(params.clone()).map_err(Error::from)
    }
}

fn downcast(key: &dyn ItemKey) -> Result<&GitKey> {
    key.as_any()
        .downcast_ref::<GitKey>()
        .ok_or_else(|| Error::UnsupportedCapability("key is not a GitKey".to_string()))
}

/// A repository cloned at `clone_path`, tracking `origin_url` at `r#ref`.
#[derive(Debug)]
pub struct GitDriver {
    clone_path: PathBuf,
    #[allow(dead_code)]
    origin_url: String,
    r#ref: String,
}

/// Derive the default clone location for a repository that didn't specify
/// `clone_path` explicitly: `<state_dir>/git_storage/<repo_name>`, where
/// `repo_name` is the origin URL's last path segment with any `.git` suffix
/// stripped.
fn default_clone_path(origin_url: &str, state_dir: &std::path::Path) -> PathBuf {
    let repo_name = origin_url
        .rsplit('/')
        .next()
        .unwrap_or(origin_url)
        .trim_end_matches(".git");
    state_dir.join("git_storage").join(repo_name)
}

impl GitDriver {
    /// Clone `origin_url` into `clone_path` if absent, then verify it is a
    /// clean git working tree on `r#ref`. When `clone_path` is `None`, a
    /// stable location under `state_dir` is derived from the origin URL.
    ///
    /// # Errors
    /// Returns `DriverFailure` if the clone or any verification step fails.
    pub async fn new(
        origin_url: String,
        clone_path: Option<PathBuf>,
        r#ref: String,
        state_dir: &std::path::Path,
    ) -> Result<Self> {
        let clone_path = clone_path.unwrap_or_else(|| default_clone_path(&origin_url, state_dir));
        if let Some(parent) = clone_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent.display().to_string(), e))?;
        }

        if !clone_path.exists() {
            let parent = clone_path.parent().unwrap_or(&clone_path);
            run_git(
                parent,
                &["clone", &origin_url, &clone_path.display().to_string()],
            )
            .await?;
        }

        let driver = Self {
            clone_path,
            origin_url,
            r#ref,
        };
        driver.validate().await?;
        Ok(driver)
    }

    async fn validate(&self) -> Result<()> {
        if !self.clone_path.join(".git").exists() {
            return Err(Error::DriverFailure(format!(
                "{} is not a git repository",
                self.clone_path.display()
            )));
        }
        let status = self.git(&["status", "--porcelain"]).await?;
        if !status.trim().is_empty() {
            return Err(Error::DriverFailure(format!(
                "{} is dirty - commit or stash changes before use",
                self.clone_path.display()
            )));
        }
        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.clone_path, args).await
    }

    /// Reset any local changes and return the working tree to `r#ref`.
    async fn clean_workspace(&self) -> Result<()> {
        self.git(&["reset", "--hard"]).await?;
        self.git(&["checkout", &self.r#ref]).await?;
        Ok(())
    }

    async fn commit_and_push(&self, message: &str, branch: &str) -> Result<()> {
        self.git(&["add", "."]).await?;
        self.git(&["commit", "-m", message]).await?;
        self.git(&["push", "origin", branch]).await?;
        Ok(())
    }

    fn state_path(&self, key: &GitKey) -> PathBuf {
        self.clone_path.join(&key.path)
    }

    fn lock_branch(key: &GitKey) -> String {
        format!("locks/{}", key.path)
    }

    fn lock_path(&self, key: &GitKey) -> PathBuf {
        self.clone_path.join("locks").join(format!("{}.lock", key.path))
    }
}

async fn run_git(cwd: &std::path::Path, args: &[&str]) -> Result<String> {
    debug!(?args, ?cwd, "running git");
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .await
        .map_err(|e| Error::DriverFailure(format!("failed to spawn git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::DriverFailure(format!(
            "git {} failed: {stderr}",
            args.join(" ")
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl Readable for GitDriver {
    async fn get_file(&self, key: &dyn ItemKey) -> Result<Vec<u8>> {
        let key = downcast(key)?;
        self.clean_workspace().await?;
        self.git(&["pull", "origin", &self.r#ref]).await?;

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
impl Writable for GitDriver {
    async fn put_file(&self, key: &dyn ItemKey, data: &[u8]) -> Result<()> {
        let key = downcast(key)?;
        self.clean_workspace().await?;
        self.git(&["pull", "origin", &self.r#ref]).await?;

        let path = self.state_path(key);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        self.commit_and_push(&format!("Update state - {}", key.path), &self.r#ref)
            .await
    }

    async fn delete_file(&self, key: &dyn ItemKey) -> Result<()> {
        let key = downcast(key)?;
        self.clean_workspace().await?;
        self.git(&["pull", "origin", &self.r#ref]).await?;

        let path = self.state_path(key);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        self.commit_and_push(&format!("Delete state - {}", key.path), &self.r#ref)
            .await
    }
}

#[async_trait]
impl Lockable for GitDriver {
    async fn read_lock(&self, key: &dyn ItemKey) -> Result<LockBody> {
        let key = downcast(key)?;
        let branch = Self::lock_branch(key);
        self.clean_workspace().await?;
        let _ = self.git(&["branch", "-D", &branch]).await;
        self.git(&[
            "fetch",
            "origin",
            "refs/heads/locks/*:refs/remotes/origin/locks/*",
        ])
        .await?;
        self.git(&["checkout", &branch]).await.map_err(|_| {
            Error::NotFound(format!("lock branch {branch} not found in the repository"))
        })?;

        let path = self.lock_path(key);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        serde_json::from_slice(&raw).map_err(Error::from)
    }

    async fn acquire_lock(&self, key: &dyn ItemKey, data: &LockBody) -> Result<()> {
        let key = downcast(key)?;
        let branch = Self::lock_branch(key);
        self.clean_workspace().await?;
        let _ = self.git(&["branch", "-D", &branch]).await;
        self.git(&["pull", "origin", &self.r#ref]).await?;
        self.git(&["checkout", "-b", &branch]).await?;

        let path = self.lock_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent.display().to_string(), e))?;
        }
        let body = serde_json::to_vec(data).map_err(Error::from)?;
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;

        self.git(&["add", &path.display().to_string()]).await?;
        self.git(&["commit", "-m", &format!("Locking state - id {}", data.id)])
            .await?;

        // The push itself is the only conflict signal: two callers that
        // both reach this point race on the same branch name, and only
        // one push can win.
        self.git(&["push", "origin", &branch])
            .await
            .map_err(|_| Error::lock_conflict("push of lock branch was rejected", data.id.clone()))?;
        Ok(())
    }

    async fn release_lock(&self, key: &dyn ItemKey) -> Result<()> {
        let key = downcast(key)?;
        let branch = Self::lock_branch(key);
        self.git(&["push", "origin", "--delete", &branch]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_rejects_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        let not_repo = dir.path().join("not-a-repo");
        tokio::fs::create_dir_all(&not_repo).await.unwrap();
        // No .git directory and no remote to clone from - clone will fail
        // and surface as a DriverFailure rather than panicking.
        let result = GitDriver::new(
            "file:///nonexistent/origin.git".to_string(),
            Some(not_repo),
            "main".to_string(),
            dir.path(),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn lock_branch_name_matches_key() {
        let key = GitKey {
            path: "main.tfstate".to_string(),
        };
        assert_eq!(GitDriver::lock_branch(&key), "locks/main.tfstate");
    }

    #[test]
    fn default_clone_path_derives_repo_name_from_origin() {
        let state_dir = std::path::Path::new("/state");
        assert_eq!(
            default_clone_path("https://example.com/org/my-repo.git", state_dir),
            state_dir.join("git_storage").join("my-repo")
        );
        assert_eq!(
            default_clone_path("git@example.com:org/my-repo", state_dir),
            state_dir.join("git_storage").join("my-repo")
        );
    }

    /// A bare repository standing in for a remote, plus one helper to clone
    /// a fresh working copy of it.
    struct LocalOrigin {
        url: String,
    }

    impl LocalOrigin {
        async fn new(dir: &std::path::Path) -> Self {
            let bare = dir.join("origin.git");
            tokio::fs::create_dir_all(&bare).await.unwrap();
            run_git(&bare, &["init", "--bare", "-b", "main"]).await.unwrap();

            let seed = dir.join("seed");
            run_git(dir, &["clone", &bare.display().to_string(), &seed.display().to_string()])
                .await
                .unwrap();
            run_git(&seed, &["config", "user.email", "test@example.com"]).await.unwrap();
            run_git(&seed, &["config", "user.name", "test"]).await.unwrap();
            tokio::fs::write(seed.join("README"), b"seed").await.unwrap();
            run_git(&seed, &["add", "."]).await.unwrap();
            run_git(&seed, &["commit", "-m", "seed"]).await.unwrap();
            run_git(&seed, &["push", "origin", "main"]).await.unwrap();

            Self {
                url: bare.display().to_string(),
            }
        }

        async fn clone_driver(&self, dir: &std::path::Path, name: &str) -> GitDriver {
            let path = dir.join(name);
            let driver = GitDriver::new(self.url.clone(), Some(path.clone()), "main".to_string(), dir)
                .await
                .unwrap();
            run_git(&path, &["config", "user.email", "test@example.com"]).await.unwrap();
            run_git(&path, &["config", "user.name", "test"]).await.unwrap();
            driver
        }
    }

    #[tokio::test]
    async fn competing_lock_push_loses_the_race() {
        let dir = tempfile::tempdir().unwrap();
        let origin = LocalOrigin::new(dir.path()).await;
        let winner = origin.clone_driver(dir.path(), "winner").await;
        let loser = origin.clone_driver(dir.path(), "loser").await;
        let key = GitKey {
            path: "main.tfstate".to_string(),
        };
        let body = LockBody {
            id: "l1".to_string(),
            operation: "OperationTypeApply".to_string(),
            who: "alice@host".to_string(),
            version: "1.7.0".to_string(),
            created: "2026-07-27T00:00:00Z".to_string(),
        };

        winner.acquire_lock(&key, &body).await.unwrap();

        let err = loser.acquire_lock(&key, &body).await.unwrap_err();
        assert!(matches!(err, Error::LockConflict { .. }));
    }
}
