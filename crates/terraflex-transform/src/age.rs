//! `age`/`age-keygen` backed [`KeyHelper`].

use crate::helper::KeyHelper;
use async_trait::async_trait;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::Stdio;
use terraflex_core::{Error, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Invokes the `age` and `age-keygen` binaries resolved by the dependency
/// resolver.
#[derive(Debug, Clone)]
pub struct AgeKeyHelper {
    age_path: PathBuf,
    keygen_path: PathBuf,
}

impl AgeKeyHelper {
    /// Build a helper bound to the two resolved binary paths.
    #[must_use]
    pub const fn new(age_path: PathBuf, keygen_path: PathBuf) -> Self {
        Self {
            age_path,
            keygen_path,
        }
    }

    async fn run(binary: &std::path::Path, args: &[&str], stdin: &[u8]) -> Result<Vec<u8>> {
        let mut child = Command::new(binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::DependencyMissing(format!("failed to spawn {binary:?}: {e}")))?;

        let mut stdin_handle = child
            .stdin
            .take()
            .expect("stdin was requested as piped");
        let input = stdin.to_vec();
        let writer = tokio::spawn(async move {
            let _ = stdin_handle.write_all(&input).await;
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::DriverFailure(format!("{binary:?} failed: {e}")))?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::DriverFailure(format!("{binary:?} failed: {stderr}")));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl KeyHelper for AgeKeyHelper {
    async fn derive_public(&self, private_key: &[u8]) -> Result<Vec<u8>> {
        let out = Self::run(&self.keygen_path, &["-y"], private_key).await?;
        Ok(trim_trailing_newline(out))
    }

    async fn encrypt(&self, public_key: &[u8], content: &[u8]) -> Result<Vec<u8>> {
        let recipient = String::from_utf8_lossy(public_key).trim().to_string();
        Self::run(&self.age_path, &["--encrypt", "-r", &recipient], content).await
    }

    async fn decrypt(&self, private_key: &[u8], content: &[u8]) -> Result<Vec<u8>> {
        let mut temp =
            tempfile::NamedTempFile::new().map_err(|e| Error::io("age private key temp file", e))?;
        temp.write_all(private_key)
            .map_err(|e| Error::io("age private key temp file", e))?;
        temp.flush()
            .map_err(|e| Error::io("age private key temp file", e))?;

        let path = temp.path().display().to_string();
        Self::run(&self.age_path, &["--decrypt", "-i", &path], content).await
        // `temp` is dropped here regardless of the result above, removing
        // the private key material from disk on every exit path.
    }
}

fn trim_trailing_newline(mut bytes: Vec<u8>) -> Vec<u8> {
    while matches!(bytes.last(), Some(b'\n' | b'\r')) {
        bytes.pop();
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_newlines() {
        assert_eq!(trim_trailing_newline(b"age1abc\n".to_vec()), b"age1abc");
        assert_eq!(trim_trailing_newline(b"age1abc\r\n".to_vec()), b"age1abc");
        assert_eq!(trim_trailing_newline(b"age1abc".to_vec()), b"age1abc");
    }
}
