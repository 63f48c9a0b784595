//! Local file sink for extracted entities.
//!
//! The sink durably stores named byte blobs under a pre-existing base
//! directory. Writes are create-or-truncate with no atomic-replace
//! guarantee: a concurrent reader may observe a partially written file.
//! Concurrent saves to distinct names do not interfere.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::error::{Error, Result};

/// Durable storage for named byte blobs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Storage backed by a local directory.
#[derive(Debug)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Validate that `dir` exists and is a directory. The directory is never
    /// created here; provisioning it is the operator's job.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        let metadata = std::fs::metadata(&dir).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::Configuration(format!(
                    "storage directory {} does not exist",
                    dir.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        if !metadata.is_dir() {
            return Err(Error::Configuration(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(name);
        debug!(path = %path.display(), size = bytes.len(), "writing entity file");
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }
}
