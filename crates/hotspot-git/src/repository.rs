use std::path::Path;

use hotspot_core::{Error, Result};

/// A thin wrapper around `gix::Repository` for read-only history access.
pub struct GitRepository {
    inner: gix::Repository,
}

impl GitRepository {
    /// Open an existing Git repository at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = gix::open(path).map_err(|e| {
            Error::Repository(format!("failed to open repository at {}: {e}", path.display()))
        })?;

        Ok(Self { inner: repo })
    }

    /// Check that `path` exists and is openable as a Git repository, without
    /// keeping it open.
    pub fn validate(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::InvalidInput(format!(
                "path does not exist: {}",
                path.display()
            )));
        }

        gix::open(path).map_err(|e| {
            Error::Repository(format!("not a git repository at {}: {e}", path.display()))
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.git_dir())
    }

    pub fn inner(&self) -> &gix::Repository {
        &self.inner
    }

    /// The HEAD commit hash, or `None` if the repository has no commits yet.
    pub fn head_hash(&self) -> Result<Option<String>> {
        let head = self
            .inner
            .head()
            .map_err(|e| Error::Repository(format!("failed to get HEAD: {e}")))?;

        if head.is_unborn() {
            return Ok(None);
        }

        match head.into_peeled_id() {
            Ok(id) => Ok(Some(id.to_hex().to_string())),
            Err(e) => Err(Error::Repository(format!("failed to peel HEAD: {e}"))),
        }
    }
}
