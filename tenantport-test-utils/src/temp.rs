use std::path::{Path, PathBuf};

/// Scratch directory for archives written during a test; removed on drop.
pub struct TempDir {
    inner: tempfile::TempDir,
}

impl TempDir {
    pub fn new() -> std::io::Result<Self> {
        let inner = tempfile::Builder::new()
            .prefix("tenantport-test-")
            .tempdir()?;
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}
