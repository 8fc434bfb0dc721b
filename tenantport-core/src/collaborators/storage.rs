//! Attachment byte storage.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;

use crate::errors::StorageError;

pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Streaming byte store keyed by storage key.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn open(&self, key: &str) -> Result<BlobReader, StorageError>;

    /// Stores everything `reader` yields under `key`, replacing any previous bytes.
    async fn upload(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn download(
        &self,
        key: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, StorageError> {
        let mut reader = self.open(key).await?;
        let copied = tokio::io::copy(&mut reader, writer).await?;
        writer.flush().await?;
        Ok(copied)
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let valid = !key.is_empty()
        && !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Files under a root directory. Flat keys are sharded as `ab/cd/<key>`.
#[derive(Debug, Clone)]
pub struct DiskAttachmentStore {
    root: PathBuf,
}

impl DiskAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        if key.contains('/') || key.len() < 4 || !key.is_char_boundary(4) {
            return Ok(self.root.join(key));
        }
        Ok(self.root.join(&key[0..2]).join(&key[2..4]).join(key))
    }
}

#[async_trait]
impl AttachmentStore for DiskAttachmentStore {
    async fn open(&self, key: &str) -> Result<BlobReader, StorageError> {
        let path = self.path_for(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let partial = path.with_extension("partial");
        let mut file = fs::File::create(&partial).await?;
        let written = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&partial, &path).await?;
        Ok(written)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

/// In-process store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAttachmentStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(key.into(), bytes.into());
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn open(&self, key: &str) -> Result<BlobReader, StorageError> {
        validate_key(key)?;
        let bytes = self
            .get(key)
            .await
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn upload(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, StorageError> {
        validate_key(key)?;
        let mut bytes = Vec::new();
        let written = tokio::io::copy(reader, &mut bytes).await?;
        self.put(key, bytes).await;
        Ok(written)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_paths_are_sharded() {
        let store = DiskAttachmentStore::new("/srv/blobs");
        assert_eq!(
            store.path_for("abcdef123").unwrap(),
            PathBuf::from("/srv/blobs/ab/cd/abcdef123")
        );
        assert_eq!(
            store.path_for("exports/1.zip").unwrap(),
            PathBuf::from("/srv/blobs/exports/1.zip")
        );
        assert!(matches!(
            store.path_for("../outside"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskAttachmentStore::new(dir.path());

        let mut source = Cursor::new(b"payload".to_vec());
        assert_eq!(store.upload("k1234", &mut source).await.unwrap(), 7);
        assert!(store.exists("k1234").await.unwrap());

        let mut out = Vec::new();
        store.download("k1234", &mut out).await.unwrap();
        assert_eq!(out, b"payload");

        store.delete("k1234").await.unwrap();
        assert!(!store.exists("k1234").await.unwrap());
        assert!(matches!(
            store.open("k1234").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryAttachmentStore::new();
        store.put("a", b"1".to_vec()).await;
        let mut out = Vec::new();
        store.download("a", &mut out).await.unwrap();
        assert_eq!(out, b"1");
        assert!(matches!(store.open("missing").await, Err(err) if err.is_not_found()));
    }

    #[tokio::test]
    async fn test_upload_reads_chunked_source() {
        let store = MemoryAttachmentStore::new();
        let mut source = tokio_test::io::Builder::new()
            .read(b"first ")
            .read(b"second")
            .build();
        assert_eq!(store.upload("chunked", &mut source).await.unwrap(), 12);
        assert_eq!(store.get("chunked").await.as_deref(), Some(&b"first second"[..]));
        assert!(matches!(
            store.upload("/abs", &mut Cursor::new(Vec::new())).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
