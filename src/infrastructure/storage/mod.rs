//! Content-addressed image storage

use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};

use crate::application::errors::StorageError;

/// Stores blobs under `base_dir`, named by the hex SHA-512 of their content.
///
/// Identical bytes always map to the same path, so storing twice is a no-op.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_dir: PathBuf,
}

impl ImageStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        Ok(())
    }

    /// Path that `data` is stored at
    pub fn path_for(&self, data: &[u8]) -> PathBuf {
        let digest = Sha512::digest(data);
        self.base_dir.join(hex::encode(digest))
    }

    /// Write `data` if not already present and return its path
    pub async fn put(&self, data: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(data);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("Image already stored at {}", path.display());
            return Ok(path);
        }

        // Write to a side file first so a crash never leaves a truncated blob
        // under the content name
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        Ok(tokio::fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_content_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));
        store.init().await.unwrap();

        let first = store.put(b"hello image").await.unwrap();
        let second = store.put(b"hello image").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.read(&first).await.unwrap(), b"hello image");

        let other = store.put(b"other image").await.unwrap();
        assert_ne!(first, other);

        let files = std::fs::read_dir(store.base_dir()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn test_file_name_is_hex_sha512() {
        let store = ImageStore::new("images");
        let path = store.path_for(b"");
        let name = path.file_name().unwrap().to_str().unwrap();

        assert_eq!(name.len(), 128);
        assert!(name.starts_with("cf83e1357eefb8bd"));
        assert!(path.starts_with("images"));
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        assert!(matches!(store.read(dir.path().join("nope")).await, Err(StorageError::Io(_))));
    }
}
