use super::ResourceStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Store backed by a directory; each name is a file directly inside it
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl ResourceStore for FsStore {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn validate_name(&self, name: &str) -> std::result::Result<(), String> {
        if name.is_empty() {
            return Err("name is empty".to_string());
        }
        // Only a single normal path component keeps every name inside the
        // root and distinct names on distinct files.
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err("name must be a plain file name".to_string()),
        }
    }

    /// Case-folded, since the directory may live on a case-insensitive
    /// filesystem where `A.txt` and `a.txt` are the same file
    fn slot_key(&self, name: &str) -> String {
        name.to_lowercase()
    }

    async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create directory {:?}", self.root))?;
        debug!("Prepared store directory {:?}", self.root);
        Ok(())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_of(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_of(name);
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to stat {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slot_key_ignores_case() {
        let store = FsStore::new("/tmp/unused");
        assert_eq!(store.slot_key("Unit_0.TXT"), store.slot_key("unit_0.txt"));
        assert_ne!(store.slot_key("unit_0.txt"), store.slot_key("unit_1.txt"));
    }

    #[test]
    fn test_validate_name() {
        let store = FsStore::new("/tmp/unused");
        assert!(store.validate_name("unit_0.txt").is_ok());
        assert!(store.validate_name("").is_err());
        assert!(store.validate_name("../escape.txt").is_err());
        assert!(store.validate_name("nested/unit.txt").is_err());
        assert!(store.validate_name("/abs.txt").is_err());
        assert!(store.validate_name("..").is_err());
    }

    #[tokio::test]
    async fn test_write_read_remove() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FsStore::new(dir.path().join("scratch"));
        store.prepare().await?;

        store.write("a.txt", b"hello").await?;
        assert!(store.exists("a.txt").await?);
        assert_eq!(store.read("a.txt").await?, b"hello");

        store.write("a.txt", b"bye").await?;
        assert_eq!(store.read("a.txt").await?, b"bye");

        assert!(store.remove("a.txt").await?);
        assert!(!store.exists("a.txt").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FsStore::new(dir.path());
        assert!(!store.remove("never-written.txt").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_missing_fails() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.read("missing.txt").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
