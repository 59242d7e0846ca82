use super::ResourceStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-process store, one map entry per name
///
/// Useful for exercising the stress runner without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Names currently present, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn describe(&self) -> String {
        "memory store".to_string()
    }

    fn validate_name(&self, name: &str) -> std::result::Result<(), String> {
        if name.is_empty() {
            Err("name is empty".to_string())
        } else {
            Ok(())
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.entries.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No such resource: {}", name))
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.entries.lock().remove(name).is_some())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.entries.lock().contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() -> Result<()> {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.write("b", b"2").await?;
        store.write("a", b"1").await?;
        assert_eq!(store.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.read("a").await?, b"1");

        assert!(store.remove("a").await?);
        assert!(!store.remove("a").await?);
        assert!(store.read("a").await.is_err());
        assert_eq!(store.len(), 1);
        Ok(())
    }
}
