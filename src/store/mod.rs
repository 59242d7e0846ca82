//! # Resource Stores
//!
//! The stress runner works against a byte-addressable namespace of named
//! resources. A store maps each name onto its own slot (a file in a directory,
//! an entry in a map); two distinct names never alias the same slot.
//!
//! Removal is idempotent: removing a name that does not exist is not an error,
//! which lets cleanup run over every unit whether or not its write happened.

use anyhow::Result;
use async_trait::async_trait;

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Human-readable description used in logs and errors
    fn describe(&self) -> String;

    /// Reject names this store cannot map onto a private slot
    ///
    /// Returns a short reason when the name is refused.
    fn validate_name(&self, _name: &str) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Key under which `name` is stored
    ///
    /// Two names with equal keys alias the same slot. The runner compares
    /// keys, not names, when checking that units never share a resource.
    fn slot_key(&self, name: &str) -> String {
        name.to_string()
    }

    /// Make the store ready for use (e.g. create its directory)
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Create or overwrite `name` with `bytes`
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read the full contents of `name`
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove `name`; returns whether something was removed
    async fn remove(&self, name: &str) -> Result<bool>;

    async fn exists(&self, name: &str) -> Result<bool>;
}
