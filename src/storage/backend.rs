//! Artifact store trait.
//!
//! The vault persists a handful of opaque string artifacts (verification token, encrypted
//! state, legacy markers). Backends only move strings around; they never see plaintext.
//! - `FileStore` - one file per artifact in the data directory (default)
//! - `MemoryStore` - in-process map, used by tests

use crate::Result;

/// Trait for backends that persist the vault's key/value artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Read an artifact, or `None` if it has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write every entry, replacing existing values.
    ///
    /// Implementations must not expose a partially written value for any key. When the
    /// backend cannot make the whole batch atomic it must at least finish preparing every
    /// entry before replacing the first one.
    fn put_all(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove an artifact. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;

    /// Write a single artifact.
    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.put_all(&[(key, value)])
    }

    /// Check whether an artifact exists.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
