//! File storage backend.
//!
//! Each artifact lives in its own file named after its key. Writes go to a temporary file
//! in the same directory and are renamed over the destination, so readers only ever see
//! the previous or the next complete value.

use super::VERIFICATION_KEY;
use super::backend::ArtifactStore;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Required permissions for artifact files (Unix: 0600, owner read/write only).
#[cfg(unix)]
pub const ARTIFACT_FILE_MODE: u32 = 0o600;

/// Storage backend that keeps one file per artifact.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidInput(format!("Invalid artifact key: {}", key)));
        }
        Ok(self.root.join(key))
    }

    fn stage(&self, value: &str) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(ARTIFACT_FILE_MODE))?;
        }
        Ok(tmp)
    }
}

/// Rename order inside one batch: the verification token goes last. A crash before its
/// rename leaves the old token, which still unlocks with the old password; state already
/// sealed under the new password then fails to decrypt instead of being misread.
fn commit_rank(key: &str) -> u8 {
    u8::from(key == VERIFICATION_KEY)
}

impl ArtifactStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        // Stage everything before the first rename.
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            staged.push((*key, self.path_for(key)?, self.stage(value)?));
        }
        staged.sort_by_key(|(key, _, _)| commit_rank(key));
        for (_, path, tmp) in staged {
            tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
