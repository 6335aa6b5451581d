//! Ordered, coalescing persistence of state snapshots.
//!
//! Reduction never waits on encryption. Snapshots are handed to a background task through
//! a `watch` channel that only ever holds the newest one; the task runs at most one save at a
//! time and, when it finishes, picks up whatever is newest. Intermediate snapshots submitted
//! during a save are skipped, so a slow save of an old state can never land after a newer one.
//!
//! The vault and secret sit behind one async mutex shared by the save task and
//! [`Persister::rotate_password`], so a rotation never overlaps a save.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::models::AppState;
use crate::vault::{Bundle, MasterSecret, Vault};
use crate::{Error, Result};

/// The vault plus the secret saves are encrypted with.
struct SaveSlot {
    vault: Vault,
    secret: MasterSecret,
}

/// Highest submission persisted so far.
#[derive(Debug, Clone, Default)]
struct SaveProgress {
    seq: u64,
    error: Option<String>,
}

type Pending = Option<(u64, Arc<AppState>)>;

/// Handle to the background save task.
pub struct Persister {
    latest: watch::Sender<Pending>,
    progress: watch::Receiver<SaveProgress>,
    slot: Arc<Mutex<SaveSlot>>,
    worker: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl Persister {
    /// Start the save task. Must be called inside a tokio runtime.
    pub fn spawn(vault: Vault, secret: MasterSecret) -> Self {
        let (latest, pending) = watch::channel(None);
        let (progress_tx, progress) = watch::channel(SaveProgress::default());
        let slot = Arc::new(Mutex::new(SaveSlot { vault, secret }));
        let worker = tokio::spawn(run(pending, Arc::clone(&slot), progress_tx));
        Self {
            latest,
            progress,
            slot,
            worker: Some(worker),
            next_seq: 0,
        }
    }

    /// Queue `state` for saving, replacing any snapshot not yet picked up.
    ///
    /// Returns the submission's sequence number.
    pub fn submit(&mut self, state: Arc<AppState>) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        if self.latest.send_replace(Some((seq, state))).is_some() {
            tracing::trace!(seq, "superseded an unsaved snapshot");
        }
        seq
    }

    /// Wait until the newest submitted snapshot is persisted.
    pub async fn flush(&self) -> Result<()> {
        let target = self.next_seq;
        let mut progress = self.progress.clone();
        let reached = progress
            .wait_for(|p| p.seq >= target)
            .await
            .map_err(|_| Error::Other("save task stopped".to_string()))?;
        match &reached.error {
            Some(message) => Err(Error::Other(format!("save failed: {}", message))),
            None => Ok(()),
        }
    }

    /// Re-encrypt both artifacts under `new_password` and switch future saves to it.
    ///
    /// Pending saves are flushed first, and the save slot is held for the whole rotation.
    pub async fn rotate_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        self.flush().await?;
        let slot = Arc::clone(&self.slot).lock_owned().await;
        let old = old_password.to_string();
        let new = new_password.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut slot = slot;
            slot.secret = slot.vault.rotate_password(&old, &new)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Other(format!("rotation task failed: {}", e)))?
    }

    /// Export the persisted artifacts once every submitted snapshot is saved.
    pub async fn export_bundle(&self) -> Result<Bundle> {
        self.flush().await?;
        let slot = self.slot.lock().await;
        slot.vault.export_bundle()
    }

    /// Flush and stop the save task.
    pub async fn close(self) -> Result<()> {
        let flushed = self.flush().await;
        let Persister { latest, worker, .. } = self;
        // Dropping the sender ends the task's receive loop.
        drop(latest);
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| Error::Other(format!("save task failed: {}", e)))?;
        }
        flushed
    }
}

async fn run(
    mut pending: watch::Receiver<Pending>,
    slot: Arc<Mutex<SaveSlot>>,
    progress: watch::Sender<SaveProgress>,
) {
    while pending.changed().await.is_ok() {
        let Some((seq, state)) = pending.borrow_and_update().clone() else {
            continue;
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        let saved = tokio::task::spawn_blocking(move || {
            let mut guard = guard;
            let SaveSlot { vault, secret } = &mut *guard;
            vault.save_state(secret, &state)
        })
        .await;

        let error = match saved {
            Ok(Ok(())) => {
                tracing::debug!(seq, "state saved");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(seq, error = %e, "state save failed");
                Some(e.to_string())
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "state save task panicked");
                Some(e.to_string())
            }
        };
        progress.send_replace(SaveProgress { seq, error });
    }
    tracing::debug!("save task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn named(name: &str) -> Arc<AppState> {
        Arc::new(AppState {
            agent_name: name.to_string(),
            ..Default::default()
        })
    }

    fn slow_vault(store: &MemoryStore) -> (Vault, MasterSecret) {
        let mut vault = Vault::new(Box::new(store.clone()));
        let secret = vault.create_password("pw").unwrap();
        (vault, secret)
    }

    fn persisted_name(store: &MemoryStore, password: &str) -> String {
        let vault = Vault::new(Box::new(store.clone()));
        let secret = vault.unlock(password).unwrap();
        vault.load_state(&secret).unwrap()["agentName"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_final_blob_is_newest_submission() {
        let store = MemoryStore::new().with_write_delay(Duration::from_millis(30));
        let (vault, secret) = slow_vault(&store);
        let mut persister = Persister::spawn(vault, secret);
        for i in 1..=10 {
            persister.submit(named(&format!("v{}", i)));
        }
        persister.flush().await.unwrap();
        assert_eq!(persisted_name(&store, "pw"), "v10");
        persister.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_submissions_during_save_are_coalesced() {
        let store = MemoryStore::new().with_write_delay(Duration::from_millis(50));
        let (vault, secret) = slow_vault(&store);
        let mut persister = Persister::spawn(vault, secret);
        persister.submit(named("first"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        for i in 0..5 {
            persister.submit(named(&format!("mid{}", i)));
        }
        let last = persister.submit(named("last"));
        assert_eq!(last, 7);
        persister.close().await.unwrap();
        assert_eq!(persisted_name(&store, "pw"), "last");
    }

    #[tokio::test]
    async fn test_flush_without_submissions_returns() {
        let store = MemoryStore::new();
        let (vault, secret) = slow_vault(&store);
        let persister = Persister::spawn(vault, secret);
        persister.flush().await.unwrap();
        persister.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rotation_switches_future_saves() {
        let store = MemoryStore::new();
        let (vault, secret) = slow_vault(&store);
        let mut persister = Persister::spawn(vault, secret);
        persister.submit(named("before"));
        persister.rotate_password("pw", "new-pw").await.unwrap();
        assert_eq!(persisted_name(&store, "new-pw"), "before");
        persister.submit(named("after"));
        persister.close().await.unwrap();
        assert_eq!(persisted_name(&store, "new-pw"), "after");
    }

    #[tokio::test]
    async fn test_rotation_with_wrong_password_keeps_old() {
        let store = MemoryStore::new();
        let (vault, secret) = slow_vault(&store);
        let mut persister = Persister::spawn(vault, secret);
        let err = persister.rotate_password("nope", "new").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        persister.submit(named("still-old"));
        persister.close().await.unwrap();
        assert_eq!(persisted_name(&store, "pw"), "still-old");
    }
}
