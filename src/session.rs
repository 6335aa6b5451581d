//! An unlocked vault paired with a running engine.
//!
//! Opening a session unlocks the vault, hydrates the persisted state, runs the daily rollover
//! and starts the [`Persister`]. Every accepted action is reduced synchronously and its
//! snapshot submitted for saving.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::engine::{Action, Clock, Engine};
use crate::hydrate;
use crate::models::AppState;
use crate::persist::Persister;
use crate::vault::{Bundle, MasterSecret, Vault};
use crate::{Error, Result};

/// Run blocking vault work (key derivation) off the async executor.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Other(format!("vault task failed: {}", e)))?
}

pub struct Session {
    engine: Engine,
    persister: Persister,
    rolled_over: NaiveDate,
}

impl Session {
    /// Unlock an existing vault.
    pub async fn open(vault: Vault, password: &str, clock: Box<dyn Clock>) -> Result<Self> {
        Self::open_with(vault, password, clock, None).await
    }

    /// Unlock an existing vault with a reproducible RNG when `seed` is given.
    pub async fn open_with(
        vault: Vault,
        password: &str,
        clock: Box<dyn Clock>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let password = password.to_string();
        let (vault, secret, raw) = blocking(move || {
            let secret = vault.unlock(&password)?;
            let raw = vault.load_state(&secret)?;
            Ok((vault, secret, raw))
        })
        .await?;
        Ok(Self::start(vault, secret, &raw, clock, seed))
    }

    /// Set the first password on an empty vault and open it.
    pub async fn create(mut vault: Vault, password: &str, clock: Box<dyn Clock>) -> Result<Self> {
        let password = password.to_string();
        let (vault, secret) = blocking(move || {
            let secret = vault.create_password(&password)?;
            Ok((vault, secret))
        })
        .await?;
        Ok(Self::start(vault, secret, &serde_json::Value::Null, clock, None))
    }

    fn start(
        vault: Vault,
        secret: MasterSecret,
        raw: &serde_json::Value,
        clock: Box<dyn Clock>,
        seed: Option<u64>,
    ) -> Self {
        let (state, report) = hydrate::hydrate_with_report(raw);
        if !report.is_clean() {
            tracing::warn!(dropped = report.dropped.len(), "hydration dropped invalid items");
        }
        let mut engine = match seed {
            Some(seed) => Engine::with_seed(state, clock, seed),
            None => Engine::new(state, clock),
        };
        let rolled_over = engine.clock().today();
        let changed = engine.apply(&Action::InitDailyState);

        let mut persister = Persister::spawn(vault, secret);
        if changed || !report.is_clean() {
            persister.submit(engine.snapshot());
        }
        Self {
            engine,
            persister,
            rolled_over,
        }
    }

    /// Reduce `action` and queue the new state for saving. Returns whether anything changed.
    ///
    /// The first dispatch of a new calendar day runs the daily rollover first.
    pub fn dispatch(&mut self, action: &Action) -> bool {
        let mut changed = false;
        let today = self.engine.clock().today();
        if today != self.rolled_over {
            self.rolled_over = today;
            changed |= self.engine.apply(&Action::InitDailyState);
        }
        changed |= self.engine.apply(action);
        if changed {
            self.persister.submit(self.engine.snapshot());
        }
        changed
    }

    pub fn state(&self) -> &Arc<AppState> {
        self.engine.state()
    }

    /// Wait until the current state is persisted.
    pub async fn flush(&self) -> Result<()> {
        self.persister.flush().await
    }

    pub async fn rotate_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        self.persister.rotate_password(old_password, new_password).await
    }

    pub async fn export_bundle(&self) -> Result<Bundle> {
        self.persister.export_bundle().await
    }

    /// Flush pending saves and stop the save task.
    pub async fn close(self) -> Result<()> {
        self.persister.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::storage::MemoryStore;
    use crate::test_utils::clock_on;
    use chrono::Duration;

    fn add_task(text: &str) -> Action {
        Action::AddTask {
            text: text.into(),
            xp: 10,
            priority: Priority::Medium,
            tags: vec!["focus".into()],
            due_date: None,
            goal_id: None,
        }
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let store = MemoryStore::new();
        let clock = clock_on(2026, 8, 1);
        let mut session = Session::create(Vault::new(Box::new(store.clone())), "pw", Box::new(clock.clone()))
            .await
            .unwrap();
        assert!(session.dispatch(&add_task("Persist me")));
        session.close().await.unwrap();

        let session = Session::open(Vault::new(Box::new(store.clone())), "pw", Box::new(clock))
            .await
            .unwrap();
        assert_eq!(session.state().tasks.len(), 1);
        assert_eq!(session.state().tasks[0].text, "Persist me");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_with_wrong_password() {
        let store = MemoryStore::new();
        let clock = clock_on(2026, 8, 1);
        Session::create(Vault::new(Box::new(store.clone())), "pw", Box::new(clock.clone()))
            .await
            .unwrap()
            .close()
            .await
            .unwrap();
        let err = Session::open(Vault::new(Box::new(store)), "nope", Box::new(clock))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_open_uninitialized_vault() {
        let err = Session::open(
            Vault::new(Box::new(MemoryStore::new())),
            "pw",
            Box::new(clock_on(2026, 8, 1)),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, Error::MissingVerificationToken));
    }

    #[tokio::test]
    async fn test_noop_dispatch_does_not_change_state() {
        let clock = clock_on(2026, 8, 1);
        let mut session = Session::create(
            Vault::new(Box::new(MemoryStore::new())),
            "pw",
            Box::new(clock),
        )
        .await
        .unwrap();
        let before = Arc::clone(session.state());
        assert!(!session.dispatch(&Action::DeleteTask { id: "ghost".into() }));
        assert!(Arc::ptr_eq(&before, session.state()));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollover_on_first_dispatch_of_new_day() {
        let clock = clock_on(2026, 8, 1);
        let mut session = Session::create(
            Vault::new(Box::new(MemoryStore::new())),
            "pw",
            Box::new(clock.clone()),
        )
        .await
        .unwrap();
        session.dispatch(&Action::AddGoal {
            name: "Read".into(),
            deadline: None,
            starts_at: None,
            daily_task_description: Some("Read 10 pages".into()),
            tags: vec![],
            questline: None,
        });
        assert_eq!(session.state().tasks.len(), 1);
        clock.advance(Duration::days(1));
        session.dispatch(&Action::SetTheme {
            theme: "light".into(),
        });
        assert_eq!(session.state().tasks.len(), 2);
        assert_eq!(session.state().daily_quests.date, Some(clock.today()));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rotation_then_reopen() {
        let store = MemoryStore::new();
        let clock = clock_on(2026, 8, 1);
        let mut session = Session::create(Vault::new(Box::new(store.clone())), "old", Box::new(clock.clone()))
            .await
            .unwrap();
        session.dispatch(&add_task("Keep me"));
        session.rotate_password("old", "new").await.unwrap();
        session.dispatch(&add_task("And me"));
        session.close().await.unwrap();

        let session = Session::open(Vault::new(Box::new(store)), "new", Box::new(clock))
            .await
            .unwrap();
        assert_eq!(session.state().tasks.len(), 2);
        session.close().await.unwrap();
    }
}
