//! Command implementations for the qlog CLI.
//!
//! Each command opens the vault in the resolved data directory, does its work through
//! [`Session`] or [`Vault`], and returns a [`CommandResult`] for the binary to print.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::engine::{Action, SystemClock};
use crate::leveling::{self, LevelProgress};
use crate::models::AppState;
use crate::session::Session;
use crate::storage::FileStore;
use crate::suggest;
use crate::vault::{Vault, VaultStatus};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

fn open_vault(data_dir: &Path) -> Result<Vault> {
    Ok(Vault::new(Box::new(FileStore::open(data_dir)?)))
}

/// Unlock the vault in `data_dir`, refusing to create one.
async fn open_session(data_dir: &Path, password: &str) -> Result<Session> {
    let mut vault = open_vault(data_dir)?;
    match vault.initialize()? {
        VaultStatus::NeedsCreation => Err(Error::NotInitialized),
        VaultStatus::NeedsUnlock => Session::open(vault, password, Box::new(SystemClock)).await,
    }
}

/// Headline numbers of a state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub agent_name: String,
    pub level: LevelProgress,
    pub total_xp: u64,
    pub spendable_xp: u64,
    pub open_tasks: usize,
    pub completed_tasks: usize,
    pub active_goals: usize,
    pub streak: u32,
    pub common_caches: u32,
    pub quests_today: usize,
    pub achievements: usize,
}

impl StateSummary {
    pub fn of(state: &AppState) -> Self {
        let total_xp = state.total_xp();
        Self {
            agent_name: state.agent_name.clone(),
            level: leveling::progress(total_xp, leveling::PLAYER_XP_BASE),
            total_xp,
            spendable_xp: state.spendable_xp(),
            open_tasks: state.tasks.iter().filter(|t| !t.completed).count(),
            completed_tasks: state.completed_task_count(),
            active_goals: state.goals.iter().filter(|g| g.is_active).count(),
            streak: state.daily_streak.current,
            common_caches: state.inventory.caches.common,
            quests_today: state.daily_quests.quests.len(),
            achievements: state.achievements.len(),
        }
    }

    fn lines(&self) -> String {
        format!(
            "{} - level {} ({:.0}% to next)\n  XP: {} total, {} spendable\n  Tasks: {} open, {} done\n  Active goals: {}\n  Streak: {} day(s)\n  Caches: {}\n  Quests today: {}\n  Achievements: {}",
            self.agent_name,
            self.level.level,
            self.level.percent,
            self.total_xp,
            self.spendable_xp,
            self.open_tasks,
            self.completed_tasks,
            self.active_goals,
            self.streak,
            self.common_caches,
            self.quests_today,
            self.achievements,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub location: String,
    pub status: VaultStatus,
    pub version: &'static str,
}

impl CommandResult for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let status = match self.status {
            VaultStatus::NeedsCreation => "no vault yet (run `qlog init`)",
            VaultStatus::NeedsUnlock => "locked vault present",
        };
        format!("Vault: {}\nStatus: {}\nqlog {}", self.location, status, self.version)
    }
}

/// Report the vault state. Legacy unencrypted data is discarded, as on any startup.
pub fn status(data_dir: &Path) -> Result<StatusResult> {
    let mut vault = open_vault(data_dir)?;
    let status = vault.initialize()?;
    Ok(StatusResult {
        location: vault.location(),
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub location: String,
    pub summary: StateSummary,
}

impl CommandResult for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Created vault at {}", self.location)
    }
}

/// Create the vault with its first password.
pub async fn init(data_dir: &Path, password: &str) -> Result<InitResult> {
    let mut vault = open_vault(data_dir)?;
    if vault.initialize()? == VaultStatus::NeedsUnlock {
        return Err(Error::AlreadyInitialized);
    }
    let location = vault.location();
    let session = Session::create(vault, password, Box::new(SystemClock)).await?;
    let summary = StateSummary::of(session.state());
    session.close().await?;
    Ok(InitResult { location, summary })
}

#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub summary: StateSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AppState>,
}

impl CommandResult for ShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.summary.lines()
    }
}

pub async fn show(data_dir: &Path, password: &str, full: bool) -> Result<ShowResult> {
    let session = open_session(data_dir, password).await?;
    let state = Arc::clone(session.state());
    session.close().await?;
    Ok(ShowResult {
        summary: StateSummary::of(&state),
        state: full.then(|| AppState::clone(&state)),
    })
}

#[derive(Debug, Serialize)]
pub struct DispatchResult {
    pub action: &'static str,
    pub changed: bool,
    pub summary: StateSummary,
}

impl CommandResult for DispatchResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let verdict = if self.changed { "applied" } else { "no change" };
        format!("{}: {}\n{}", self.action, verdict, self.summary.lines())
    }
}

/// Parse and apply one action.
pub async fn dispatch(data_dir: &Path, password: &str, action_json: &str) -> Result<DispatchResult> {
    let action: Action = serde_json::from_str(action_json)
        .map_err(|e| Error::InvalidInput(format!("invalid action: {}", e)))?;
    apply(data_dir, password, action).await
}

async fn apply(data_dir: &Path, password: &str, action: Action) -> Result<DispatchResult> {
    let mut session = open_session(data_dir, password).await?;
    let changed = session.dispatch(&action);
    let summary = StateSummary::of(session.state());
    session.close().await?;
    Ok(DispatchResult {
        action: action.name(),
        changed,
        summary,
    })
}

/// Validate a generator response and apply it as today's quests.
pub async fn quests(data_dir: &Path, password: &str, response: &str) -> Result<DispatchResult> {
    let quests = suggest::parse_quest_drafts(response)
        .map_err(|e| Error::InvalidInput(format!("no usable quests: {}", e)))?;
    let date = chrono::Utc::now().date_naive();
    apply(data_dir, password, Action::SetDailyQuests { date, quests }).await
}

#[derive(Debug, Serialize)]
pub struct RotateResult {
    pub rotated: bool,
}

impl CommandResult for RotateResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        "Password changed".to_string()
    }
}

pub async fn rotate(data_dir: &Path, password: &str, new_password: &str) -> Result<RotateResult> {
    if new_password.is_empty() {
        return Err(Error::InvalidInput("new password must not be empty".to_string()));
    }
    let mut session = open_session(data_dir, password).await?;
    let rotated = session.rotate_password(password, new_password).await;
    let closed = session.close().await;
    rotated?;
    closed?;
    Ok(RotateResult { rotated: true })
}

#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub bytes: usize,
}

impl CommandResult for ExportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Exported {} bytes to {}", self.bytes, self.path.display())
    }
}

/// Write the encrypted bundle. The password is checked so a typo cannot export a vault the user
/// cannot open.
pub async fn export(data_dir: &Path, password: &str, file: &Path) -> Result<ExportResult> {
    let session = open_session(data_dir, password).await?;
    let bundle = session.export_bundle().await;
    session.close().await?;
    let body = serde_json::to_vec_pretty(&bundle?)?;
    std::fs::write(file, &body)?;
    Ok(ExportResult {
        path: file.to_path_buf(),
        bytes: body.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub location: String,
}

impl CommandResult for ImportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Imported bundle into {}; unlock it with the password it was exported under",
            self.location
        )
    }
}

pub fn import(data_dir: &Path, file: &Path) -> Result<ImportResult> {
    let bytes = std::fs::read(file)?;
    let mut vault = open_vault(data_dir)?;
    vault.import_bundle(&bytes)?;
    Ok(ImportResult {
        location: vault.location(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_dispatch_then_show() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "pw").await.unwrap();

        let result = dispatch(
            dir.path(),
            "pw",
            r#"{"type": "add_task", "text": "Write report", "xp": 20}"#,
        )
        .await
        .unwrap();
        assert!(result.changed);
        assert_eq!(result.action, "add_task");
        assert_eq!(result.summary.open_tasks, 1);

        let shown = show(dir.path(), "pw", true).await.unwrap();
        assert_eq!(shown.summary.open_tasks, 1);
        assert_eq!(shown.state.unwrap().tasks[0].text, "Write report");
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "pw").await.unwrap();
        assert!(matches!(
            init(dir.path(), "pw").await,
            Err(Error::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn test_show_without_vault() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            show(dir.path(), "pw", false).await,
            Err(Error::NotInitialized)
        ));
        assert_eq!(status(dir.path()).unwrap().status, VaultStatus::NeedsCreation);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_action() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "pw").await.unwrap();
        let err = dispatch(dir.path(), "pw", r#"{"type": "fly"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_quests_from_generator_response() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "pw").await.unwrap();
        let response = r#"[{"type": "complete-tasks", "description": "Do 2", "target": 2, "rewardXp": 25}]"#;
        let result = quests(dir.path(), "pw", response).await.unwrap();
        assert!(result.changed);
        assert_eq!(result.summary.quests_today, 1);

        let err = quests(dir.path(), "pw", "not json").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let bundle = source.path().join("bundle.json");
        init(source.path(), "pw").await.unwrap();
        dispatch(
            source.path(),
            "pw",
            r#"{"type": "set_agent_name", "name": "Nova"}"#,
        )
        .await
        .unwrap();
        export(source.path(), "pw", &bundle).await.unwrap();

        import(target.path(), &bundle).unwrap();
        let shown = show(target.path(), "pw", false).await.unwrap();
        assert_eq!(shown.summary.agent_name, "Nova");
    }

    #[tokio::test]
    async fn test_rotate() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "old").await.unwrap();
        rotate(dir.path(), "old", "new").await.unwrap();
        assert!(matches!(
            show(dir.path(), "old", false).await,
            Err(Error::InvalidCredentials)
        ));
        show(dir.path(), "new", false).await.unwrap();
    }
}
