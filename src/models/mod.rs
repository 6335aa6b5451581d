//! Data models for the Questlog application state.
//!
//! `AppState` is the single root aggregate. It serializes to camelCase JSON, which is
//! the plaintext the vault encrypts:
//! - `Task` - actionable items with XP, priority, tags and optional subtasks
//! - `Goal` - long-running objectives, optionally a `Questline` of ordered steps
//! - `Skill` - XP accumulated per tag
//! - `DailyQuests` / `DailyStreak` - the per-day cycle
//! - `Inventory` - loot caches and XP boosts

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default user id for states hydrated without one.
pub const DEFAULT_USER_ID: &str = "local-agent";

/// Default display name.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

/// Task priority; also selects the loot-drop chance on completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a task came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    /// Created by the user
    #[default]
    User,
    /// Spawned by a goal (daily directive or questline step)
    Goal,
    /// Terminal reward for claiming a daily quest
    QuestReward,
    /// Terminal reward from opening a cache
    LootReward,
}

impl TaskType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "goal" => Some(Self::Goal),
            "quest-reward" => Some(Self::QuestReward),
            "loot-reward" => Some(Self::LootReward),
            _ => None,
        }
    }

    /// Reward tasks are created already completed and never feed streaks or quests.
    pub fn is_reward(&self) -> bool {
        matches!(self, Self::QuestReward | Self::LootReward)
    }
}

/// A checklist item inside a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Extra information carried by reward tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDetails {
    /// Quest that produced the reward, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quest_id: Option<String>,
    pub description: String,
}

/// An actionable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    /// Base XP before boosts
    pub xp: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_details: Option<RewardDetails>,
    /// Effective XP credited at completion (base XP times the active boost)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_xp: Option<u32>,
    /// Index of the questline step this task represents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questline_step: Option<usize>,
}

impl Task {
    /// Create a new open user task.
    pub fn new(id: String, text: String, xp: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            xp,
            completed: false,
            created_at,
            completed_at: None,
            due_date: None,
            goal_id: None,
            priority: Priority::default(),
            tags: Vec::new(),
            sub_tasks: Vec::new(),
            task_type: TaskType::default(),
            reward_details: None,
            earned_xp: None,
            questline_step: None,
        }
    }

    /// XP this task contributes to the player's total.
    pub fn credited_xp(&self) -> u64 {
        if self.completed {
            u64::from(self.earned_xp.unwrap_or(self.xp))
        } else {
            0
        }
    }

    /// Whether every subtask is done. False when there are no subtasks.
    pub fn all_sub_tasks_done(&self) -> bool {
        !self.sub_tasks.is_empty() && self.sub_tasks.iter().all(|s| s.completed)
    }
}

/// One step of a questline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestlineStep {
    pub title: String,
    pub xp: u32,
}

/// Ordered steps replacing a goal's daily directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questline {
    pub steps: Vec<QuestlineStep>,
    /// Index of the step in progress; equals `steps.len()` once finished
    pub current_step: usize,
}

impl Questline {
    pub fn is_finished(&self) -> bool {
        self.current_step >= self.steps.len()
    }

    pub fn current(&self) -> Option<&QuestlineStep> {
        self.steps.get(self.current_step)
    }
}

/// A long-running objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_task_description: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questline: Option<Questline>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_questline(&self) -> bool {
        self.questline.is_some()
    }
}

/// XP accumulated under a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub xp: u32,
}

/// What a daily quest counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestKind {
    CompleteTasks,
    EarnXp,
    WriteJournal,
}

impl QuestKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete-tasks" => Some(Self::CompleteTasks),
            "earn-xp" => Some(Self::EarnXp),
            "write-journal" => Some(Self::WriteJournal),
            _ => None,
        }
    }
}

/// A daily quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestKind,
    #[serde(default)]
    pub description: String,
    pub target: u32,
    pub current: u32,
    pub reward_xp: u32,
    pub claimed: bool,
}

impl Quest {
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

/// Quest content as produced by the quest-generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraft {
    #[serde(rename = "type")]
    pub kind: QuestKind,
    pub description: String,
    pub target: u32,
    pub reward_xp: u32,
}

/// Today's quest list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuests {
    pub quests: Vec<Quest>,
    pub date: Option<NaiveDate>,
}

/// Consecutive days with at least one completed task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStreak {
    pub current: u32,
    pub last_completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caches {
    pub common: u32,
}

/// Time-limited XP multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boost {
    pub multiplier: f64,
    pub expires_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub caches: Caches,
    pub boosts: Vec<Boost>,
    /// Caches gained since the UI last acknowledged them. Reset on every load.
    pub new_caches: u32,
}

impl Inventory {
    /// Multiplier of the first unexpired boost, or 1.0.
    pub fn active_multiplier(&self, now: DateTime<Utc>) -> f64 {
        self.boosts
            .iter()
            .find(|b| b.expires_at > now)
            .map(|b| b.multiplier)
            .unwrap_or(1.0)
    }
}

/// User-defined reward in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub cost: u32,
}

/// A redemption in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedReward {
    pub id: String,
    pub reward_id: String,
    pub name: String,
    pub cost: u32,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Squad {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Local model endpoint used instead of the API-key pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAiConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: String,
    pub language: String,
    pub sound_enabled: bool,
    pub api_keys: Vec<String>,
    pub local_ai: LocalAiConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            language: "en".to_string(),
            sound_enabled: true,
            api_keys: Vec::new(),
            local_ai: LocalAiConfig::default(),
        }
    }
}

/// The whole application state.
///
/// Every transition produces a new value; see [`crate::engine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub user_id: String,
    pub agent_name: String,
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub skills: Vec<Skill>,
    /// Unlocked achievement ids; only ever grows
    pub achievements: BTreeSet<String>,
    pub daily_quests: DailyQuests,
    pub daily_streak: DailyStreak,
    pub inventory: Inventory,
    pub rewards: Vec<Reward>,
    pub redeemed_rewards: Vec<RedeemedReward>,
    pub journal_entries: Vec<JournalEntry>,
    pub pomodoro_sessions: u32,
    pub focus_minutes: u32,
    /// XP credited by completed tasks that were since deleted or cleared
    pub archived_xp: u64,
    pub squads: Vec<Squad>,
    pub settings: Settings,
    pub onboarding_complete: bool,
    /// Session-only UI flag, never persisted
    #[serde(skip)]
    pub is_command_palette_open: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            tasks: Vec::new(),
            goals: Vec::new(),
            skills: Vec::new(),
            achievements: BTreeSet::new(),
            daily_quests: DailyQuests::default(),
            daily_streak: DailyStreak::default(),
            inventory: Inventory::default(),
            rewards: Vec::new(),
            redeemed_rewards: Vec::new(),
            journal_entries: Vec::new(),
            pomodoro_sessions: 0,
            focus_minutes: 0,
            archived_xp: 0,
            squads: Vec::new(),
            settings: Settings::default(),
            onboarding_complete: false,
            is_command_palette_open: false,
        }
    }
}

impl AppState {
    /// Total XP earned: completed tasks (including reward tasks) plus archived XP.
    pub fn total_xp(&self) -> u64 {
        self.archived_xp
            .saturating_add(self.tasks.iter().map(Task::credited_xp).sum())
    }

    /// Remove the tasks matching `remove`, moving the XP of completed ones into
    /// `archived_xp`. Returns how many were removed.
    pub fn remove_tasks(&mut self, mut remove: impl FnMut(&Task) -> bool) -> usize {
        let before = self.tasks.len();
        let mut archived = 0u64;
        self.tasks.retain(|t| {
            if !remove(t) {
                return true;
            }
            archived = archived.saturating_add(t.credited_xp());
            false
        });
        self.archived_xp = self.archived_xp.saturating_add(archived);
        before - self.tasks.len()
    }

    /// XP spent on redeemed rewards.
    pub fn spent_xp(&self) -> u64 {
        self.redeemed_rewards.iter().map(|r| u64::from(r.cost)).sum()
    }

    /// XP still available for redemption.
    pub fn spendable_xp(&self) -> u64 {
        self.total_xp().saturating_sub(self.spent_xp())
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// Whether any quest has ever been claimed (reward tasks outlive the daily list).
    pub fn any_quest_claimed(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| t.task_type == TaskType::QuestReward)
            || self.daily_quests.quests.iter().any(|q| q.claimed)
    }
}
