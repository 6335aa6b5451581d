//! The closed set of actions the engine reduces.
//!
//! Actions serialize as internally tagged JSON, e.g.
//! `{"type": "toggle_task_status", "id": "..."}`.

use crate::models::{LocalAiConfig, Priority, QuestDraft, QuestlineStep};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    // Tasks
    AddTask {
        text: String,
        xp: u32,
        #[serde(default)]
        priority: Priority,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        due_date: Option<NaiveDate>,
        #[serde(default)]
        goal_id: Option<String>,
    },
    UpdateTask {
        id: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        xp: Option<u32>,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        tags: Option<Vec<String>>,
        #[serde(default)]
        due_date: Option<NaiveDate>,
    },
    DeleteTask {
        id: String,
    },
    ToggleTaskStatus {
        id: String,
    },
    AddSubTasks {
        task_id: String,
        texts: Vec<String>,
    },
    ToggleSubTask {
        task_id: String,
        sub_task_id: String,
    },
    DeleteSubTask {
        task_id: String,
        sub_task_id: String,
    },
    ClearCompletedTasks,

    // Goals
    AddGoal {
        name: String,
        #[serde(default)]
        deadline: Option<NaiveDate>,
        #[serde(default)]
        starts_at: Option<NaiveDate>,
        #[serde(default)]
        daily_task_description: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        questline: Option<Vec<QuestlineStep>>,
    },
    UpdateGoal {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        deadline: Option<NaiveDate>,
        #[serde(default)]
        daily_task_description: Option<String>,
        #[serde(default)]
        tags: Option<Vec<String>>,
    },
    DeleteGoal {
        id: String,
    },
    ToggleGoalActive {
        id: String,
    },

    // Daily cycle and quests
    InitDailyState,
    SetDailyQuests {
        date: NaiveDate,
        quests: Vec<QuestDraft>,
    },
    ClaimQuestReward {
        quest_id: String,
    },

    // Rewards
    AddReward {
        name: String,
        cost: u32,
    },
    DeleteReward {
        id: String,
    },
    RedeemReward {
        id: String,
    },

    // Skills
    AddSkill {
        name: String,
    },
    DeleteSkill {
        name: String,
    },
    RenameSkill {
        from: String,
        to: String,
    },

    // Squads
    CreateSquad {
        name: String,
    },
    DeleteSquad {
        id: String,
    },
    AddSquadMember {
        squad_id: String,
        member: String,
    },
    RemoveSquadMember {
        squad_id: String,
        member: String,
    },

    // Inventory
    OpenCache,
    AcknowledgeNewCaches,

    // Settings and misc
    SetAgentName {
        name: String,
    },
    SetTheme {
        theme: String,
    },
    SetLanguage {
        language: String,
    },
    SetSoundEnabled {
        enabled: bool,
    },
    SetApiKeys {
        keys: Vec<String>,
    },
    SetLocalAi {
        config: LocalAiConfig,
    },
    CompleteOnboarding,
    AddJournalEntry {
        text: String,
    },
    DeleteJournalEntry {
        id: String,
    },
    LogPomodoroSession {
        minutes: u32,
    },
    SetCommandPaletteOpen {
        open: bool,
    },
}

impl Action {
    /// Parse an action from its JSON form.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid action: {}", e)))
    }

    /// The serialized `type` tag, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddTask { .. } => "add_task",
            Action::UpdateTask { .. } => "update_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::ToggleTaskStatus { .. } => "toggle_task_status",
            Action::AddSubTasks { .. } => "add_sub_tasks",
            Action::ToggleSubTask { .. } => "toggle_sub_task",
            Action::DeleteSubTask { .. } => "delete_sub_task",
            Action::ClearCompletedTasks => "clear_completed_tasks",
            Action::AddGoal { .. } => "add_goal",
            Action::UpdateGoal { .. } => "update_goal",
            Action::DeleteGoal { .. } => "delete_goal",
            Action::ToggleGoalActive { .. } => "toggle_goal_active",
            Action::InitDailyState => "init_daily_state",
            Action::SetDailyQuests { .. } => "set_daily_quests",
            Action::ClaimQuestReward { .. } => "claim_quest_reward",
            Action::AddReward { .. } => "add_reward",
            Action::DeleteReward { .. } => "delete_reward",
            Action::RedeemReward { .. } => "redeem_reward",
            Action::AddSkill { .. } => "add_skill",
            Action::DeleteSkill { .. } => "delete_skill",
            Action::RenameSkill { .. } => "rename_skill",
            Action::CreateSquad { .. } => "create_squad",
            Action::DeleteSquad { .. } => "delete_squad",
            Action::AddSquadMember { .. } => "add_squad_member",
            Action::RemoveSquadMember { .. } => "remove_squad_member",
            Action::OpenCache => "open_cache",
            Action::AcknowledgeNewCaches => "acknowledge_new_caches",
            Action::SetAgentName { .. } => "set_agent_name",
            Action::SetTheme { .. } => "set_theme",
            Action::SetLanguage { .. } => "set_language",
            Action::SetSoundEnabled { .. } => "set_sound_enabled",
            Action::SetApiKeys { .. } => "set_api_keys",
            Action::SetLocalAi { .. } => "set_local_ai",
            Action::CompleteOnboarding => "complete_onboarding",
            Action::AddJournalEntry { .. } => "add_journal_entry",
            Action::DeleteJournalEntry { .. } => "delete_journal_entry",
            Action::LogPomodoroSession { .. } => "log_pomodoro_session",
            Action::SetCommandPaletteOpen { .. } => "set_command_palette_open",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_json() {
        let action = Action::from_json(r#"{"type":"toggle_task_status","id":"t1"}"#).unwrap();
        assert_eq!(
            action,
            Action::ToggleTaskStatus {
                id: "t1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_camel_case_fields_and_defaults() {
        let action = Action::from_json(
            r#"{"type":"add_task","text":"Read","xp":10,"dueDate":"2026-05-01"}"#,
        )
        .unwrap();
        match action {
            Action::AddTask {
                priority,
                tags,
                due_date,
                goal_id,
                ..
            } => {
                assert_eq!(priority, Priority::Medium);
                assert!(tags.is_empty());
                assert_eq!(due_date, NaiveDate::from_ymd_opt(2026, 5, 1));
                assert!(goal_id.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unit_variant() {
        let action = Action::from_json(r#"{"type":"init_daily_state"}"#).unwrap();
        assert_eq!(action, Action::InitDailyState);
        assert_eq!(action.name(), "init_daily_state");
    }

    #[test]
    fn test_name_matches_serialized_tag() {
        let action = Action::ClaimQuestReward {
            quest_id: "q".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], action.name());
        assert_eq!(json["questId"], "q");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = Action::from_json(r#"{"type":"launch_rocket"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid action"));
    }
}
