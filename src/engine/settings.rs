//! Settings, journal, focus sessions and the other small actions.

use super::Action;
use super::context::Ctx;
use super::progress::advance_quests;
use crate::models::{AppState, JournalEntry, QuestKind};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::SetAgentName { .. }
            | Action::SetTheme { .. }
            | Action::SetLanguage { .. }
            | Action::SetSoundEnabled { .. }
            | Action::SetApiKeys { .. }
            | Action::SetLocalAi { .. }
            | Action::CompleteOnboarding
            | Action::AddJournalEntry { .. }
            | Action::DeleteJournalEntry { .. }
            | Action::LogPomodoroSession { .. }
            | Action::SetCommandPaletteOpen { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    let mut next = state.clone();
    match action {
        Action::SetAgentName { name } => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            next.agent_name = name.to_string();
        }
        Action::SetTheme { theme } => next.settings.theme = theme.clone(),
        Action::SetLanguage { language } => next.settings.language = language.clone(),
        Action::SetSoundEnabled { enabled } => next.settings.sound_enabled = *enabled,
        Action::SetApiKeys { keys } => {
            let mut pool: Vec<String> = Vec::new();
            for key in keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
                if !pool.iter().any(|k| k == key) {
                    pool.push(key.to_string());
                }
            }
            next.settings.api_keys = pool;
        }
        Action::SetLocalAi { config } => next.settings.local_ai = config.clone(),
        Action::CompleteOnboarding => next.onboarding_complete = true,
        Action::AddJournalEntry { text } => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            next.journal_entries.push(JournalEntry {
                id: ctx.new_id(),
                text: text.to_string(),
                created_at: ctx.now,
            });
            advance_quests(&mut next, QuestKind::WriteJournal, 1);
        }
        Action::DeleteJournalEntry { id } => {
            let before = next.journal_entries.len();
            next.journal_entries.retain(|e| &e.id != id);
            if next.journal_entries.len() == before {
                return None;
            }
        }
        Action::LogPomodoroSession { minutes } => {
            if *minutes == 0 {
                return None;
            }
            next.pomodoro_sessions = next.pomodoro_sessions.saturating_add(1);
            next.focus_minutes = next.focus_minutes.saturating_add(*minutes);
        }
        Action::SetCommandPaletteOpen { open } => next.is_command_palette_open = *open,
        _ => return None,
    }
    Some(next)
}
