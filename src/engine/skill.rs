//! Skill handler. Skills are keyed by tag name.

use super::Action;
use super::context::Ctx;
use crate::models::{AppState, Skill};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::AddSkill { .. } | Action::DeleteSkill { .. } | Action::RenameSkill { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, _ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::AddSkill { name } => {
            let name = name.trim();
            if name.is_empty() || state.skill(name).is_some() {
                return None;
            }
            let mut next = state.clone();
            next.skills.push(Skill {
                name: name.to_string(),
                xp: 0,
            });
            Some(next)
        }
        Action::DeleteSkill { name } => {
            state.skill(name)?;
            let mut next = state.clone();
            next.skills.retain(|s| &s.name != name);
            Some(next)
        }
        Action::RenameSkill { from, to } => {
            let to = to.trim();
            if to.is_empty() || to == from || state.skill(to).is_some() {
                return None;
            }
            let idx = state.skills.iter().position(|s| &s.name == from)?;
            let mut next = state.clone();
            next.skills[idx].name = to.to_string();
            for tags in next
                .tasks
                .iter_mut()
                .map(|t| &mut t.tags)
                .chain(next.goals.iter_mut().map(|g| &mut g.tags))
            {
                rename_tag(tags, from, to);
            }
            Some(next)
        }
        _ => None,
    }
}

fn rename_tag(tags: &mut Vec<String>, from: &str, to: &str) {
    if !tags.iter().any(|t| t == from) {
        return;
    }
    let already = tags.iter().any(|t| t == to);
    if already {
        tags.retain(|t| t != from);
    } else {
        for tag in tags.iter_mut().filter(|t| t.as_str() == from) {
            *tag = to.to_string();
        }
    }
}
