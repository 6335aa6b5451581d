//! Squad handler.

use super::Action;
use super::context::Ctx;
use crate::models::{AppState, Squad};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::CreateSquad { .. }
            | Action::DeleteSquad { .. }
            | Action::AddSquadMember { .. }
            | Action::RemoveSquadMember { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::CreateSquad { name } => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let mut next = state.clone();
            next.squads.push(Squad {
                id: ctx.new_id(),
                name: name.to_string(),
                members: Vec::new(),
                created_at: ctx.now,
            });
            Some(next)
        }
        Action::DeleteSquad { id } => {
            if !state.squads.iter().any(|s| &s.id == id) {
                return None;
            }
            let mut next = state.clone();
            next.squads.retain(|s| &s.id != id);
            Some(next)
        }
        Action::AddSquadMember { squad_id, member } => {
            let member = member.trim();
            let idx = state.squads.iter().position(|s| &s.id == squad_id)?;
            if member.is_empty() || state.squads[idx].members.iter().any(|m| m == member) {
                return None;
            }
            let mut next = state.clone();
            next.squads[idx].members.push(member.to_string());
            Some(next)
        }
        Action::RemoveSquadMember { squad_id, member } => {
            let idx = state.squads.iter().position(|s| &s.id == squad_id)?;
            if !state.squads[idx].members.iter().any(|m| m == member) {
                return None;
            }
            let mut next = state.clone();
            next.squads[idx].members.retain(|m| m != member);
            Some(next)
        }
        _ => None,
    }
}
