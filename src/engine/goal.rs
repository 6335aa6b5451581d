//! Goal handler.

use super::Action;
use super::context::Ctx;
use super::progress::{spawn_daily_goal_task, spawn_questline_task};
use crate::models::{AppState, Goal, Questline};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::AddGoal { .. }
            | Action::UpdateGoal { .. }
            | Action::DeleteGoal { .. }
            | Action::ToggleGoalActive { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::AddGoal {
            name,
            deadline,
            starts_at,
            daily_task_description,
            tags,
            questline,
        } => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let questline = questline
                .as_ref()
                .filter(|steps| !steps.is_empty())
                .map(|steps| Questline {
                    steps: steps.clone(),
                    current_step: 0,
                });
            // Questline goals take their daily work from the current step.
            let daily_task_description = match questline {
                Some(_) => None,
                None => daily_task_description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            };
            let goal = Goal {
                id: ctx.new_id(),
                name: name.to_string(),
                deadline: *deadline,
                starts_at: *starts_at,
                daily_task_description,
                is_active: starts_at.is_none_or(|start| start <= ctx.today),
                tags: tags.clone(),
                questline,
                created_at: ctx.now,
            };
            let mut next = state.clone();
            next.goals.push(goal);
            let idx = next.goals.len() - 1;
            if next.goals[idx].is_active {
                if next.goals[idx].is_questline() {
                    spawn_questline_task(&mut next, idx, ctx);
                } else {
                    spawn_daily_goal_task(&mut next, idx, ctx);
                }
            }
            Some(next)
        }
        Action::UpdateGoal {
            id,
            name,
            deadline,
            daily_task_description,
            tags,
        } => {
            let idx = state.goals.iter().position(|g| &g.id == id)?;
            let mut next = state.clone();
            let goal = &mut next.goals[idx];
            if let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                goal.name = name.to_string();
            }
            if deadline.is_some() {
                goal.deadline = *deadline;
            }
            if let Some(description) = daily_task_description.as_deref().map(str::trim) {
                if !goal.is_questline() {
                    goal.daily_task_description =
                        (!description.is_empty()).then(|| description.to_string());
                }
            }
            if let Some(tags) = tags {
                goal.tags = tags.clone();
            }
            Some(next)
        }
        Action::DeleteGoal { id } => {
            state.goal(id)?;
            let mut next = state.clone();
            next.goals.retain(|g| &g.id != id);
            // Completed goal tasks stay as XP history.
            next.tasks
                .retain(|t| t.completed || t.goal_id.as_deref() != Some(id.as_str()));
            Some(next)
        }
        Action::ToggleGoalActive { id } => {
            let idx = state.goals.iter().position(|g| &g.id == id)?;
            let goal = &state.goals[idx];
            // A finished questline stays finished.
            if goal.questline.as_ref().is_some_and(Questline::is_finished) {
                return None;
            }
            let mut next = state.clone();
            let activated = !goal.is_active;
            next.goals[idx].is_active = activated;
            if activated {
                if next.goals[idx].is_questline() {
                    spawn_questline_task(&mut next, idx, ctx);
                } else {
                    spawn_daily_goal_task(&mut next, idx, ctx);
                }
            }
            Some(next)
        }
        _ => None,
    }
}
