//! Task handler.

use super::Action;
use super::context::Ctx;
use super::progress::{complete_task, uncomplete_task};
use crate::models::{AppState, SubTask, Task, TaskType};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::AddTask { .. }
            | Action::UpdateTask { .. }
            | Action::DeleteTask { .. }
            | Action::ToggleTaskStatus { .. }
            | Action::AddSubTasks { .. }
            | Action::ToggleSubTask { .. }
            | Action::DeleteSubTask { .. }
            | Action::ClearCompletedTasks
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::AddTask {
            text,
            xp,
            priority,
            tags,
            due_date,
            goal_id,
        } => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let mut next = state.clone();
            let mut task = Task::new(ctx.new_id(), text.to_string(), *xp, ctx.now);
            task.priority = *priority;
            task.tags = normalize_tags(tags);
            task.due_date = *due_date;
            task.goal_id = goal_id
                .as_ref()
                .filter(|id| state.goal(id).is_some())
                .cloned();
            if task.goal_id.is_some() {
                task.task_type = TaskType::Goal;
            }
            next.tasks.push(task);
            Some(next)
        }
        Action::UpdateTask {
            id,
            text,
            xp,
            priority,
            tags,
            due_date,
        } => {
            let idx = state.tasks.iter().position(|t| &t.id == id)?;
            let mut next = state.clone();
            let task = &mut next.tasks[idx];
            if let Some(text) = text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                task.text = text.to_string();
            }
            // Completed tasks keep the XP they were credited with.
            if let Some(xp) = xp.filter(|_| !task.completed) {
                task.xp = xp;
            }
            if let Some(priority) = priority {
                task.priority = *priority;
            }
            if let Some(tags) = tags.as_ref().filter(|_| !task.completed) {
                task.tags = normalize_tags(tags);
            }
            if due_date.is_some() {
                task.due_date = *due_date;
            }
            Some(next)
        }
        Action::DeleteTask { id } => {
            state.task(id)?;
            let mut next = state.clone();
            next.remove_tasks(|t| &t.id == id);
            Some(next)
        }
        Action::ToggleTaskStatus { id } => {
            let idx = state.tasks.iter().position(|t| &t.id == id)?;
            let task = &state.tasks[idx];
            // Completion of tasks with subtasks follows the subtasks, and reward tasks are final.
            if !task.sub_tasks.is_empty() || task.task_type.is_reward() {
                return None;
            }
            let mut next = state.clone();
            if task.completed {
                uncomplete_task(&mut next, idx);
            } else {
                complete_task(&mut next, idx, ctx);
            }
            Some(next)
        }
        Action::AddSubTasks { task_id, texts } => {
            let idx = state.tasks.iter().position(|t| &t.id == task_id)?;
            if state.tasks[idx].completed {
                return None;
            }
            let new: Vec<SubTask> = texts
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| SubTask {
                    id: ctx.new_id(),
                    text: t.to_string(),
                    completed: false,
                })
                .collect();
            if new.is_empty() {
                return None;
            }
            let mut next = state.clone();
            next.tasks[idx].sub_tasks.extend(new);
            Some(next)
        }
        Action::ToggleSubTask {
            task_id,
            sub_task_id,
        } => {
            let idx = state.tasks.iter().position(|t| &t.id == task_id)?;
            let sub_idx = state.tasks[idx]
                .sub_tasks
                .iter()
                .position(|s| &s.id == sub_task_id)?;
            let mut next = state.clone();
            let sub = &mut next.tasks[idx].sub_tasks[sub_idx];
            sub.completed = !sub.completed;
            sync_parent(&mut next, idx, ctx);
            Some(next)
        }
        Action::DeleteSubTask {
            task_id,
            sub_task_id,
        } => {
            let idx = state.tasks.iter().position(|t| &t.id == task_id)?;
            let sub_idx = state.tasks[idx]
                .sub_tasks
                .iter()
                .position(|s| &s.id == sub_task_id)?;
            let mut next = state.clone();
            next.tasks[idx].sub_tasks.remove(sub_idx);
            if !next.tasks[idx].sub_tasks.is_empty() {
                sync_parent(&mut next, idx, ctx);
            }
            Some(next)
        }
        Action::ClearCompletedTasks => {
            if !state.tasks.iter().any(|t| t.completed && !t.task_type.is_reward()) {
                return None;
            }
            let mut next = state.clone();
            // Reward tasks stay: they record quest claims and loot.
            next.remove_tasks(|t| t.completed && !t.task_type.is_reward());
            Some(next)
        }
        _ => None,
    }
}

/// Bring the parent's completion in line with its subtasks, running the completion
/// pipeline only when the parent actually flips.
fn sync_parent(state: &mut AppState, idx: usize, ctx: &mut Ctx) {
    let task = &state.tasks[idx];
    let done = task.all_sub_tasks_done();
    if done && !task.completed {
        complete_task(state, idx, ctx);
    } else if !done && task.completed {
        uncomplete_task(state, idx);
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
