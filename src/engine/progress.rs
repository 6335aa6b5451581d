//! Side effects of completing and un-completing a task.
//!
//! Shared by the task handler (direct toggles and subtask roll-ups) so that every path
//! to a completed task runs the same pipeline exactly once.

use super::context::Ctx;
use crate::models::{AppState, Priority, QuestKind, Skill, Task, TaskType};
use chrono::NaiveDate;

/// XP credited for a goal's recurring daily task.
pub const GOAL_DAILY_TASK_XP: u32 = 20;

/// Chance of a common cache dropping when a task of this priority is completed.
pub fn cache_drop_chance(priority: Priority) -> f64 {
    match priority {
        Priority::Low => 0.05,
        Priority::Medium => 0.10,
        Priority::High => 0.20,
    }
}

/// Whether `roll` (uniform in `[0, 1)`) wins a cache for this priority.
pub fn rolls_cache(priority: Priority, roll: f64) -> bool {
    roll < cache_drop_chance(priority)
}

/// Mark `state.tasks[idx]` completed and apply XP, skills, streak, quests, loot and
/// questline advancement.
pub(super) fn complete_task(state: &mut AppState, idx: usize, ctx: &mut Ctx) {
    let multiplier = state.inventory.active_multiplier(ctx.now);
    let task = &mut state.tasks[idx];
    let effective = (f64::from(task.xp) * multiplier).round() as u32;
    task.completed = true;
    task.completed_at = Some(ctx.now);
    task.earned_xp = Some(effective);

    let tags = task.tags.clone();
    let priority = task.priority;
    let task_type = task.task_type;
    let goal_id = task.goal_id.clone();
    let step = task.questline_step;

    apply_skill_delta(state, &tags, i64::from(effective));

    if task_type.is_reward() {
        return;
    }

    record_completion(state, ctx.today);
    advance_quests(state, QuestKind::CompleteTasks, 1);
    advance_quests(state, QuestKind::EarnXp, effective);

    if rolls_cache(priority, ctx.roll()) {
        state.inventory.caches.common += 1;
        state.inventory.new_caches += 1;
        tracing::debug!(priority = %priority, "cache dropped");
    }

    if let (Some(goal_id), Some(step)) = (goal_id, step) {
        advance_questline(state, &goal_id, step, ctx);
    }
}

/// Reverse a completion: clear the stamp and take back the credited XP from skills.
///
/// Streaks, quest progress, loot and questline steps are not rolled back.
pub(super) fn uncomplete_task(state: &mut AppState, idx: usize) {
    let task = &mut state.tasks[idx];
    let earned = task.earned_xp.unwrap_or(task.xp);
    task.completed = false;
    task.completed_at = None;
    task.earned_xp = None;
    let tags = task.tags.clone();
    apply_skill_delta(state, &tags, -i64::from(earned));
}

/// Add `delta` XP to each tagged skill, flooring at zero.
///
/// Missing skills are created only for positive deltas.
fn apply_skill_delta(state: &mut AppState, tags: &[String], delta: i64) {
    for tag in tags {
        match state.skills.iter_mut().find(|s| &s.name == tag) {
            Some(skill) => {
                let xp = (i64::from(skill.xp) + delta).clamp(0, i64::from(u32::MAX));
                skill.xp = xp as u32;
            }
            None if delta > 0 => state.skills.push(Skill {
                name: tag.clone(),
                xp: u32::try_from(delta).unwrap_or(u32::MAX),
            }),
            None => {}
        }
    }
}

/// Count today's first completion toward the streak.
pub(super) fn record_completion(state: &mut AppState, today: NaiveDate) {
    let streak = &mut state.daily_streak;
    match streak.last_completion_date {
        Some(last) if last == today => return,
        Some(last) if last.succ_opt() == Some(today) => streak.current += 1,
        _ => streak.current = 1,
    }
    streak.last_completion_date = Some(today);
}

/// Advance every unclaimed quest of `kind` by `amount`, capped at its target.
pub(super) fn advance_quests(state: &mut AppState, kind: QuestKind, amount: u32) {
    for quest in state
        .daily_quests
        .quests
        .iter_mut()
        .filter(|q| !q.claimed && q.kind == kind)
    {
        quest.current = quest.current.saturating_add(amount).min(quest.target);
    }
}

/// Move a questline forward after its step `step` was completed.
fn advance_questline(state: &mut AppState, goal_id: &str, step: usize, ctx: &Ctx) {
    let Some(goal_idx) = state.goals.iter().position(|g| g.id == goal_id) else {
        return;
    };
    let goal = &mut state.goals[goal_idx];
    let Some(questline) = goal.questline.as_mut() else {
        return;
    };
    // Re-completing an earlier step must not skip ahead.
    if questline.current_step != step || questline.is_finished() {
        return;
    }
    questline.current_step += 1;
    if questline.is_finished() {
        goal.is_active = false;
        tracing::debug!(goal = %goal.id, "questline finished");
        return;
    }
    spawn_questline_task(state, goal_idx, ctx);
}

/// Create the task for the goal's current questline step.
pub(super) fn spawn_questline_task(state: &mut AppState, goal_idx: usize, ctx: &Ctx) {
    let goal = &state.goals[goal_idx];
    let Some(questline) = goal.questline.as_ref() else {
        return;
    };
    let Some(step) = questline.current() else {
        return;
    };
    let index = questline.current_step;
    let exists = state
        .tasks
        .iter()
        .any(|t| t.goal_id.as_deref() == Some(goal.id.as_str()) && t.questline_step == Some(index));
    if exists {
        return;
    }
    let mut task = Task::new(ctx.new_id(), step.title.clone(), step.xp, ctx.now);
    task.goal_id = Some(goal.id.clone());
    task.tags = goal.tags.clone();
    task.task_type = TaskType::Goal;
    task.questline_step = Some(index);
    state.tasks.push(task);
}

/// Create today's recurring task for a plain goal unless one already exists.
pub(super) fn spawn_daily_goal_task(state: &mut AppState, goal_idx: usize, ctx: &Ctx) {
    let goal = &state.goals[goal_idx];
    if goal.is_questline() || !goal.is_active {
        return;
    }
    let Some(description) = goal.daily_task_description.as_ref() else {
        return;
    };
    if goal.deadline.is_some_and(|d| d < ctx.today) {
        return;
    }
    let already = state.tasks.iter().any(|t| {
        t.goal_id.as_deref() == Some(goal.id.as_str()) && t.created_at.date_naive() == ctx.today
    });
    if already {
        return;
    }
    let mut task = Task::new(ctx.new_id(), description.clone(), GOAL_DAILY_TASK_XP, ctx.now);
    task.goal_id = Some(goal.id.clone());
    task.tags = goal.tags.clone();
    task.task_type = TaskType::Goal;
    task.due_date = Some(ctx.today);
    state.tasks.push(task);
}
