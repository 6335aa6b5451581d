//! Daily cycle and quest handler.

use super::Action;
use super::context::Ctx;
use super::progress::{spawn_daily_goal_task, spawn_questline_task};
use crate::models::{AppState, Quest, Questline, RewardDetails, Task, TaskType};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::InitDailyState | Action::SetDailyQuests { .. } | Action::ClaimQuestReward { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::InitDailyState => Some(roll_over(state, ctx)),
        Action::SetDailyQuests { date, quests } => {
            if *date != ctx.today || quests.is_empty() {
                return None;
            }
            let current = &state.daily_quests;
            if current.date == Some(ctx.today) && !current.quests.is_empty() {
                return None;
            }
            let mut next = state.clone();
            next.daily_quests.date = Some(ctx.today);
            next.daily_quests.quests = quests
                .iter()
                .map(|draft| Quest {
                    id: ctx.new_id(),
                    kind: draft.kind,
                    description: draft.description.clone(),
                    target: draft.target.max(1),
                    current: 0,
                    reward_xp: draft.reward_xp,
                    claimed: false,
                })
                .collect();
            Some(next)
        }
        Action::ClaimQuestReward { quest_id } => {
            let idx = state
                .daily_quests
                .quests
                .iter()
                .position(|q| &q.id == quest_id)?;
            let quest = &state.daily_quests.quests[idx];
            if quest.claimed || !quest.is_complete() {
                return None;
            }
            let mut task = Task::new(
                ctx.new_id(),
                format!("Quest reward: {}", quest.description),
                quest.reward_xp,
                ctx.now,
            );
            task.completed = true;
            task.completed_at = Some(ctx.now);
            task.earned_xp = Some(quest.reward_xp);
            task.task_type = TaskType::QuestReward;
            task.reward_details = Some(RewardDetails {
                quest_id: Some(quest.id.clone()),
                description: quest.description.clone(),
            });

            let mut next = state.clone();
            next.daily_quests.quests[idx].claimed = true;
            next.tasks.push(task);
            next.inventory.caches.common += 1;
            next.inventory.new_caches += 1;
            Some(next)
        }
        _ => None,
    }
}

/// Start-of-day bookkeeping. Safe to run more than once per day.
fn roll_over(state: &AppState, ctx: &mut Ctx) -> AppState {
    let mut next = state.clone();
    let today = ctx.today;
    let yesterday = today.pred_opt();

    let streak = &mut next.daily_streak;
    let kept = streak
        .last_completion_date
        .is_some_and(|last| last == today || Some(last) == yesterday);
    if !kept {
        streak.current = 0;
    }

    for idx in 0..next.goals.len() {
        let goal = &mut next.goals[idx];
        let finished = goal.questline.as_ref().is_some_and(Questline::is_finished);
        if !goal.is_active && !finished && goal.starts_at == Some(today) {
            goal.is_active = true;
            tracing::debug!(goal = %goal.id, "goal activated by start date");
            if goal.is_questline() {
                spawn_questline_task(&mut next, idx, ctx);
            }
        }
    }

    if next.daily_quests.date != Some(today) {
        next.daily_quests.quests.clear();
        next.daily_quests.date = Some(today);
    }

    for idx in 0..next.goals.len() {
        spawn_daily_goal_task(&mut next, idx, ctx);
    }
    next
}
