//! Loot caches and boosts.

use super::Action;
use super::context::Ctx;
use crate::models::{AppState, Boost, RewardDetails, Task, TaskType};
use chrono::Duration;

/// Chance that an opened cache yields XP rather than a boost.
pub const CACHE_XP_CHANCE: f64 = 0.7;

/// Inclusive XP range of a cache's XP reward.
pub const CACHE_XP_MIN: u32 = 20;
pub const CACHE_XP_MAX: u32 = 60;

pub const CACHE_BOOST_MULTIPLIER: f64 = 1.5;
pub const CACHE_BOOST_MINUTES: i64 = 60;

pub(super) fn claims(action: &Action) -> bool {
    matches!(action, Action::OpenCache | Action::AcknowledgeNewCaches)
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::OpenCache => {
            if state.inventory.caches.common == 0 {
                return None;
            }
            let mut next = state.clone();
            let inventory = &mut next.inventory;
            inventory.caches.common -= 1;
            inventory.new_caches = inventory.new_caches.min(inventory.caches.common);
            inventory.boosts.retain(|b| b.expires_at > ctx.now);

            if ctx.roll() < CACHE_XP_CHANCE {
                let xp = ctx.roll_range(CACHE_XP_MIN, CACHE_XP_MAX);
                let mut task = Task::new(ctx.new_id(), format!("Cache loot: {} XP", xp), xp, ctx.now);
                task.completed = true;
                task.completed_at = Some(ctx.now);
                task.earned_xp = Some(xp);
                task.task_type = TaskType::LootReward;
                task.reward_details = Some(RewardDetails {
                    quest_id: None,
                    description: format!("{} XP from a common cache", xp),
                });
                next.tasks.push(task);
                tracing::debug!(xp, "cache opened for xp");
            } else {
                next.inventory.boosts.push(Boost {
                    multiplier: CACHE_BOOST_MULTIPLIER,
                    expires_at: ctx.now + Duration::minutes(CACHE_BOOST_MINUTES),
                    source: "common-cache".to_string(),
                });
                tracing::debug!("cache opened for boost");
            }
            Some(next)
        }
        Action::AcknowledgeNewCaches => {
            if state.inventory.new_caches == 0 {
                return None;
            }
            let mut next = state.clone();
            next.inventory.new_caches = 0;
            Some(next)
        }
        _ => None,
    }
}
