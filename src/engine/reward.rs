//! Reward catalog and redemption ledger.

use super::Action;
use super::context::Ctx;
use crate::models::{AppState, RedeemedReward, Reward};

pub(super) fn claims(action: &Action) -> bool {
    matches!(
        action,
        Action::AddReward { .. } | Action::DeleteReward { .. } | Action::RedeemReward { .. }
    )
}

pub(super) fn reduce(state: &AppState, action: &Action, ctx: &mut Ctx) -> Option<AppState> {
    match action {
        Action::AddReward { name, cost } => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let mut next = state.clone();
            next.rewards.push(Reward {
                id: ctx.new_id(),
                name: name.to_string(),
                cost: *cost,
            });
            Some(next)
        }
        Action::DeleteReward { id } => {
            if !state.rewards.iter().any(|r| &r.id == id) {
                return None;
            }
            let mut next = state.clone();
            next.rewards.retain(|r| &r.id != id);
            Some(next)
        }
        Action::RedeemReward { id } => {
            let reward = state.rewards.iter().find(|r| &r.id == id)?;
            if state.spendable_xp() < u64::from(reward.cost) {
                return None;
            }
            let mut next = state.clone();
            next.redeemed_rewards.push(RedeemedReward {
                id: ctx.new_id(),
                reward_id: reward.id.clone(),
                name: reward.name.clone(),
                cost: reward.cost,
                redeemed_at: ctx.now,
            });
            Some(next)
        }
        _ => None,
    }
}
