//! The state engine.
//!
//! Reduction runs an [`Action`] through an ordered chain of domain handlers. Each action
//! type is owned by exactly one handler; the owning handler either returns a new state or
//! declines. A declined action, or one that produces an equal state, yields the *same*
//! `Arc` so callers can detect a no-op with [`Arc::ptr_eq`]. Every changed state is then
//! passed through achievement derivation.
//!
//! Reduction is synchronous and deterministic given the injected [`Clock`] and RNG.

mod action;
mod context;
mod daily;
mod goal;
mod inventory;
mod progress;
mod reward;
mod settings;
mod skill;
mod squad;
mod task;

pub use action::Action;
pub use context::{Clock, Ctx, FixedClock, SystemClock};
pub use inventory::{
    CACHE_BOOST_MINUTES, CACHE_BOOST_MULTIPLIER, CACHE_XP_CHANCE, CACHE_XP_MAX, CACHE_XP_MIN,
};
pub use progress::{GOAL_DAILY_TASK_XP, cache_drop_chance, rolls_cache};

use crate::achievements;
use crate::models::AppState;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

/// A domain handler in the reducer chain.
struct Handler {
    name: &'static str,
    claims: fn(&Action) -> bool,
    reduce: fn(&AppState, &Action, &mut Ctx) -> Option<AppState>,
}

/// The chain, in evaluation order.
const HANDLERS: &[Handler] = &[
    Handler {
        name: "task",
        claims: task::claims,
        reduce: task::reduce,
    },
    Handler {
        name: "goal",
        claims: goal::claims,
        reduce: goal::reduce,
    },
    Handler {
        name: "daily",
        claims: daily::claims,
        reduce: daily::reduce,
    },
    Handler {
        name: "reward",
        claims: reward::claims,
        reduce: reward::reduce,
    },
    Handler {
        name: "skill",
        claims: skill::claims,
        reduce: skill::reduce,
    },
    Handler {
        name: "squad",
        claims: squad::claims,
        reduce: squad::reduce,
    },
    Handler {
        name: "inventory",
        claims: inventory::claims,
        reduce: inventory::reduce,
    },
    Handler {
        name: "settings",
        claims: settings::claims,
        reduce: settings::reduce,
    },
];

/// Names of the handlers that claim `action`. Exactly one for every action.
pub fn owners(action: &Action) -> Vec<&'static str> {
    HANDLERS
        .iter()
        .filter(|h| (h.claims)(action))
        .map(|h| h.name)
        .collect()
}

/// Reduce one action against `state`.
///
/// Returns `Arc::clone(state)` when nothing changed.
pub fn reduce(state: &Arc<AppState>, action: &Action, ctx: &mut Ctx) -> Arc<AppState> {
    for handler in HANDLERS.iter().filter(|h| (h.claims)(action)) {
        let Some(mut next) = (handler.reduce)(state, action, ctx) else {
            continue;
        };
        if next == **state {
            continue;
        }
        let unlocked = achievements::unlock(&mut next);
        tracing::debug!(
            action = action.name(),
            handler = handler.name,
            ?unlocked,
            "state changed"
        );
        return Arc::new(next);
    }
    tracing::trace!(action = action.name(), "no-op");
    Arc::clone(state)
}

/// Single-writer owner of the current state.
pub struct Engine {
    state: Arc<AppState>,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
}

impl Engine {
    /// Engine seeded from OS entropy.
    pub fn new(state: AppState, clock: Box<dyn Clock>) -> Self {
        Self::with_rng(state, clock, Box::new(ChaCha20Rng::from_entropy()))
    }

    /// Engine with a reproducible RNG.
    pub fn with_seed(state: AppState, clock: Box<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(state, clock, Box::new(ChaCha20Rng::seed_from_u64(seed)))
    }

    pub fn with_rng(state: AppState, clock: Box<dyn Clock>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            state: Arc::new(state),
            clock,
            rng,
        }
    }

    /// Apply an action. Returns whether the state changed.
    pub fn apply(&mut self, action: &Action) -> bool {
        let mut ctx = Ctx::new(self.clock.as_ref(), self.rng.as_mut());
        let next = reduce(&self.state, action, &mut ctx);
        if Arc::ptr_eq(&next, &self.state) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Cheap immutable handle to the current state.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
