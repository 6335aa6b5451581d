//! Level math shared by the player and per-skill progress.
//!
//! With total XP `x` and base `B`:
//!
//! ```text
//! level(x)      = floor(sqrt(x / B)) + 1
//! xp_for(L)     = (L - 1)^2 * B
//! progress(x)   = (x - xp_for(level)) / (xp_for(level + 1) - xp_for(level))
//! ```

use serde::Serialize;

/// Base constant for the player level.
pub const PLAYER_XP_BASE: u64 = 25;

/// Base constant for skill levels.
pub const SKILL_XP_BASE: u64 = 15;

/// Level reached with `xp` total XP.
pub fn level_for_xp(xp: u64, base: u64) -> u32 {
    let base = base.max(1);
    let ratio = xp / base;
    // Start from the float estimate, then settle on the exact integer floor.
    let mut root = (xp as f64 / base as f64).sqrt().floor() as u64;
    while root > 0 && root.checked_mul(root).is_none_or(|sq| sq > ratio) {
        root -= 1;
    }
    while (root + 1)
        .checked_mul(root + 1)
        .is_some_and(|sq| sq <= ratio)
    {
        root += 1;
    }
    u32::try_from(root + 1).unwrap_or(u32::MAX)
}

/// Total XP needed to reach `level` from zero.
pub fn xp_for_level(level: u32, base: u64) -> u64 {
    let steps = u64::from(level.saturating_sub(1));
    steps.saturating_mul(steps).saturating_mul(base)
}

/// Position inside the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    pub xp_for_current_level: u64,
    pub xp_for_next_level: u64,
    /// 0.0..=100.0
    pub percent: f64,
}

/// Compute level and progress for `xp` with the given base.
pub fn progress(xp: u64, base: u64) -> LevelProgress {
    let level = level_for_xp(xp, base);
    let current = xp_for_level(level, base);
    let next = xp_for_level(level.saturating_add(1), base);
    let span = next.saturating_sub(current);
    let percent = if span == 0 {
        100.0
    } else {
        ((xp - current) as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
    };
    LevelProgress {
        level,
        xp,
        xp_for_current_level: current,
        xp_for_next_level: next,
        percent,
    }
}

/// Player level for a total XP amount.
pub fn player_level(xp: u64) -> u32 {
    level_for_xp(xp, PLAYER_XP_BASE)
}

/// Skill level for a skill's XP.
pub fn skill_level(xp: u64) -> u32 {
    level_for_xp(xp, SKILL_XP_BASE)
}
