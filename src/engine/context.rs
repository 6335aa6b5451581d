//! Injected time and randomness for reductions.

use chrono::{DateTime, NaiveDate, Utc};
use rand::{Rng, RngCore};
use uuid::Uuid;

/// Source of the current time.
///
/// "Today" is the UTC calendar day of [`Clock::now`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(now)),
        }
    }

    /// Move the clock; clones observe the change.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Everything a handler may consult besides the state and the action.
pub struct Ctx<'a> {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
    rng: &'a mut dyn RngCore,
}

impl<'a> Ctx<'a> {
    pub fn new(clock: &dyn Clock, rng: &'a mut dyn RngCore) -> Self {
        let now = clock.now();
        Self {
            now,
            today: now.date_naive(),
            rng,
        }
    }

    /// Uniform roll in `[0, 1)`.
    pub fn roll(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Uniform integer in `low..=high`.
    pub fn roll_range(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    /// Fresh entity id.
    pub fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
