//! Achievement derivation.
//!
//! Achievements are recomputed from the whole state after every changed transition and
//! unioned into `AppState::achievements`. Derivation is pure and idempotent; the unlocked
//! set never shrinks even if the underlying counters later drop.

use crate::leveling;
use crate::models::AppState;
use std::collections::BTreeSet;

/// The measurable condition an achievement checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    CompletedTasks(usize),
    JournalEntries(usize),
    Level(u32),
    Streak(u32),
    PomodoroSessions(u32),
    Goals(usize),
    QuestClaimed,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub criterion: Criterion,
}

/// Every achievement the engine can unlock.
pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "first-task",
        name: "First Steps",
        description: "Complete your first task",
        criterion: Criterion::CompletedTasks(1),
    },
    Achievement {
        id: "task-10",
        name: "Getting Things Done",
        description: "Complete 10 tasks",
        criterion: Criterion::CompletedTasks(10),
    },
    Achievement {
        id: "task-50",
        name: "Workhorse",
        description: "Complete 50 tasks",
        criterion: Criterion::CompletedTasks(50),
    },
    Achievement {
        id: "task-100",
        name: "Centurion",
        description: "Complete 100 tasks",
        criterion: Criterion::CompletedTasks(100),
    },
    Achievement {
        id: "first-journal",
        name: "Dear Diary",
        description: "Write your first journal entry",
        criterion: Criterion::JournalEntries(1),
    },
    Achievement {
        id: "journal-10",
        name: "Chronicler",
        description: "Write 10 journal entries",
        criterion: Criterion::JournalEntries(10),
    },
    Achievement {
        id: "level-5",
        name: "Apprentice",
        description: "Reach level 5",
        criterion: Criterion::Level(5),
    },
    Achievement {
        id: "level-10",
        name: "Adept",
        description: "Reach level 10",
        criterion: Criterion::Level(10),
    },
    Achievement {
        id: "level-25",
        name: "Master",
        description: "Reach level 25",
        criterion: Criterion::Level(25),
    },
    Achievement {
        id: "streak-3",
        name: "On a Roll",
        description: "Keep a 3-day streak",
        criterion: Criterion::Streak(3),
    },
    Achievement {
        id: "streak-7",
        name: "Week Warrior",
        description: "Keep a 7-day streak",
        criterion: Criterion::Streak(7),
    },
    Achievement {
        id: "streak-30",
        name: "Unstoppable",
        description: "Keep a 30-day streak",
        criterion: Criterion::Streak(30),
    },
    Achievement {
        id: "pomodoro-1",
        name: "Focused",
        description: "Finish a pomodoro session",
        criterion: Criterion::PomodoroSessions(1),
    },
    Achievement {
        id: "pomodoro-25",
        name: "Deep Worker",
        description: "Finish 25 pomodoro sessions",
        criterion: Criterion::PomodoroSessions(25),
    },
    Achievement {
        id: "goal-setter",
        name: "Goal Setter",
        description: "Create a goal",
        criterion: Criterion::Goals(1),
    },
    Achievement {
        id: "goal-5",
        name: "Visionary",
        description: "Create 5 goals",
        criterion: Criterion::Goals(5),
    },
    Achievement {
        id: "quest-claimed",
        name: "Quest Complete",
        description: "Claim a daily quest reward",
        criterion: Criterion::QuestClaimed,
    },
];

/// Counters the criteria are evaluated against, gathered once per derivation.
struct Metrics {
    completed_tasks: usize,
    journal_entries: usize,
    level: u32,
    streak: u32,
    pomodoro_sessions: u32,
    goals: usize,
    quest_claimed: bool,
}

impl Metrics {
    fn of(state: &AppState) -> Self {
        Self {
            completed_tasks: state.completed_task_count(),
            journal_entries: state.journal_entries.len(),
            level: leveling::player_level(state.total_xp()),
            streak: state.daily_streak.current,
            pomodoro_sessions: state.pomodoro_sessions,
            goals: state.goals.len(),
            quest_claimed: state.any_quest_claimed(),
        }
    }

    fn satisfies(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::CompletedTasks(n) => self.completed_tasks >= n,
            Criterion::JournalEntries(n) => self.journal_entries >= n,
            Criterion::Level(n) => self.level >= n,
            Criterion::Streak(n) => self.streak >= n,
            Criterion::PomodoroSessions(n) => self.pomodoro_sessions >= n,
            Criterion::Goals(n) => self.goals >= n,
            Criterion::QuestClaimed => self.quest_claimed,
        }
    }
}

/// Ids of every achievement the state currently qualifies for.
pub fn qualifying(state: &AppState) -> BTreeSet<&'static str> {
    let metrics = Metrics::of(state);
    CATALOG
        .iter()
        .filter(|a| metrics.satisfies(a.criterion))
        .map(|a| a.id)
        .collect()
}

/// Union the qualifying achievements into the state's unlocked set.
///
/// Returns the ids that were newly unlocked.
pub fn unlock(state: &mut AppState) -> Vec<&'static str> {
    let mut newly = Vec::new();
    for id in qualifying(state) {
        if state.achievements.insert(id.to_string()) {
            newly.push(id);
        }
    }
    newly
}

/// Look up a catalog entry.
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}
