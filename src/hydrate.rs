//! Rebuild a well-typed [`AppState`] from decrypted JSON.
//!
//! Hydration never fails. It runs in two stages per entity:
//! 1. validation reads the raw object into a partial record, collecting a [`FieldError`] for
//!    every missing required field, wrong primitive type, unknown enum value or unparseable
//!    date. An entity with any error is dropped from its collection and recorded in the
//!    [`HydrationReport`];
//! 2. defaulting turns each surviving partial record into the model type, filling older
//!    persisted shapes forward and repairing cross-field invariants.
//!
//! Session-only fields (`newCaches`, the command palette flag) are always reset.

use crate::models::{
    AppState, Boost, Caches, DailyQuests, DailyStreak, Goal, Inventory, JournalEntry,
    LocalAiConfig, Priority, Quest, QuestKind, Questline, QuestlineStep, RedeemedReward, Reward,
    RewardDetails, Settings, Skill, Squad, SubTask, Task, TaskType, DEFAULT_AGENT_NAME,
    DEFAULT_USER_ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Why one field of one entity was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// An entity excluded from the hydrated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// Collection path, e.g. `tasks` or `tasks[3].subTasks`
    pub collection: String,
    pub index: usize,
    pub errors: Vec<FieldError>,
}

/// Everything hydration discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub dropped: Vec<DroppedItem>,
}

impl HydrationReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }

    fn drop_item(&mut self, collection: &str, index: usize, errors: Vec<FieldError>) {
        tracing::warn!(
            collection,
            index,
            errors = %errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            "dropping invalid item"
        );
        self.dropped.push(DroppedItem {
            collection: collection.to_string(),
            index,
            errors,
        });
    }
}

/// Hydrate, discarding the report.
pub fn hydrate(raw: &Value) -> AppState {
    hydrate_with_report(raw).0
}

/// Hydrate and describe what was dropped.
pub fn hydrate_with_report(raw: &Value) -> (AppState, HydrationReport) {
    let mut report = HydrationReport::default();
    let Some(root) = raw.as_object() else {
        if !raw.is_null() {
            tracing::warn!("persisted state is not an object; using defaults");
        }
        return (AppState::default(), report);
    };

    let defaults = AppState::default();
    let tasks = collect(root, "tasks", &mut report, validate_task)
        .into_iter()
        .map(PartialTask::into_task)
        .collect::<Vec<_>>();
    let goals = collect(root, "goals", &mut report, validate_goal)
        .into_iter()
        .map(PartialGoal::into_goal)
        .collect::<Vec<_>>();
    let journal_entries = collect(root, "journalEntries", &mut report, validate_journal_entry);

    let onboarding_complete = match root.get("onboardingComplete").and_then(Value::as_bool) {
        Some(done) => done,
        None => !tasks.is_empty() || !goals.is_empty() || !journal_entries.is_empty(),
    };

    let mut skills: Vec<Skill> = Vec::new();
    for skill in collect(root, "skills", &mut report, validate_skill) {
        if !skills.iter().any(|s| s.name == skill.name) {
            skills.push(skill);
        }
    }

    let state = AppState {
        user_id: non_empty_str(root, "userId").unwrap_or(DEFAULT_USER_ID).to_string(),
        agent_name: non_empty_str(root, "agentName")
            .unwrap_or(DEFAULT_AGENT_NAME)
            .to_string(),
        tasks,
        goals,
        skills,
        achievements: achievements(root.get("achievements")),
        daily_quests: daily_quests(root.get("dailyQuests"), &mut report),
        daily_streak: daily_streak(root.get("dailyStreak")),
        inventory: inventory(root.get("inventory"), &mut report),
        rewards: collect(root, "rewards", &mut report, validate_reward),
        redeemed_rewards: collect(root, "redeemedRewards", &mut report, validate_redeemed),
        journal_entries,
        pomodoro_sessions: root
            .get("pomodoroSessions")
            .and_then(count)
            .unwrap_or(defaults.pomodoro_sessions),
        focus_minutes: root
            .get("focusMinutes")
            .and_then(count)
            .unwrap_or(defaults.focus_minutes),
        archived_xp: root.get("archivedXp").and_then(Value::as_u64).unwrap_or(0),
        squads: collect(root, "squads", &mut report, validate_squad),
        settings: settings(root),
        onboarding_complete,
        is_command_palette_open: false,
    };
    (state, report)
}

/// Validate every element of an array field, dropping failures.
fn collect<T>(
    root: &Map<String, Value>,
    key: &str,
    report: &mut HydrationReport,
    validate: fn(&Value, &mut HydrationReport, &str) -> Result<T, Vec<FieldError>>,
) -> Vec<T> {
    let Some(items) = root.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("{}[{}]", key, index);
        match validate(item, report, &path) {
            Ok(value) => out.push(value),
            Err(errors) => report.drop_item(key, index, errors),
        }
    }
    out
}

/// Typed reads from one JSON object, accumulating errors.
struct Fields<'a> {
    obj: Option<&'a Map<String, Value>>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value) -> Self {
        let obj = value.as_object();
        let mut errors = Vec::new();
        if obj.is_none() {
            errors.push(FieldError {
                field: "$".to_string(),
                reason: "not an object",
            });
        }
        Self { obj, errors }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.obj?.get(key).filter(|v| !v.is_null())
    }

    fn fail(&mut self, key: &str, reason: &'static str) {
        self.errors.push(FieldError {
            field: key.to_string(),
            reason,
        });
    }

    fn string(&mut self, key: &str) -> Option<String> {
        match self.raw(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(key, "expected a string");
                None
            }
            None => {
                self.fail(key, "missing");
                None
            }
        }
    }

    fn id(&mut self, key: &str) -> Option<String> {
        match self.raw(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            // Older builds used numeric ids.
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => {
                self.fail(key, "expected a non-empty id");
                None
            }
            None => {
                self.fail(key, "missing");
                None
            }
        }
    }

    fn opt_string(&mut self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail(key, "expected a string");
                None
            }
        }
    }

    fn count(&mut self, key: &str) -> Option<u32> {
        let Some(value) = self.raw(key) else {
            self.fail(key, "missing");
            return None;
        };
        let n = count(value);
        if n.is_none() {
            self.fail(key, "expected a non-negative number");
        }
        n
    }

    fn opt_count(&mut self, key: &str) -> Option<u32> {
        let value = self.raw(key)?;
        let n = count(value);
        if n.is_none() {
            self.fail(key, "expected a non-negative number");
        }
        n
    }

    fn opt_bool(&mut self, key: &str) -> Option<bool> {
        match self.raw(key)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.fail(key, "expected a boolean");
                None
            }
        }
    }

    fn opt_date(&mut self, key: &str) -> Option<NaiveDate> {
        let value = self.raw(key)?;
        let date = parse_date(value);
        if date.is_none() {
            self.fail(key, "unparseable date");
        }
        date
    }

    fn opt_datetime(&mut self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.raw(key)?;
        let at = parse_datetime(value);
        if at.is_none() {
            self.fail(key, "unparseable timestamp");
        }
        at
    }

    fn opt_enum<T>(&mut self, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let value = self.raw(key)?;
        let parsed = value.as_str().and_then(parse);
        if parsed.is_none() {
            self.fail(key, "unknown value");
        }
        parsed
    }

    fn strings(&mut self, key: &str) -> Vec<String> {
        match self.raw(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(_) => {
                self.fail(key, "expected an array");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

fn count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0).then(|| f.round().min(f64::from(u32::MAX)) as u32)
}

fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|d| d.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    if let Some(s) = value.as_str() {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date);
        }
    }
    parse_datetime(value).map(|d| d.date_naive())
}

fn non_empty_str<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    root.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

struct PartialTask {
    id: String,
    text: String,
    xp: u32,
    completed: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    due_date: Option<NaiveDate>,
    goal_id: Option<String>,
    priority: Option<Priority>,
    tags: Vec<String>,
    sub_tasks: Vec<SubTask>,
    task_type: Option<TaskType>,
    reward_details: Option<RewardDetails>,
    earned_xp: Option<u32>,
    questline_step: Option<u32>,
}

fn validate_task(
    value: &Value,
    report: &mut HydrationReport,
    path: &str,
) -> Result<PartialTask, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let text = f.string("text");
    let xp = f.count("xp");
    let completed = f.opt_bool("completed");
    let created_at = f.opt_datetime("createdAt");
    let completed_at = f.opt_datetime("completedAt");
    let due_date = f.opt_date("dueDate");
    let goal_id = f.opt_string("goalId");
    let priority = f.opt_enum("priority", Priority::parse);
    let tags = f.strings("tags");
    let task_type = f.opt_enum("type", TaskType::parse);
    let earned_xp = f.opt_count("earnedXp");
    let questline_step = f.opt_count("questlineStep");
    let reward_details = f.raw("rewardDetails").and_then(|v| {
        Some(RewardDetails {
            quest_id: v.get("questId").and_then(Value::as_str).map(str::to_string),
            description: v.get("description")?.as_str()?.to_string(),
        })
    });

    let mut sub_tasks = Vec::new();
    if let Some(items) = f.raw("subTasks").and_then(Value::as_array) {
        let collection = format!("{}.subTasks", path);
        for (index, item) in items.iter().enumerate() {
            match validate_sub_task(item) {
                Ok(sub) => sub_tasks.push(sub),
                Err(errors) => report.drop_item(&collection, index, errors),
            }
        }
    }

    let partial = match (id, text, xp) {
        (Some(id), Some(text), Some(xp)) => Some(PartialTask {
            id,
            text,
            xp,
            completed,
            created_at,
            completed_at,
            due_date,
            goal_id,
            priority,
            tags,
            sub_tasks,
            task_type,
            reward_details,
            earned_xp,
            questline_step,
        }),
        _ => None,
    };
    f.finish(partial)
}

fn validate_sub_task(value: &Value) -> Result<SubTask, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let text = f.string("text");
    let completed = f.opt_bool("completed").unwrap_or(false);
    let sub = match (id, text) {
        (Some(id), Some(text)) => Some(SubTask {
            id,
            text,
            completed,
        }),
        _ => None,
    };
    f.finish(sub)
}

impl PartialTask {
    fn into_task(self) -> Task {
        let created_at = self
            .created_at
            .or(self.completed_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let mut completed = self.completed.unwrap_or(false);
        if !self.sub_tasks.is_empty() {
            completed = self.sub_tasks.iter().all(|s| s.completed);
        }
        let task_type = self.task_type.unwrap_or(if self.goal_id.is_some() {
            TaskType::Goal
        } else {
            TaskType::User
        });
        Task {
            id: self.id,
            text: self.text,
            xp: self.xp,
            completed,
            created_at,
            completed_at: self.completed_at.filter(|_| completed),
            due_date: self.due_date,
            goal_id: self.goal_id,
            priority: self.priority.unwrap_or_default(),
            tags: self.tags,
            sub_tasks: self.sub_tasks,
            task_type,
            reward_details: self.reward_details,
            earned_xp: self.earned_xp.filter(|_| completed),
            questline_step: self.questline_step.map(|s| s as usize),
        }
    }
}

struct PartialGoal {
    id: String,
    name: String,
    deadline: Option<NaiveDate>,
    starts_at: Option<NaiveDate>,
    daily_task_description: Option<String>,
    is_active: Option<bool>,
    tags: Vec<String>,
    questline: Option<Questline>,
    created_at: Option<DateTime<Utc>>,
}

fn validate_goal(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<PartialGoal, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let name = f.string("name");
    let deadline = f.opt_date("deadline");
    let starts_at = f.opt_date("startsAt");
    let daily_task_description = f.opt_string("dailyTaskDescription");
    let is_active = f.opt_bool("isActive");
    let tags = f.strings("tags");
    let created_at = f.opt_datetime("createdAt");
    let questline = match f.raw("questline") {
        Some(raw) => match validate_questline(raw) {
            Ok(questline) => Some(questline),
            Err(errors) => {
                f.errors
                    .extend(errors.into_iter().map(|e| FieldError {
                        field: format!("questline.{}", e.field),
                        reason: e.reason,
                    }));
                None
            }
        },
        None => None,
    };
    let partial = match (id, name) {
        (Some(id), Some(name)) => Some(PartialGoal {
            id,
            name,
            deadline,
            starts_at,
            daily_task_description,
            is_active,
            tags,
            questline,
            created_at,
        }),
        _ => None,
    };
    f.finish(partial)
}

fn validate_questline(value: &Value) -> Result<Questline, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let current_step = f.opt_count("currentStep").unwrap_or(0);
    let mut steps = Vec::new();
    match f.raw("steps") {
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let mut step = Fields::new(item);
                let title = step.string("title");
                let xp = step.count("xp");
                match step.finish(title.zip(xp)) {
                    Ok((title, xp)) => steps.push(QuestlineStep { title, xp }),
                    // A questline with a missing step cannot be sequenced.
                    Err(_) => f.fail(&format!("steps[{}]", index), "invalid step"),
                }
            }
        }
        _ => f.fail("steps", "expected an array"),
    }
    f.finish(Some(Questline {
        current_step: (current_step as usize).min(steps.len()),
        steps,
    }))
}

impl PartialGoal {
    fn into_goal(self) -> Goal {
        let questline = self.questline.filter(|q| !q.steps.is_empty());
        let daily_task_description = match questline {
            Some(_) => None,
            None => self.daily_task_description.filter(|d| !d.trim().is_empty()),
        };
        let finished = questline.as_ref().is_some_and(Questline::is_finished);
        Goal {
            id: self.id,
            name: self.name,
            deadline: self.deadline,
            starts_at: self.starts_at,
            daily_task_description,
            is_active: self.is_active.unwrap_or(true) && !finished,
            tags: self.tags,
            questline,
            created_at: self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

fn validate_skill(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<Skill, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let name = f.string("name").filter(|n| !n.is_empty());
    // Negative skill XP from older builds clamps to zero.
    let xp = match f.raw("xp") {
        Some(v) if v.as_f64().is_some_and(|x| x < 0.0) => Some(0),
        _ => f.count("xp"),
    };
    if name.is_none() && f.errors.is_empty() {
        f.fail("name", "empty");
    }
    f.finish(name.zip(xp).map(|(name, xp)| Skill { name, xp }))
}

fn validate_quest(value: &Value) -> Result<Quest, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let kind = match f.raw("type") {
        Some(_) => f.opt_enum("type", QuestKind::parse),
        None => {
            f.fail("type", "missing");
            None
        }
    };
    let target = f.count("target").map(|t| t.max(1));
    let current = f.opt_count("current").unwrap_or(0);
    let reward_xp = f.opt_count("rewardXp").unwrap_or(0);
    let claimed = f.opt_bool("claimed").unwrap_or(false);
    let description = f.opt_string("description").unwrap_or_default();
    let quest = match (id, kind, target) {
        (Some(id), Some(kind), Some(target)) => Some(Quest {
            id,
            kind,
            description,
            target,
            current: current.min(target),
            reward_xp,
            claimed,
        }),
        _ => None,
    };
    f.finish(quest)
}

fn daily_quests(raw: Option<&Value>, report: &mut HydrationReport) -> DailyQuests {
    // Older builds stored the bare quest list without a date.
    let (items, date) = match raw {
        Some(Value::Array(items)) => (items.as_slice(), None),
        Some(Value::Object(obj)) => (
            obj.get("quests")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            obj.get("date").and_then(parse_date),
        ),
        _ => return DailyQuests::default(),
    };
    let mut quests = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match validate_quest(item) {
            Ok(quest) => quests.push(quest),
            Err(errors) => report.drop_item("dailyQuests.quests", index, errors),
        }
    }
    DailyQuests { quests, date }
}

fn daily_streak(raw: Option<&Value>) -> DailyStreak {
    let Some(obj) = raw.and_then(Value::as_object) else {
        return DailyStreak::default();
    };
    DailyStreak {
        current: obj.get("current").and_then(count).unwrap_or(0),
        last_completion_date: obj.get("lastCompletionDate").and_then(parse_date),
    }
}

fn achievements(raw: Option<&Value>) -> BTreeSet<String> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.clone()),
            // Older builds persisted `{id, unlocked}` records.
            Value::Object(obj) if obj.get("unlocked").and_then(Value::as_bool) != Some(false) => {
                obj.get("id").and_then(Value::as_str).map(str::to_string)
            }
            _ => None,
        })
        .collect()
}

fn validate_boost(value: &Value) -> Result<Boost, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let multiplier = match f.raw("multiplier").and_then(Value::as_f64) {
        Some(m) if m.is_finite() && m > 0.0 => Some(m),
        _ => {
            f.fail("multiplier", "expected a positive number");
            None
        }
    };
    let expires_at = f.opt_datetime("expiresAt");
    if expires_at.is_none() && f.raw("expiresAt").is_none() {
        f.fail("expiresAt", "missing");
    }
    let source = f.opt_string("source").unwrap_or_else(|| "unknown".to_string());
    f.finish(multiplier.zip(expires_at).map(|(multiplier, expires_at)| Boost {
        multiplier,
        expires_at,
        source,
    }))
}

fn inventory(raw: Option<&Value>, report: &mut HydrationReport) -> Inventory {
    let Some(obj) = raw.and_then(Value::as_object) else {
        return Inventory::default();
    };
    // Older builds stored a bare cache count.
    let common = match obj.get("caches") {
        Some(Value::Object(caches)) => caches.get("common").and_then(count).unwrap_or(0),
        Some(other) => count(other).unwrap_or(0),
        None => 0,
    };
    let mut boosts = Vec::new();
    if let Some(items) = obj.get("boosts").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            match validate_boost(item) {
                Ok(boost) => boosts.push(boost),
                Err(errors) => report.drop_item("inventory.boosts", index, errors),
            }
        }
    }
    Inventory {
        caches: Caches { common },
        boosts,
        new_caches: 0,
    }
}

fn validate_reward(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<Reward, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let name = f.string("name");
    let cost = f.count("cost");
    let reward = match (id, name, cost) {
        (Some(id), Some(name), Some(cost)) => Some(Reward { id, name, cost }),
        _ => None,
    };
    f.finish(reward)
}

fn validate_redeemed(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<RedeemedReward, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let name = f.string("name");
    let cost = f.count("cost");
    let reward_id = f.opt_string("rewardId").unwrap_or_default();
    let redeemed_at = f.opt_datetime("redeemedAt").unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let redeemed = match (id, name, cost) {
        (Some(id), Some(name), Some(cost)) => Some(RedeemedReward {
            id,
            reward_id,
            name,
            cost,
            redeemed_at,
        }),
        _ => None,
    };
    f.finish(redeemed)
}

fn validate_journal_entry(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<JournalEntry, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let text = f.string("text");
    let created_at = match f.raw("createdAt") {
        Some(_) => f.opt_datetime("createdAt"),
        None => f.opt_datetime("date"),
    }
    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let entry = id.zip(text).map(|(id, text)| JournalEntry {
        id,
        text,
        created_at,
    });
    f.finish(entry)
}

fn validate_squad(
    value: &Value,
    _report: &mut HydrationReport,
    _path: &str,
) -> Result<Squad, Vec<FieldError>> {
    let mut f = Fields::new(value);
    let id = f.id("id");
    let name = f.string("name");
    let members = f.strings("members");
    let created_at = f.opt_datetime("createdAt").unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let squad = id.zip(name).map(|(id, name)| Squad {
        id,
        name,
        members,
        created_at,
    });
    f.finish(squad)
}

fn settings(root: &Map<String, Value>) -> Settings {
    let defaults = Settings::default();
    let obj = root.get("settings").and_then(Value::as_object);
    let get = |key: &str| obj.and_then(|o| o.get(key)).or_else(|| root.get(key));

    let mut api_keys: Vec<String> = get("apiKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    // Single-key shape from before the key pool.
    if let Some(key) = get("apiKey").and_then(Value::as_str).filter(|k| !k.is_empty()) {
        if !api_keys.iter().any(|k| k == key) {
            api_keys.push(key.to_string());
        }
    }

    let local_ai = get("localAi")
        .and_then(Value::as_object)
        .map(|o| LocalAiConfig {
            enabled: o.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            endpoint: o.get("endpoint").and_then(Value::as_str).map(str::to_string),
            model: o.get("model").and_then(Value::as_str).map(str::to_string),
        })
        .unwrap_or_default();

    Settings {
        theme: get("theme")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.theme),
        language: get("language")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.language),
        sound_enabled: get("soundEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.sound_enabled),
        api_keys,
        local_ai,
    }
}
