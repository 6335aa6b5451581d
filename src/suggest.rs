//! Shape checks for externally generated suggestions.
//!
//! Task breakdowns, goal suggestions and daily quest drafts come from an outside generator as
//! JSON text. Nothing here trusts that text: anything that does not match the expected shape is a
//! [`GenerationError`], which callers present as "no suggestions" rather than as corrupt state.

use serde_json::Value;
use thiserror::Error;

use crate::models::{QuestDraft, QuestKind};

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response has no list of {0}")]
    MissingList(&'static str),

    #[error("item {index} is invalid: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("response contained no usable items")]
    Empty,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

fn parse(raw: &str) -> GenerationResult<Value> {
    serde_json::from_str(raw.trim()).map_err(|e| GenerationError::NotJson(e.to_string()))
}

/// Find the array in a response: either the top-level value or the only array-valued field of
/// a wrapping object.
fn find_array<'a>(value: &'a Value, what: &'static str) -> GenerationResult<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) => {
            let mut arrays = map.values().filter_map(Value::as_array);
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => Ok(items),
                _ => Err(GenerationError::MissingList(what)),
            }
        }
        _ => Err(GenerationError::MissingList(what)),
    }
}

/// Parse a list of suggestion strings (subtasks, goal ideas).
///
/// Entries are trimmed; blank entries are skipped. A non-string entry fails the whole response.
pub fn parse_string_list(raw: &str) -> GenerationResult<Vec<String>> {
    let value = parse(raw)?;
    let items = find_array(&value, "strings")?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(GenerationError::InvalidItem {
                index,
                reason: "expected a string".to_string(),
            });
        };
        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    if out.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(out)
}

fn positive(item: &Value, key: &str, index: usize) -> GenerationResult<u32> {
    item.get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32)
        .ok_or_else(|| GenerationError::InvalidItem {
            index,
            reason: format!("`{}` must be a positive number", key),
        })
}

fn quest_draft(index: usize, item: &Value) -> GenerationResult<QuestDraft> {
    let invalid = |reason: &str| GenerationError::InvalidItem {
        index,
        reason: reason.to_string(),
    };
    if !item.is_object() {
        return Err(invalid("expected an object"));
    }
    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .and_then(QuestKind::parse)
        .ok_or_else(|| invalid("unknown quest type"))?;
    let description = item
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("missing description"))?;
    Ok(QuestDraft {
        kind,
        description: description.to_string(),
        target: positive(item, "target", index)?,
        reward_xp: positive(item, "rewardXp", index)?,
    })
}

/// Parse generated daily quest drafts, ready for `set_daily_quests`.
///
/// Every entry needs a known `type`, a non-empty `description`, and positive `target` and
/// `rewardXp`. One bad entry rejects the response.
pub fn parse_quest_drafts(raw: &str) -> GenerationResult<Vec<QuestDraft>> {
    let value = parse(raw)?;
    let items = find_array(&value, "quests")?;
    let drafts = items
        .iter()
        .enumerate()
        .map(|(index, item)| quest_draft(index, item))
        .collect::<GenerationResult<Vec<_>>>()?;
    if drafts.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(drafts)
}
