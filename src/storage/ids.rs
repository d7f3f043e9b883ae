//! Hierarchical identifiers.
//!
//! IDs are human-readable and encode their ancestry:
//! - Theme: initials of the name, uppercase (`HF`, collisions become `HF2`)
//! - Objective: `<parent>.O<n>` (`HF.O1`, `HF.O1.O2`)
//! - Key result: `<objective>.KR<n>` (`HF.O1.KR3`)
//! - Task: `<theme>-T<n>` (`HF-T17`)
//!
//! Suffix numbers are always one past the highest number already in use.
//! Task numbers additionally never fall below a per-theme counter of the
//! highest number ever issued, so deleting the newest task does not free
//! its id.

use crate::{Error, Result};

/// Maximum length of a generated theme abbreviation.
const MAX_THEME_ID_LEN: usize = 3;

/// Derive a theme ID from its name, avoiding every id in `existing`.
pub fn theme_id(name: &str, existing: &[&str]) -> String {
    let mut base: String = name
        .split(|c: char| !c.is_alphanumeric())
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_THEME_ID_LEN)
        .collect::<String>()
        .to_uppercase();

    if base.is_empty() {
        base = "T".to_string();
    }
    if !existing.contains(&base.as_str()) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if !existing.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// Next objective ID under a theme or objective.
pub fn objective_id<'a>(parent_id: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("{}.O", parent_id);
    format!("{}{}", prefix, next_suffix(&prefix, existing))
}

/// Next key result ID under an objective.
pub fn key_result_id<'a>(objective_id: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("{}.KR", objective_id);
    format!("{}{}", prefix, next_suffix(&prefix, existing))
}

/// Next task ID for a theme, above both the existing ids and `last_issued`.
pub fn task_id<'a>(
    theme_id: &str,
    existing: impl IntoIterator<Item = &'a str>,
    last_issued: u32,
) -> String {
    let prefix = format!("{}-T", theme_id);
    let n = next_suffix(&prefix, existing).max(last_issued + 1);
    format!("{}{}", prefix, n)
}

/// Numeric suffix of a task ID (`HF-T17` gives 17).
pub fn task_number(id: &str) -> Option<u32> {
    id.rsplit_once("-T")?.1.parse().ok()
}

/// One past the highest numeric suffix among ids that are exactly
/// `prefix` followed by digits.
fn next_suffix<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> u32 {
    existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|rest| rest.parse::<u32>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(1)
}

/// Theme part of an objective or key result ID.
pub fn theme_of(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// Theme part of a task ID.
pub fn theme_of_task(id: &str) -> Result<&str> {
    id.rsplit_once("-T")
        .filter(|(theme, n)| !theme.is_empty() && !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .map(|(theme, _)| theme)
        .ok_or_else(|| Error::InvalidId(format!("Task ID must look like <THEME>-T<n>, got: {}", id)))
}

/// Validate an ID before it is used as a file name.
pub fn validate_path_safe(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidId("ID must not be empty".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        || id.starts_with('.')
    {
        return Err(Error::InvalidId(format!(
            "ID may only contain letters, digits, '-', '.' and '_': {}",
            id
        )));
    }
    Ok(())
}
