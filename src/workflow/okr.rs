//! Objective and key result lifecycle rules.

use super::{Category, Validation, Violation};
use crate::models::{KeyResult, LifeTheme, Objective, OkrStatus, Task};

/// Whether an objective or key result may go from `from` to `to`.
///
/// Active items must be completed before they can be archived; completed
/// and archived items may always be reopened.
pub fn is_legal_okr_transition(from: OkrStatus, to: OkrStatus) -> bool {
    use OkrStatus::*;
    from == to
        || matches!(
            (from, to),
            (Active, Completed)
                | (Completed, Archived)
                | (Completed, Active)
                | (Archived, Active)
        )
}

fn validate_okr_transition(kind: &str, id: &str, from: OkrStatus, to: OkrStatus) -> Validation {
    if is_legal_okr_transition(from, to) {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "invalid-transition",
        Category::Okr,
        format!("Cannot change {} '{}' from '{}' to '{}'", kind, id, from, to),
    ))
}

/// Ids of every active item strictly below `objective`: nested objectives
/// and key results at any depth, in document order.
pub fn active_descendants(objective: &Objective) -> Vec<&str> {
    let mut ids = Vec::new();
    let mut stack: Vec<&Objective> = vec![objective];
    while let Some(obj) = stack.pop() {
        if !std::ptr::eq(obj, objective) && obj.status == OkrStatus::Active {
            ids.push(obj.id.as_str());
        }
        ids.extend(
            obj.key_results
                .iter()
                .filter(|kr| kr.status == OkrStatus::Active)
                .map(|kr| kr.id.as_str()),
        );
        stack.extend(obj.objectives.iter().rev());
    }
    ids
}

/// Validate a status change of an objective.
///
/// Completing an objective requires every descendant to be closed first;
/// each still-active descendant is reported as its own violation.
pub fn validate_objective_status(objective: &Objective, to: OkrStatus) -> Validation {
    let mut validation = validate_okr_transition("objective", &objective.id, objective.status, to);
    if to == OkrStatus::Completed && objective.status != OkrStatus::Completed {
        for id in active_descendants(objective) {
            validation.push(Violation::error(
                "objective-incomplete",
                Category::Okr,
                format!(
                    "Objective '{}' cannot be completed while '{}' is still active",
                    objective.id, id
                ),
            ));
        }
    }
    validation
}

/// Validate a status change of a key result.
pub fn validate_key_result_status(key_result: &KeyResult, to: OkrStatus) -> Validation {
    validate_okr_transition("key result", &key_result.id, key_result.status, to)
}

/// Validate objective or key result text.
pub fn validate_okr_text(kind: &str, text: &str) -> Validation {
    if !text.trim().is_empty() {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "title-required",
        Category::Input,
        format!("The {} text must not be empty", kind),
    ))
}

/// Validate key result progress values.
pub fn validate_key_result_values(key_result: &KeyResult) -> Validation {
    let values = [
        key_result.start_value,
        key_result.current_value,
        key_result.target_value,
    ];
    if values.iter().all(|v| v.is_finite()) {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "key-result-values",
        Category::Input,
        format!(
            "Key result '{}' values must be finite numbers",
            key_result.id
        ),
    ))
}

/// Validate theme fields.
pub fn validate_theme(theme: &LifeTheme) -> Validation {
    if !theme.name.trim().is_empty() {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "title-required",
        Category::Input,
        "Theme name must not be empty",
    ))
}

/// A theme can only be deleted once no task refers to it.
pub fn validate_theme_deletion(theme_id: &str, tasks: &[Task]) -> Validation {
    let count = tasks.iter().filter(|t| t.theme_id == theme_id).count();
    if count == 0 {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "theme-has-tasks",
        Category::Hierarchy,
        format!(
            "Theme '{}' still has {} task(s); move or delete them first",
            theme_id, count
        ),
    ))
}
