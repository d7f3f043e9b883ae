//! Task field and hierarchy rules.

use super::priority::validate_priority;
use super::{Category, Validation, Violation};
use crate::models::{LifeTheme, Task};

/// Validate the fields of a task record as it is about to be stored.
///
/// Parent references are checked separately by [`validate_parent`].
pub fn validate_task(task: &Task, themes: &[LifeTheme]) -> Validation {
    let mut validation = Validation::accepted();

    if task.title.trim().is_empty() {
        validation.push(Violation::error(
            "title-required",
            Category::Input,
            "Task title must not be empty",
        ));
    }

    validation.merge(validate_priority(task.priority));

    if !themes.iter().any(|t| t.id == task.theme_id) {
        validation.push(Violation::error(
            "theme-not-found",
            Category::Hierarchy,
            format!("Theme '{}' does not exist", task.theme_id),
        ));
    }

    if let (Some(promote), Some(due)) = (task.promotion_date, task.due_date) {
        if promote > due {
            validation.push(Violation::warning(
                "promotion-after-due",
                Category::Priority,
                format!(
                    "Promotion date {} is after the due date {}",
                    promote, due
                ),
            ));
        }
    }

    validation
}

/// Validate the parent reference of a task.
///
/// `tasks` is the current state and may contain an older version of `task`
/// itself. Subtasks nest one level deep and stay within their parent's theme.
pub fn validate_parent(task: &Task, tasks: &[Task]) -> Validation {
    let mut validation = Validation::accepted();
    let Some(parent_id) = task.parent_task_id.as_deref() else {
        return validation;
    };

    if parent_id == task.id {
        validation.push(Violation::error(
            "subtask-depth",
            Category::Hierarchy,
            "A task cannot be its own parent",
        ));
        return validation;
    }

    match tasks.iter().find(|t| t.id == parent_id) {
        None => validation.push(Violation::error(
            "parent-not-found",
            Category::Hierarchy,
            format!("Parent task '{}' does not exist", parent_id),
        )),
        Some(parent) => {
            if parent.parent_task_id.is_some() {
                validation.push(Violation::error(
                    "subtask-depth",
                    Category::Hierarchy,
                    format!("Task '{}' is already a subtask and cannot have subtasks", parent_id),
                ));
            }
            if parent.theme_id != task.theme_id {
                validation.push(Violation::error(
                    "subtask-theme",
                    Category::Hierarchy,
                    format!(
                        "Subtask must share the theme of its parent '{}' ({})",
                        parent_id, parent.theme_id
                    ),
                ));
            }
        }
    }

    if tasks.iter().any(|t| t.id != task.id && t.is_child_of(&task.id)) {
        validation.push(Violation::error(
            "subtask-depth",
            Category::Hierarchy,
            format!("Task '{}' has subtasks and cannot become a subtask", task.id),
        ));
    }

    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::NaiveDate;

    fn themes() -> Vec<LifeTheme> {
        vec![LifeTheme::new("HF", "Health & Fitness", "#0a0")]
    }

    fn rule_ids(v: Validation) -> Vec<String> {
        v.into_violations().into_iter().map(|v| v.rule_id).collect()
    }

    fn validate_all(task: &Task, tasks: &[Task]) -> Validation {
        let mut v = validate_task(task, &themes());
        v.merge(validate_parent(task, tasks));
        v
    }

    #[test]
    fn test_valid_task() {
        let t = Task::new("HF-T1", "HF", "Run");
        assert!(validate_all(&t, &[]).is_empty());
    }

    #[test]
    fn test_blank_title() {
        let t = Task::new("HF-T1", "HF", "   ");
        assert_eq!(rule_ids(validate_all(&t, &[])), vec!["title-required"]);
    }

    #[test]
    fn test_unknown_theme_and_q4_reported_together() {
        let mut t = Task::new("XX-T1", "XX", "Run");
        t.priority = Priority::NotImportantNotUrgent;
        assert_eq!(
            rule_ids(validate_all(&t, &[])),
            vec!["priority", "theme-not-found"]
        );
    }

    #[test]
    fn test_subtask_of_subtask_rejected() {
        let parent = Task::new("HF-T1", "HF", "Parent");
        let mut child = Task::new("HF-T2", "HF", "Child");
        child.parent_task_id = Some("HF-T1".to_string());
        let mut grandchild = Task::new("HF-T3", "HF", "Grandchild");
        grandchild.parent_task_id = Some("HF-T2".to_string());

        let tasks = vec![parent, child.clone()];
        assert!(validate_all(&child, &tasks).is_accepted());
        assert_eq!(
            rule_ids(validate_all(&grandchild, &tasks)),
            vec!["subtask-depth"]
        );
    }

    #[test]
    fn test_parent_with_children_cannot_become_subtask() {
        let other = Task::new("HF-T9", "HF", "Other");
        let mut parent = Task::new("HF-T1", "HF", "Parent");
        let mut child = Task::new("HF-T2", "HF", "Child");
        child.parent_task_id = Some("HF-T1".to_string());
        let tasks = vec![other, parent.clone(), child];

        parent.parent_task_id = Some("HF-T9".to_string());
        assert_eq!(
            rule_ids(validate_all(&parent, &tasks)),
            vec!["subtask-depth"]
        );
    }

    #[test]
    fn test_missing_parent_and_self_parent() {
        let mut t = Task::new("HF-T1", "HF", "Orphan");
        t.parent_task_id = Some("HF-T7".to_string());
        assert_eq!(rule_ids(validate_all(&t, &[])), vec!["parent-not-found"]);

        t.parent_task_id = Some("HF-T1".to_string());
        assert_eq!(rule_ids(validate_all(&t, &[])), vec!["subtask-depth"]);
    }

    #[test]
    fn test_parent_in_other_theme() {
        let parent = Task::new("C-T1", "C", "Career parent");
        let mut child = Task::new("HF-T1", "HF", "Child");
        child.parent_task_id = Some("C-T1".to_string());
        assert_eq!(
            rule_ids(validate_all(&child, &[parent])),
            vec!["subtask-theme"]
        );
    }

    #[test]
    fn test_promotion_after_due_is_only_a_warning() {
        let mut t = Task::new("HF-T1", "HF", "Taxes");
        t.due_date = NaiveDate::from_ymd_opt(2026, 4, 1);
        t.promotion_date = NaiveDate::from_ymd_opt(2026, 4, 15);
        let v = validate_all(&t, &[]);
        assert!(v.is_accepted());
        assert_eq!(rule_ids(v), vec!["promotion-after-due"]);
    }
}
