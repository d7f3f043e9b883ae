//! Priority rules and date-based promotion.
//!
//! A task with a promotion date moves one quadrant up once that date has
//! arrived: Q3 becomes Q2, Q2 becomes Q1. Each task escalates at most once
//! per day, tracked through `Task::promoted_on`, so running the scan twice
//! on the same day changes nothing the second time. Done and archived tasks
//! are never promoted.

use super::{Category, Validation, Violation};
use crate::models::{Priority, Task, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reject priorities that may not be stored on a task.
pub fn validate_priority(priority: Priority) -> Validation {
    if priority.is_persistable() {
        return Validation::accepted();
    }
    let allowed: Vec<&str> = Priority::PERSISTABLE.iter().map(|p| p.as_str()).collect();
    Validation::rejected(Violation::error(
        "priority",
        Category::Priority,
        format!(
            "Priority '{}' is not allowed; use one of: {}",
            priority,
            allowed.join(", ")
        ),
    ))
}

/// One planned escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Task being promoted
    pub id: String,
    /// Priority before the promotion
    #[serde(rename = "old")]
    pub old_priority: Priority,
    /// Priority after the promotion
    #[serde(rename = "new")]
    pub new_priority: Priority,
}

/// Whether `task` is due for escalation on `today`.
pub fn promotion_for(task: &Task, today: NaiveDate) -> Option<Promotion> {
    if !matches!(task.status, TaskStatus::Todo | TaskStatus::Doing) {
        return None;
    }
    let due = task.promotion_date?;
    if due > today || task.promoted_on == Some(today) {
        return None;
    }
    let new_priority = task.priority.escalated()?;
    Some(Promotion {
        id: task.id.clone(),
        old_priority: task.priority,
        new_priority,
    })
}

/// Scan tasks and list every escalation due on `today`, in input order.
pub fn plan_promotions(tasks: &[Task], today: NaiveDate) -> Vec<Promotion> {
    tasks.iter().filter_map(|t| promotion_for(t, today)).collect()
}

/// Apply a planned promotion to its task.
pub fn apply_promotion(task: &mut Task, promotion: &Promotion, today: NaiveDate) {
    task.priority = promotion.new_priority;
    task.promoted_on = Some(today);
    task.touch();
}
