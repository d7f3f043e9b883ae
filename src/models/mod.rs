//! Data models for Bearing entities.
//!
//! This module defines the core data structures:
//! - `Task` - Board items with status, Eisenhower priority and optional parent
//! - `DayFocus` - The theme and notes chosen for one calendar day
//! - `NavigationContext` - Last view and filters of the UI (never versioned)
//! - [`okr`] - Life themes, objectives and key results
//! - [`board`] - Board columns, sections and drop-zone ordering
//!
//! Every record serializes with camelCase field names; these names are the
//! wire format shared with the UI process.

pub mod board;
pub mod okr;

pub use board::{BoardConfiguration, ColumnDefinition, ColumnType, SectionDefinition, TaskOrder};
pub use okr::{KeyResult, LifeTheme, Objective, OkrStatus};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
    Archived,
}

impl TaskStatus {
    /// Every status, in partition scan order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::Done,
        TaskStatus::Archived,
    ];

    /// Parse a status, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "doing" | "in-progress" | "in_progress" => Some(Self::Doing),
            "done" => Some(Self::Done),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Get the string representation (also the partition directory name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    /// The board column type this status is shown in. Archived tasks have none.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Todo => Some(ColumnType::Todo),
            Self::Doing => Some(ColumnType::Doing),
            Self::Done => Some(ColumnType::Done),
            Self::Archived => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Eisenhower quadrant of a task.
///
/// `NotImportantNotUrgent` (Q4) exists so that UI input can be parsed and
/// rejected with a proper violation; it is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    ImportantUrgent,
    #[default]
    ImportantNotUrgent,
    NotImportantUrgent,
    NotImportantNotUrgent,
}

impl Priority {
    /// Priorities a task may actually carry, most urgent first.
    pub const PERSISTABLE: [Priority; 3] = [
        Priority::ImportantUrgent,
        Priority::ImportantNotUrgent,
        Priority::NotImportantUrgent,
    ];

    /// Parse a priority from its wire name or quadrant label (`q1`..`q4`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "important-urgent" | "q1" => Some(Self::ImportantUrgent),
            "important-not-urgent" | "q2" => Some(Self::ImportantNotUrgent),
            "not-important-urgent" | "q3" => Some(Self::NotImportantUrgent),
            "not-important-not-urgent" | "q4" => Some(Self::NotImportantNotUrgent),
            _ => None,
        }
    }

    /// Get the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportantUrgent => "important-urgent",
            Self::ImportantNotUrgent => "important-not-urgent",
            Self::NotImportantUrgent => "not-important-urgent",
            Self::NotImportantNotUrgent => "not-important-not-urgent",
        }
    }

    /// Quadrant number, 1 (most urgent) to 4.
    pub fn quadrant(&self) -> u8 {
        match self {
            Self::ImportantUrgent => 1,
            Self::ImportantNotUrgent => 2,
            Self::NotImportantUrgent => 3,
            Self::NotImportantNotUrgent => 4,
        }
    }

    /// Whether the priority may be stored on a task.
    pub fn is_persistable(&self) -> bool {
        !matches!(self, Self::NotImportantNotUrgent)
    }

    /// The next quadrant up, or `None` when already at the top (or Q4).
    pub fn escalated(&self) -> Option<Self> {
        match self {
            Self::NotImportantUrgent => Some(Self::ImportantNotUrgent),
            Self::ImportantNotUrgent => Some(Self::ImportantUrgent),
            Self::ImportantUrgent | Self::NotImportantNotUrgent => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happens to subtasks when their parent finishes or is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadePolicy {
    /// Children are left alone
    #[default]
    #[serde(rename = "none")]
    NoAction,
    /// Children are archived, keeping their parent reference
    Archive,
    /// Children are deleted along with the parent
    Delete,
    /// Children become top-level tasks
    Promote,
}

impl CascadePolicy {
    /// Parse a policy, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "no-action" => Some(Self::NoAction),
            "archive" => Some(Self::Archive),
            "delete" => Some(Self::Delete),
            "promote" => Some(Self::Promote),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "none",
            Self::Archive => "archive",
            Self::Delete => "delete",
            Self::Promote => "promote",
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (e.g., "HF-T17")
    pub id: String,

    /// Task title
    pub title: String,

    /// Owning life theme
    pub theme_id: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Day the task is planned for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_date: Option<NaiveDate>,

    /// Deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Date from which the priority escalates automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_date: Option<NaiveDate>,

    /// Day of the last automatic escalation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_on: Option<NaiveDate>,

    /// Eisenhower quadrant
    #[serde(default)]
    pub priority: Priority,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Parent task for subtasks (soft reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new todo task with the given ID, theme and title.
    pub fn new(id: impl Into<String>, theme_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            theme_id: theme_id.into(),
            description: String::new(),
            tags: BTreeSet::new(),
            day_date: None,
            due_date: None,
            promotion_date: None,
            promoted_on: None,
            priority: Priority::default(),
            status: TaskStatus::default(),
            parent_task_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this task is a subtask of `parent_id`.
    pub fn is_child_of(&self, parent_id: &str) -> bool {
        self.parent_task_id.as_deref() == Some(parent_id)
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The focus chosen for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFocus {
    /// Calendar date (ISO 8601)
    pub date: NaiveDate,

    /// Theme the day is dedicated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,

    /// Short focus text
    #[serde(default)]
    pub text: String,

    /// Longer notes
    #[serde(default)]
    pub notes: String,
}

impl DayFocus {
    /// Create an empty focus entry for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            theme_id: None,
            text: String::new(),
            notes: String::new(),
        }
    }
}

/// Last UI position, restored on the next start. Not part of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContext {
    /// View that was open
    pub current_view: String,

    /// Item selected in that view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,

    /// Active theme filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_theme_id: Option<String>,

    /// Active date filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_date: Option<NaiveDate>,

    /// When the context was last saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self {
            current_view: "home".to_string(),
            current_item: None,
            filter_theme_id: None,
            filter_date: None,
            last_accessed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_wire_names() {
        let json = serde_json::to_string(&Priority::NotImportantUrgent).unwrap();
        assert_eq!(json, "\"not-important-urgent\"");
        let parsed: Priority = serde_json::from_str("\"important-urgent\"").unwrap();
        assert_eq!(parsed, Priority::ImportantUrgent);
    }

    #[test]
    fn test_priority_parse_quadrant_labels() {
        assert_eq!(Priority::parse("Q1"), Some(Priority::ImportantUrgent));
        assert_eq!(Priority::parse("q4"), Some(Priority::NotImportantNotUrgent));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_priority_escalation_chain() {
        assert_eq!(
            Priority::NotImportantUrgent.escalated(),
            Some(Priority::ImportantNotUrgent)
        );
        assert_eq!(
            Priority::ImportantNotUrgent.escalated(),
            Some(Priority::ImportantUrgent)
        );
        assert_eq!(Priority::ImportantUrgent.escalated(), None);
        assert_eq!(Priority::NotImportantNotUrgent.escalated(), None);
    }

    #[test]
    fn test_q4_is_not_persistable() {
        assert!(!Priority::NotImportantNotUrgent.is_persistable());
        assert!(Priority::PERSISTABLE.iter().all(|p| p.is_persistable()));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TaskStatus::parse("TODO"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::Doing));
        assert_eq!(TaskStatus::parse("closed"), None);
    }

    #[test]
    fn test_cascade_policy_serde() {
        assert_eq!(
            serde_json::to_string(&CascadePolicy::NoAction).unwrap(),
            "\"none\""
        );
        let parsed: CascadePolicy = serde_json::from_str("\"archive\"").unwrap();
        assert_eq!(parsed, CascadePolicy::Archive);
        assert_eq!(CascadePolicy::parse("no-action"), Some(CascadePolicy::NoAction));
    }

    #[test]
    fn test_task_json_field_names() {
        let mut task = Task::new("HF-T1", "HF", "Run 5k");
        task.parent_task_id = Some("HF-T0".to_string());
        task.promotion_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["themeId"], "HF");
        assert_eq!(value["parentTaskId"], "HF-T0");
        assert_eq!(value["promotionDate"], "2026-03-01");
        assert_eq!(value["priority"], "important-not-urgent");
        assert_eq!(value["status"], "todo");
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn test_task_roundtrip_preserves_all_fields() {
        let mut task = Task::new("HF-T2", "HF", "Stretch");
        task.description = "ten minutes".to_string();
        task.tags.insert("morning".to_string());
        task.day_date = NaiveDate::from_ymd_opt(2026, 1, 5);
        task.due_date = NaiveDate::from_ymd_opt(2026, 1, 9);
        task.status = TaskStatus::Doing;

        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_navigation_context_default() {
        let ctx = NavigationContext::default();
        assert_eq!(ctx.current_view, "home");
        assert!(ctx.current_item.is_none());
    }
}
