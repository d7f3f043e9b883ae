//! Board layout and manual task ordering.
//!
//! A board is a list of columns, each mapped to a task status. A column may
//! be split into sections, one per priority quadrant. Every section (or
//! every unsectioned column) is a drop zone whose task order is stored in
//! [`TaskOrder`], independently of the task records.

use super::{Priority, Task, TaskStatus};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Zone holding archived tasks, which have no column.
pub const ARCHIVED_ZONE: &str = "archived";

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Todo,
    Doing,
    Done,
}

impl ColumnType {
    /// The task status of tasks shown in this column.
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Todo => TaskStatus::Todo,
            Self::Doing => TaskStatus::Doing,
            Self::Done => TaskStatus::Done,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status().as_str())
    }
}

/// A section of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    /// Section name; for priority sections this is the priority wire name
    pub name: String,
    /// Display title
    pub title: String,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Maximum number of tasks in the section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
}

impl SectionDefinition {
    /// The priority this section stands for, if its name is a priority.
    pub fn priority(&self) -> Option<Priority> {
        Priority::parse(&self.name)
    }
}

/// A board column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name (unique on the board)
    pub name: String,
    /// Display title
    pub title: String,
    /// Which status the column holds
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Maximum number of tasks in the column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    /// Priority sections, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionDefinition>,
}

impl ColumnDefinition {
    /// Find a section by name.
    pub fn section(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The section a task of the given priority belongs to.
    pub fn section_for(&self, priority: Priority) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.priority() == Some(priority))
    }
}

/// The board layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfiguration {
    /// Board name
    pub name: String,
    /// Columns, in display order
    pub columns: Vec<ColumnDefinition>,
}

impl Default for BoardConfiguration {
    fn default() -> Self {
        let section = |priority: Priority, title: &str, color: &str| SectionDefinition {
            name: priority.as_str().to_string(),
            title: title.to_string(),
            color: color.to_string(),
            wip_limit: None,
        };
        Self {
            name: "Bearing Board".to_string(),
            columns: vec![
                ColumnDefinition {
                    name: "todo".to_string(),
                    title: "TODO".to_string(),
                    column_type: ColumnType::Todo,
                    wip_limit: None,
                    sections: vec![
                        section(Priority::ImportantUrgent, "Important & Urgent", "#ef4444"),
                        section(Priority::ImportantNotUrgent, "Important", "#3b82f6"),
                        section(Priority::NotImportantUrgent, "Urgent", "#f59e0b"),
                    ],
                },
                ColumnDefinition {
                    name: "doing".to_string(),
                    title: "DOING".to_string(),
                    column_type: ColumnType::Doing,
                    wip_limit: None,
                    sections: Vec::new(),
                },
                ColumnDefinition {
                    name: "done".to_string(),
                    title: "DONE".to_string(),
                    column_type: ColumnType::Done,
                    wip_limit: None,
                    sections: Vec::new(),
                },
            ],
        }
    }
}

impl BoardConfiguration {
    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The first column holding tasks of the given status.
    pub fn column_for_status(&self, status: TaskStatus) -> Option<&ColumnDefinition> {
        let column_type = status.column_type()?;
        self.columns.iter().find(|c| c.column_type == column_type)
    }

    /// The drop zone a task is shown in.
    pub fn zone_for(&self, task: &Task) -> String {
        let Some(column) = self.column_for_status(task.status) else {
            return ARCHIVED_ZONE.to_string();
        };
        if column.sections.is_empty() {
            return column.name.clone();
        }
        column
            .section_for(task.priority)
            .or_else(|| column.sections.first())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| column.name.clone())
    }

    /// Every drop zone id on the board, archived zone last.
    pub fn zone_ids(&self) -> Vec<String> {
        let mut zones = Vec::new();
        for column in &self.columns {
            if column.sections.is_empty() {
                zones.push(column.name.clone());
            } else {
                zones.extend(column.sections.iter().map(|s| s.name.clone()));
            }
        }
        zones.push(ARCHIVED_ZONE.to_string());
        zones
    }

    /// Check structural consistency: unique zone names and at least one
    /// column per column type.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for zone in self.zone_ids() {
            if !seen.insert(zone.clone()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate column or section name: {}",
                    zone
                )));
            }
        }
        for column_type in [ColumnType::Todo, ColumnType::Doing, ColumnType::Done] {
            if !self.columns.iter().any(|c| c.column_type == column_type) {
                return Err(Error::InvalidInput(format!(
                    "Board has no column of type '{}'",
                    column_type
                )));
            }
        }
        Ok(())
    }
}

/// Manual task ordering per drop zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskOrder {
    zones: BTreeMap<String, Vec<String>>,
}

impl TaskOrder {
    /// Create an empty ordering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Task ids of a zone, in order.
    pub fn zone(&self, zone: &str) -> &[String] {
        self.zones.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all zones.
    pub fn zones(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.zones.iter()
    }

    /// Replace a zone's order wholesale.
    pub fn set_zone(&mut self, zone: impl Into<String>, ids: Vec<String>) {
        self.zones.insert(zone.into(), ids);
    }

    /// Find the zone and index holding a task.
    pub fn locate(&self, task_id: &str) -> Option<(&str, usize)> {
        self.zones.iter().find_map(|(zone, ids)| {
            ids.iter()
                .position(|id| id == task_id)
                .map(|idx| (zone.as_str(), idx))
        })
    }

    /// Remove a task from every zone. Returns the zones it was removed from.
    pub fn remove(&mut self, task_id: &str) -> Vec<String> {
        let mut touched = Vec::new();
        for (zone, ids) in self.zones.iter_mut() {
            let before = ids.len();
            ids.retain(|id| id != task_id);
            if ids.len() != before {
                touched.push(zone.clone());
            }
        }
        touched
    }

    /// Insert a task into a zone at `position` (appended when `None` or past
    /// the end). Any previous placement of the task is removed first.
    pub fn insert(&mut self, zone: &str, task_id: &str, position: Option<usize>) {
        self.remove(task_id);
        let ids = self.zones.entry(zone.to_string()).or_default();
        let at = position.map(|p| p.min(ids.len())).unwrap_or(ids.len());
        ids.insert(at, task_id.to_string());
    }

    /// Whether no zone holds any task.
    pub fn is_empty(&self) -> bool {
        self.zones.values().all(Vec::is_empty)
    }
}
