//! Planning orchestrator.
//!
//! [`PlanningService`] is the single entry point the UI boundary talks to.
//! Each mutating operation follows the same sequence: load the current
//! state, ask the workflow rules whether the change is allowed, write the
//! records through [`Storage`] (one commit), then update the drop-zone
//! ordering (a second commit where needed).
//!
//! Rule rejections are not errors: they come back as an [`Outcome`] with
//! `success: false` and the violation list. `Err` is reserved for unknown
//! ids and persistence failures.

mod calendar;
mod okr;
mod tasks;

pub use okr::KeyResultUpdate;
pub use tasks::{NewTask, TaskChanges, TaskFilter};

use crate::models::{BoardConfiguration, CascadePolicy, NavigationContext, TaskOrder};
use crate::storage::{HistoryEntry, Storage};
use crate::workflow::{Validation, Violation};
use crate::Result;
use chrono::Utc;
use serde::Serialize;

/// The step of a multi-step operation that committed, and the one that did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    /// Step that was committed (e.g., "task-record")
    pub completed: String,
    /// Step that failed (e.g., "task-order")
    pub failed: String,
    /// Error of the failed step
    pub cause: String,
}

/// Result of an orchestrator operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    /// Whether the change was accepted
    pub success: bool,
    /// Resulting value, present when accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    /// Violations when rejected, warnings when accepted
    pub violations: Vec<Violation>,
    /// Set when a later step failed after an earlier step committed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialFailure>,
}

impl<T> Outcome<T> {
    /// An accepted change.
    pub fn accepted(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            violations: Vec::new(),
            partial: None,
        }
    }

    /// A change refused by the workflow rules.
    pub fn rejected(validation: Validation) -> Self {
        Self {
            success: false,
            value: None,
            violations: validation.into_violations(),
            partial: None,
        }
    }

    /// Attach non-blocking warnings.
    pub fn with_warnings(mut self, warnings: Vec<Violation>) -> Self {
        self.violations.extend(warnings);
        self
    }

    /// Mark the outcome as only partly persisted.
    pub fn with_partial(mut self, partial: PartialFailure) -> Self {
        self.partial = Some(partial);
        self
    }

    /// Whether every step was persisted.
    pub fn is_complete(&self) -> bool {
        self.success && self.partial.is_none()
    }

    /// Rule ids of the violations, in order.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.rule_id.as_str()).collect()
    }
}

/// Façade over storage and the workflow rules.
pub struct PlanningService {
    storage: Storage,
    cascade_policy: CascadePolicy,
}

impl PlanningService {
    /// Create a service over opened storage, with no cascade on subtasks.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            cascade_policy: CascadePolicy::default(),
        }
    }

    /// Set the cascade policy used when a parent task is finished or deleted.
    pub fn with_cascade_policy(mut self, policy: CascadePolicy) -> Self {
        self.cascade_policy = policy;
        self
    }

    /// The configured cascade policy.
    pub fn cascade_policy(&self) -> CascadePolicy {
        self.cascade_policy
    }

    /// Underlying storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // === Board ===

    /// The board layout.
    pub fn board_configuration(&self) -> Result<BoardConfiguration> {
        self.storage.load_board_configuration()
    }

    /// Replace the board layout.
    ///
    /// Tasks keep their status and priority; the ordering of zones that no
    /// longer exist is left in place until those tasks move again.
    pub fn update_board_configuration(
        &mut self,
        board: BoardConfiguration,
    ) -> Result<Outcome<BoardConfiguration>> {
        self.storage.save_board_configuration(&board)?;
        tracing::info!(columns = board.columns.len(), "board configuration saved");
        Ok(Outcome::accepted(board))
    }

    /// Set or clear the WIP limit of a column or section.
    pub fn set_wip_limit(
        &mut self,
        zone: &str,
        limit: Option<u32>,
    ) -> Result<Outcome<BoardConfiguration>> {
        let mut board = self.storage.load_board_configuration()?;
        let mut found = false;
        for column in &mut board.columns {
            if column.name == zone {
                column.wip_limit = limit;
                found = true;
            }
            for section in &mut column.sections {
                if section.name == zone {
                    section.wip_limit = limit;
                    found = true;
                }
            }
        }
        if !found {
            return Err(crate::Error::NotFound(format!(
                "Column or section not found: {}",
                zone
            )));
        }
        self.update_board_configuration(board)
    }

    /// The manual ordering of every drop zone.
    pub fn task_order(&self) -> Result<TaskOrder> {
        self.storage.load_task_order()
    }

    // === Navigation ===

    /// The last saved UI position.
    pub fn load_navigation_context(&self) -> Result<NavigationContext> {
        self.storage.load_navigation_context()
    }

    /// Remember the UI position. Never recorded in the history.
    pub fn save_navigation_context(
        &mut self,
        mut context: NavigationContext,
    ) -> Result<NavigationContext> {
        context.last_accessed = Some(Utc::now());
        self.storage.save_navigation_context(&context)?;
        Ok(context)
    }

    // === Audit ===

    /// Most recent history entries, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.storage.history(limit)
    }
}
