//! Task operations: create, edit, move, order, promote, delete.

use super::{Outcome, PartialFailure, PlanningService};
use crate::models::board::ARCHIVED_ZONE;
use crate::models::{BoardConfiguration, CascadePolicy, Priority, Task, TaskOrder, TaskStatus};
use crate::workflow::cascade::{self, CascadePlan, CascadeTrigger};
use crate::workflow::priority::{self, Promotion};
use crate::workflow::{tasks as task_rules, transitions};
use crate::workflow::{Category, Validation, Violation};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Fields of a task to create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub theme_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub day_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub promotion_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub parent_task_id: Option<String>,
}

/// Criteria for [`PlanningService::list_tasks`]. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub theme_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub parent_task_id: Option<String>,
    pub tag: Option<String>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        self.theme_id.as_ref().is_none_or(|id| &task.theme_id == id)
            && self.status.is_none_or(|s| task.status == s)
            && self
                .parent_task_id
                .as_ref()
                .is_none_or(|id| task.is_child_of(id))
            && self.tag.as_ref().is_none_or(|tag| task.tags.contains(tag))
    }
}

/// Every task record written or removed by one operation.
///
/// The task the operation was about comes first in `updated`; cascaded
/// subtasks follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskChanges {
    pub updated: Vec<Task>,
    pub deleted: Vec<String>,
}

impl TaskChanges {
    fn single(task: Task) -> Self {
        Self {
            updated: vec![task],
            deleted: Vec::new(),
        }
    }

    /// Find an updated task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.updated.iter().find(|t| t.id == id)
    }

    /// Ids of every updated task.
    pub fn updated_ids(&self) -> Vec<&str> {
        self.updated.iter().map(|t| t.id.as_str()).collect()
    }
}

impl PlanningService {
    /// List tasks in board order: by drop zone, then manual order, then age.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks = match filter.status {
            Some(status) => self.storage.load_tasks_by_status(status)?,
            None => self.storage.load_all_tasks()?,
        };
        tasks.retain(|t| filter.matches(t));

        let board = self.storage.load_board_configuration()?;
        let order = self.storage.load_task_order()?;
        sort_for_board(&mut tasks, &board, &order);
        Ok(tasks)
    }

    /// Get one task.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        Ok(self.storage.find_task_by_id(id)?.task)
    }

    /// Create a task in the todo column. The id is assigned here.
    pub fn create_task(&mut self, new: NewTask) -> Result<Outcome<TaskChanges>> {
        let themes = self.storage.load_themes()?;
        let tasks = self.storage.load_all_tasks()?;
        let board = self.storage.load_board_configuration()?;

        let mut task = Task::new(String::new(), new.theme_id, new.title);
        task.description = new.description;
        task.tags = new.tags;
        task.day_date = new.day_date;
        task.due_date = new.due_date;
        task.promotion_date = new.promotion_date;
        task.priority = new.priority;
        task.parent_task_id = new.parent_task_id;

        let mut validation = task_rules::validate_task(&task, &themes);
        validation.merge(task_rules::validate_parent(&task, &tasks));
        validation.merge(transitions::validate_capacity(
            &board,
            &tasks,
            task.status,
            task.priority,
        ));
        if !validation.is_accepted() {
            tracing::debug!(violations = ?validation.violations(), "task creation rejected");
            return Ok(Outcome::rejected(validation));
        }

        task.id = self.storage.next_task_id(&task.theme_id)?;
        let changes = TaskChanges::single(task);
        let message = format!("Create task {}", changes.updated[0].id);
        self.storage
            .apply_task_changes(&changes.updated, &[], &message)?;

        let outcome = Outcome::accepted(changes.clone()).with_warnings(validation.into_violations());
        Ok(self.with_order_sync(&changes, None, outcome))
    }

    /// Replace a task's editable fields.
    ///
    /// `createdAt` and `promotedOn` are kept from the stored record. A
    /// status or priority change goes through the same transition, WIP and
    /// cascade rules as a move.
    pub fn update_task(&mut self, task: Task) -> Result<Outcome<TaskChanges>> {
        let before = self.storage.find_task_by_id(&task.id)?.task;
        let mut after = task;
        after.created_at = before.created_at;
        after.promoted_on = before.promoted_on;
        after.touch();
        let message = format!("Update task {}", after.id);
        self.change_task(before, after, None, message)
    }

    /// Change a task's status.
    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Result<Outcome<TaskChanges>> {
        let before = self.storage.find_task_by_id(id)?.task;
        if before.status == status {
            return Ok(Outcome::accepted(TaskChanges::single(before)));
        }
        let mut after = before.clone();
        after.status = status;
        after.touch();
        let message = format!("Move task {} to {}", id, status);
        self.change_task(before, after, None, message)
    }

    /// Move a task to a drop zone, optionally at a position.
    ///
    /// A zone is a column name, a section name or `archived`. Landing in a
    /// priority section gives the task that priority. The task record is
    /// committed first and the ordering second; if only the ordering fails
    /// the outcome is marked partial.
    pub fn move_task(
        &mut self,
        id: &str,
        zone: &str,
        position: Option<usize>,
    ) -> Result<Outcome<TaskChanges>> {
        let before = self.storage.find_task_by_id(id)?.task;
        let board = self.storage.load_board_configuration()?;
        let Some((status, priority)) = resolve_zone(&board, zone) else {
            return Ok(Outcome::rejected(unknown_zone(zone)));
        };

        let mut after = before.clone();
        after.status = status;
        if let Some(priority) = priority {
            after.priority = priority;
        }

        if after == before {
            // Same zone: only the ordering changes
            let changes = TaskChanges::single(before);
            self.sync_order(&changes, position)?;
            return Ok(Outcome::accepted(changes));
        }

        after.touch();
        let message = format!("Move task {} to {}", id, zone);
        self.change_task(before, after, position, message)
    }

    /// Set the manual order of one drop zone.
    ///
    /// `ids` must all currently live in `zone`. Tasks of the zone that are
    /// not listed keep their relative order after the listed ones.
    pub fn reorder_tasks(&mut self, zone: &str, ids: &[String]) -> Result<Outcome<TaskOrder>> {
        let board = self.storage.load_board_configuration()?;
        if !board.zone_ids().iter().any(|z| z == zone) {
            return Ok(Outcome::rejected(unknown_zone(zone)));
        }

        let mut validation = Validation::accepted();
        let mut seen = BTreeSet::new();
        for id in ids {
            let task = self.storage.find_task_by_id(id)?.task;
            let current = board.zone_for(&task);
            if current != zone {
                validation.push(Violation::error(
                    "zone-mismatch",
                    Category::Workflow,
                    format!("Task '{}' is in '{}', not '{}'", id, current, zone),
                ));
            }
            if !seen.insert(id.as_str()) {
                validation.push(Violation::error(
                    "duplicate-id",
                    Category::Input,
                    format!("Task '{}' is listed more than once", id),
                ));
            }
        }
        if !validation.is_accepted() {
            return Ok(Outcome::rejected(validation));
        }

        let mut order = self.storage.load_task_order()?;
        let mut zone_ids = ids.to_vec();
        zone_ids.extend(
            order
                .zone(zone)
                .iter()
                .filter(|id| !seen.contains(id.as_str()))
                .cloned(),
        );
        order.set_zone(zone, zone_ids);
        self.storage.save_task_order(&order)?;
        Ok(Outcome::accepted(order))
    }

    /// Delete a task, applying the cascade policy to its subtasks.
    ///
    /// `policy_override` replaces the configured policy for this call only.
    pub fn delete_task(
        &mut self,
        id: &str,
        policy_override: Option<CascadePolicy>,
    ) -> Result<Outcome<TaskChanges>> {
        self.storage.find_task_by_id(id)?;
        let tasks = self.storage.load_all_tasks()?;
        let policy = policy_override.unwrap_or(self.cascade_policy);
        let plan = cascade::plan_cascade(id, CascadeTrigger::Deleted, policy, &tasks);

        let mut changes = TaskChanges {
            updated: Vec::new(),
            deleted: vec![id.to_string()],
        };
        apply_cascade(&plan, &tasks, &mut changes);

        let message = cascade_message(format!("Delete task {}", id), &plan, policy);
        self.storage
            .apply_task_changes(&changes.updated, &changes.deleted, &message)?;
        tracing::info!(%id, %policy, subtasks = plan.effects.len(), "task deleted");

        let outcome = Outcome::accepted(changes.clone());
        Ok(self.with_order_sync(&changes, None, outcome))
    }

    /// Escalate every task whose promotion date has arrived.
    ///
    /// Returns the escalations made. Running it again on the same day
    /// finds nothing to do.
    pub fn run_priority_promotion(&mut self, today: NaiveDate) -> Result<Outcome<Vec<Promotion>>> {
        let mut tasks = self.storage.load_all_tasks()?;
        let promotions = priority::plan_promotions(&tasks, today);
        if promotions.is_empty() {
            return Ok(Outcome::accepted(promotions));
        }

        let mut changes = TaskChanges::default();
        for promotion in &promotions {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == promotion.id) {
                priority::apply_promotion(task, promotion, today);
                changes.updated.push(task.clone());
            }
        }

        let message = format!("Promote {} task(s) on {}", promotions.len(), today);
        self.storage
            .apply_task_changes(&changes.updated, &[], &message)?;
        tracing::info!(count = promotions.len(), %today, "priorities promoted");

        let outcome = Outcome::accepted(promotions);
        Ok(self.with_order_sync(&changes, None, outcome))
    }

    /// Validate and persist a change to one existing task, including any
    /// cascade on its subtasks.
    fn change_task(
        &mut self,
        before: Task,
        after: Task,
        position: Option<usize>,
        message: String,
    ) -> Result<Outcome<TaskChanges>> {
        let themes = self.storage.load_themes()?;
        let tasks = self.storage.load_all_tasks()?;
        let board = self.storage.load_board_configuration()?;

        let mut validation = Validation::accepted();
        if after.theme_id != before.theme_id {
            validation.push(Violation::error(
                "theme-change",
                Category::Hierarchy,
                format!(
                    "Task '{}' belongs to theme '{}'; create a new task to change it",
                    before.id, before.theme_id
                ),
            ));
        }
        validation.merge(task_rules::validate_task(&after, &themes));
        if after.parent_task_id != before.parent_task_id {
            validation.merge(task_rules::validate_parent(&after, &tasks));
        }
        validation.merge(transitions::validate_move(
            &board,
            &tasks,
            &before,
            after.status,
            after.priority,
        ));
        if !validation.is_accepted() {
            tracing::debug!(id = %before.id, violations = ?validation.violations(), "task change rejected");
            return Ok(Outcome::rejected(validation));
        }

        let mut plan = CascadePlan::default();
        if after.status != before.status {
            plan = cascade::plan_cascade(
                &after.id,
                CascadeTrigger::StatusChanged(after.status),
                self.cascade_policy,
                &tasks,
            );
        }

        let mut changes = TaskChanges::single(after);
        apply_cascade(&plan, &tasks, &mut changes);
        let message = cascade_message(message, &plan, self.cascade_policy);
        self.storage
            .apply_task_changes(&changes.updated, &changes.deleted, &message)?;

        let outcome = Outcome::accepted(changes.clone()).with_warnings(validation.into_violations());
        Ok(self.with_order_sync(&changes, position, outcome))
    }

    /// Bring the ordering in line with committed task changes, turning an
    /// ordering failure into a partial outcome.
    fn with_order_sync<T>(
        &mut self,
        changes: &TaskChanges,
        position: Option<usize>,
        outcome: Outcome<T>,
    ) -> Outcome<T> {
        match self.sync_order(changes, position) {
            Ok(()) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, tasks = ?changes.updated_ids(), "task records saved but order update failed");
                outcome.with_partial(PartialFailure {
                    completed: "task-record".to_string(),
                    failed: "task-order".to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Place updated tasks in their zones and drop deleted ones.
    ///
    /// `position` applies to the first updated task; the others keep their
    /// place if their zone is unchanged and are appended otherwise.
    fn sync_order(&mut self, changes: &TaskChanges, position: Option<usize>) -> Result<()> {
        let board = self.storage.load_board_configuration()?;
        let mut order = self.storage.load_task_order()?;
        let before = order.clone();

        for id in &changes.deleted {
            order.remove(id);
        }
        for (i, task) in changes.updated.iter().enumerate() {
            let position = if i == 0 { position } else { None };
            let zone = board.zone_for(task);
            let in_place = order.locate(&task.id).is_some_and(|(z, _)| z == zone);
            if position.is_some() || !in_place {
                order.insert(&zone, &task.id, position);
            }
        }

        if order != before {
            self.storage.save_task_order(&order)?;
        }
        Ok(())
    }
}

/// The status and, for priority sections, the priority a zone stands for.
fn resolve_zone(board: &BoardConfiguration, zone: &str) -> Option<(TaskStatus, Option<Priority>)> {
    if zone == ARCHIVED_ZONE {
        return Some((TaskStatus::Archived, None));
    }
    for column in &board.columns {
        let status = column.column_type.status();
        if column.name == zone {
            return Some((status, None));
        }
        if let Some(section) = column.section(zone) {
            return Some((status, section.priority()));
        }
    }
    None
}

fn unknown_zone(zone: &str) -> Validation {
    Validation::rejected(Violation::error(
        "unknown-zone",
        Category::Input,
        format!("No column or section named '{}'", zone),
    ))
}

/// Add the effects of a cascade plan to a change set.
fn apply_cascade(plan: &CascadePlan, tasks: &[Task], changes: &mut TaskChanges) {
    for (id, effect) in plan.updates() {
        if let Some(child) = tasks.iter().find(|t| t.id == id) {
            let mut child = child.clone();
            cascade::apply_to_child(&mut child, effect);
            changes.updated.push(child);
        }
    }
    changes
        .deleted
        .extend(plan.deletions().map(str::to_string));
}

fn cascade_message(base: String, plan: &CascadePlan, policy: CascadePolicy) -> String {
    if plan.is_empty() {
        return base;
    }
    format!("{} ({} {} subtask(s))", base, policy, plan.effects.len())
}

/// Sort tasks by drop zone, then manual order, then creation time.
fn sort_for_board(tasks: &mut [Task], board: &BoardConfiguration, order: &TaskOrder) {
    let zones: HashMap<String, usize> = board
        .zone_ids()
        .into_iter()
        .enumerate()
        .map(|(i, z)| (z, i))
        .collect();
    tasks.sort_by_cached_key(|task| {
        let zone = board.zone_for(task);
        let zone_rank = zones.get(&zone).copied().unwrap_or(usize::MAX);
        let position = order
            .zone(&zone)
            .iter()
            .position(|id| id == &task.id)
            .unwrap_or(usize::MAX);
        (zone_rank, position, task.created_at, task.id.clone())
    });
}
