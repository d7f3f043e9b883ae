//! Task status transitions and WIP limits.

use super::{Category, Validation, Violation};
use crate::models::{BoardConfiguration, Priority, Task, TaskStatus};

/// Whether a task may go directly from `from` to `to`.
///
/// Staying in the same status is always allowed.
pub fn is_legal_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    from == to
        || matches!(
            (from, to),
            (Todo, Doing)
                | (Doing, Todo)
                | (Doing, Done)
                | (Done, Doing)
                | (Todo, Archived)
                | (Archived, Todo)
        )
}

/// Validate a status transition.
pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Validation {
    if is_legal_transition(from, to) {
        return Validation::accepted();
    }
    Validation::rejected(Violation::error(
        "invalid-transition",
        Category::Workflow,
        format!("Cannot move a task from '{}' to '{}'", from, to),
    ))
}

/// Validate WIP limits for a task entering `to_status` with `to_priority`.
///
/// `tasks` is the current board; the moving task itself is never counted.
/// Column limits are checked only when the status changes, section limits
/// when the task lands in a different section.
pub fn validate_wip_limits(
    board: &BoardConfiguration,
    tasks: &[Task],
    task: &Task,
    to_status: TaskStatus,
    to_priority: Priority,
) -> Validation {
    let enters_column = task.status != to_status;
    let enters_section = enters_column || task.priority != to_priority;
    check_limits(
        board,
        tasks,
        Some(task.id.as_str()),
        to_status,
        to_priority,
        enters_column,
        enters_section,
    )
}

/// Validate WIP limits for a task that does not exist yet.
pub fn validate_capacity(
    board: &BoardConfiguration,
    tasks: &[Task],
    status: TaskStatus,
    priority: Priority,
) -> Validation {
    check_limits(board, tasks, None, status, priority, true, true)
}

fn check_limits(
    board: &BoardConfiguration,
    tasks: &[Task],
    moving_id: Option<&str>,
    to_status: TaskStatus,
    to_priority: Priority,
    check_column: bool,
    check_section: bool,
) -> Validation {
    let mut validation = Validation::accepted();
    let Some(column) = board.column_for_status(to_status) else {
        return validation;
    };
    let others = || {
        tasks
            .iter()
            .filter(|t| Some(t.id.as_str()) != moving_id && t.status == to_status)
    };

    if check_column {
        if let Some(limit) = column.wip_limit {
            let count = others().count();
            if count >= limit as usize {
                validation.push(Violation::error(
                    "wip-limit",
                    Category::Workflow,
                    format!(
                        "Column '{}' has reached its WIP limit of {} ({} tasks)",
                        column.name, limit, count
                    ),
                ));
            }
        }
    }

    if check_section {
        if let Some(section) = column.section_for(to_priority) {
            if let Some(limit) = section.wip_limit {
                let count = others().filter(|t| t.priority == to_priority).count();
                if count >= limit as usize {
                    validation.push(Violation::error(
                        "wip-limit",
                        Category::Workflow,
                        format!(
                            "Section '{}' of column '{}' has reached its WIP limit of {} ({} tasks)",
                            section.name, column.name, limit, count
                        ),
                    ));
                }
            }
        }
    }

    validation
}

/// Validate moving a task to a new status and priority: transition
/// legality first, then WIP limits.
pub fn validate_move(
    board: &BoardConfiguration,
    tasks: &[Task],
    task: &Task,
    to_status: TaskStatus,
    to_priority: Priority,
) -> Validation {
    let mut validation = validate_transition(task.status, to_status);
    validation.merge(validate_wip_limits(board, tasks, task, to_status, to_priority));
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Severity;

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(id, "HF", id);
        t.status = status;
        t
    }

    fn board_with_doing_limit(limit: u32) -> BoardConfiguration {
        let mut board = BoardConfiguration::default();
        board.columns[1].wip_limit = Some(limit);
        board
    }

    #[test]
    fn test_legal_transitions() {
        use TaskStatus::*;
        for (from, to) in [
            (Todo, Doing),
            (Doing, Todo),
            (Doing, Done),
            (Done, Doing),
            (Todo, Archived),
            (Archived, Todo),
            (Done, Done),
        ] {
            assert!(is_legal_transition(from, to), "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        use TaskStatus::*;
        for (from, to) in [
            (Todo, Done),
            (Done, Todo),
            (Done, Archived),
            (Doing, Archived),
            (Archived, Doing),
            (Archived, Done),
        ] {
            assert!(!is_legal_transition(from, to), "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_todo_to_done_rejected_even_with_free_capacity() {
        let board = BoardConfiguration::default();
        let t = task("HF-T1", TaskStatus::Todo);
        let v = validate_move(&board, &[t.clone()], &t, TaskStatus::Done, t.priority);
        assert!(!v.is_accepted());
        assert_eq!(v.violations()[0].rule_id, "invalid-transition");
    }

    #[test]
    fn test_wip_limit_reached() {
        let board = board_with_doing_limit(2);
        let tasks = vec![
            task("HF-T1", TaskStatus::Doing),
            task("HF-T2", TaskStatus::Doing),
            task("HF-T3", TaskStatus::Todo),
        ];
        let v = validate_move(&board, &tasks, &tasks[2], TaskStatus::Doing, tasks[2].priority);

        let violations = v.into_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].category, Category::Workflow);
        assert_eq!(violations[0].severity, Severity::Error);
        assert!(violations[0].message.contains("doing"));
        assert!(violations[0].message.contains('2'));
    }

    #[test]
    fn test_wip_limit_below_capacity() {
        let board = board_with_doing_limit(2);
        let tasks = vec![task("HF-T1", TaskStatus::Doing), task("HF-T3", TaskStatus::Todo)];
        let v = validate_move(&board, &tasks, &tasks[1], TaskStatus::Doing, tasks[1].priority);
        assert!(v.is_accepted());
    }

    #[test]
    fn test_wip_limit_excludes_moving_task() {
        // Reordering inside a full column is not a transition into it
        let board = board_with_doing_limit(1);
        let tasks = vec![task("HF-T1", TaskStatus::Doing)];
        let v = validate_move(&board, &tasks, &tasks[0], TaskStatus::Doing, tasks[0].priority);
        assert!(v.is_accepted());
    }

    #[test]
    fn test_section_wip_limit() {
        let mut board = BoardConfiguration::default();
        board.columns[0].sections[0].wip_limit = Some(1);
        let mut urgent = task("HF-T1", TaskStatus::Todo);
        urgent.priority = Priority::ImportantUrgent;
        let other = task("HF-T2", TaskStatus::Todo);
        let tasks = vec![urgent, other.clone()];

        let v = validate_move(&board, &tasks, &other, TaskStatus::Todo, Priority::ImportantUrgent);
        assert!(!v.is_accepted());
        assert!(v.violations()[0].message.contains("important-urgent"));

        let v = validate_move(&board, &tasks, &other, TaskStatus::Todo, Priority::NotImportantUrgent);
        assert!(v.is_accepted());
    }

    #[test]
    fn test_capacity_for_new_task() {
        let mut board = BoardConfiguration::default();
        board.columns[0].wip_limit = Some(1);
        let tasks = vec![task("HF-T1", TaskStatus::Todo)];
        let v = validate_capacity(&board, &tasks, TaskStatus::Todo, Priority::ImportantNotUrgent);
        assert_eq!(v.violations()[0].rule_id, "wip-limit");
        assert!(validate_capacity(&board, &[], TaskStatus::Todo, Priority::ImportantNotUrgent).is_accepted());
    }

    #[test]
    fn test_archived_has_no_limit() {
        let board = board_with_doing_limit(0);
        let t = task("HF-T1", TaskStatus::Todo);
        let v = validate_move(&board, &[t.clone()], &t, TaskStatus::Archived, t.priority);
        assert!(v.is_accepted());
    }
}
