//! Subtask cascades.
//!
//! When a parent task is finished (done or archived) or deleted, the
//! configured [`CascadePolicy`] decides what happens to its direct
//! children. Cascades set the child status directly; they are system
//! actions and do not go through the transition rules.

use crate::models::{CascadePolicy, Task, TaskStatus};
use serde::Serialize;

/// What happened to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTrigger {
    /// The parent moved to a new status
    StatusChanged(TaskStatus),
    /// The parent was deleted
    Deleted,
}

/// Effect on one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildEffect {
    /// Set status to archived, keep the parent reference
    Archive,
    /// Remove the child record
    Delete,
    /// Clear the parent reference
    Promote,
}

/// Effects to apply to the children of one parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadePlan {
    /// Child id and effect, in input order
    pub effects: Vec<(String, ChildEffect)>,
}

impl CascadePlan {
    /// Whether the plan does nothing.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Ids of children to delete.
    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.effects
            .iter()
            .filter(|(_, e)| *e == ChildEffect::Delete)
            .map(|(id, _)| id.as_str())
    }

    /// Ids of children to modify in place, with the effect.
    pub fn updates(&self) -> impl Iterator<Item = (&str, ChildEffect)> {
        self.effects
            .iter()
            .filter(|(_, e)| *e != ChildEffect::Delete)
            .map(|(id, e)| (id.as_str(), *e))
    }
}

/// Plan the cascade for `parent_id`.
///
/// Only a move to done or archived, or a deletion, triggers a cascade.
/// Children already archived are left alone by the archive policy.
pub fn plan_cascade(
    parent_id: &str,
    trigger: CascadeTrigger,
    policy: CascadePolicy,
    tasks: &[Task],
) -> CascadePlan {
    let triggered = match trigger {
        CascadeTrigger::StatusChanged(status) => {
            matches!(status, TaskStatus::Done | TaskStatus::Archived)
        }
        CascadeTrigger::Deleted => true,
    };
    if !triggered {
        return CascadePlan::default();
    }

    let effect = match policy {
        CascadePolicy::NoAction => return CascadePlan::default(),
        CascadePolicy::Archive => ChildEffect::Archive,
        CascadePolicy::Delete => ChildEffect::Delete,
        CascadePolicy::Promote => ChildEffect::Promote,
    };

    let effects = tasks
        .iter()
        .filter(|t| t.is_child_of(parent_id))
        .filter(|t| !(effect == ChildEffect::Archive && t.status == TaskStatus::Archived))
        .map(|t| (t.id.clone(), effect))
        .collect();
    CascadePlan { effects }
}

/// Apply an in-place effect to a child. Deletion is handled by the caller.
pub fn apply_to_child(task: &mut Task, effect: ChildEffect) {
    match effect {
        ChildEffect::Archive => task.status = TaskStatus::Archived,
        ChildEffect::Promote => task.parent_task_id = None,
        ChildEffect::Delete => return,
    }
    task.touch();
}
