//! Workflow rules.
//!
//! Pure validation over proposed state changes. Nothing in this module
//! reads or writes storage or mutates the records it inspects; callers hand
//! in the current state and get back a [`Validation`] listing every rule
//! the change would break, or plans ([`promotion::Promotion`],
//! [`cascade::CascadePlan`]) describing what should change.
//!
//! - [`transitions`] - task status transitions and WIP limits
//! - [`priority`] - allowed priorities and date-based promotion
//! - [`tasks`] - task field and subtask rules
//! - [`cascade`] - subtask cascade policies
//! - [`okr`] - objective and key result status rules

pub mod cascade;
pub mod okr;
pub mod priority;
pub mod tasks;
pub mod transitions;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule family a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Board transitions and WIP limits
    Workflow,
    /// Priority values
    Priority,
    /// Objective and key result lifecycle
    Okr,
    /// References between entities
    Hierarchy,
    /// Malformed field values
    Input,
}

/// How serious a violation is. Errors reject the change; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Stable rule identifier (e.g., "wip-limit")
    pub rule_id: String,
    /// Human-readable explanation
    pub message: String,
    /// Rule family
    pub category: Category,
    /// Display ordering and acceptance
    pub severity: Severity,
}

impl Violation {
    /// Create an error-severity violation.
    pub fn error(rule_id: &str, category: Category, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            message: message.into(),
            category,
            severity: Severity::Error,
        }
    }

    /// Create a warning-severity violation.
    pub fn warning(rule_id: &str, category: Category, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            message: message.into(),
            category,
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.message)
    }
}

/// Outcome of a validation: the violations found, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    violations: Vec<Violation>,
}

impl Validation {
    /// A validation with no violations.
    pub fn accepted() -> Self {
        Self::default()
    }

    /// A validation with a single violation.
    pub fn rejected(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// Record a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append all violations of another validation.
    pub fn merge(&mut self, other: Validation) {
        self.violations.extend(other.violations);
    }

    /// True when no error-severity violation was found.
    pub fn is_accepted(&self) -> bool {
        !self.violations.iter().any(|v| v.severity == Severity::Error)
    }

    /// Violations ordered by severity, then by emission order.
    pub fn violations(&self) -> Vec<Violation> {
        let mut sorted = self.violations.clone();
        sorted.sort_by_key(|v| v.severity);
        sorted
    }

    /// Consume into ordered violations.
    pub fn into_violations(mut self) -> Vec<Violation> {
        // sort_by_key is stable, so emission order survives within a severity
        self.violations.sort_by_key(|v| v.severity);
        self.violations
    }

    /// Whether there is nothing to report at all.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl From<Vec<Violation>> for Validation {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}
