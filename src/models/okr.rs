//! Life themes, objectives and key results.
//!
//! Themes own a tree of objectives; objectives own nested objectives and
//! key results. Nesting depth is chosen by the user, so every traversal
//! here walks the tree with an explicit stack instead of recursion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by objectives and key results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OkrStatus {
    /// Older files store an empty string for active items
    #[default]
    #[serde(alias = "")]
    Active,
    Completed,
    Archived,
}

impl OkrStatus {
    /// Parse a status, case-insensitive. The empty string means active.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Completed or archived.
    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for OkrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A measurable result under an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResult {
    /// Unique identifier (e.g., "HF.O1.KR2")
    pub id: String,

    /// Owning objective
    pub parent_id: String,

    /// What is measured
    pub description: String,

    /// Current status
    #[serde(default)]
    pub status: OkrStatus,

    /// Value at the start of the period
    #[serde(default)]
    pub start_value: f64,

    /// Latest measured value
    #[serde(default)]
    pub current_value: f64,

    /// Goal value; zero means the result is not tracked numerically
    #[serde(default)]
    pub target_value: f64,
}

impl KeyResult {
    /// Create an untracked, active key result.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            description: description.into(),
            status: OkrStatus::Active,
            start_value: 0.0,
            current_value: 0.0,
            target_value: 0.0,
        }
    }

    /// Progress towards the target in percent, clamped to 0-100.
    ///
    /// Returns `None` for untracked results (target 0).
    pub fn progress(&self) -> Option<f64> {
        if self.target_value == 0.0 {
            return None;
        }
        let span = self.target_value - self.start_value;
        if span == 0.0 {
            return Some(if self.current_value >= self.target_value { 100.0 } else { 0.0 });
        }
        let pct = (self.current_value - self.start_value) / span * 100.0;
        Some(pct.clamp(0.0, 100.0))
    }
}

/// An objective, possibly nested under another objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    /// Unique identifier (e.g., "HF.O1" or "HF.O1.O3")
    pub id: String,

    /// Owning theme or objective
    pub parent_id: String,

    /// Objective title
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: OkrStatus,

    /// Nested objectives
    #[serde(default)]
    pub objectives: Vec<Objective>,

    /// Key results measuring this objective
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
}

impl Objective {
    /// Create an empty, active objective.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            title: title.into(),
            status: OkrStatus::Active,
            objectives: Vec::new(),
            key_results: Vec::new(),
        }
    }

    /// Iterate over every objective strictly below this one.
    pub fn descendants(&self) -> ObjectiveWalk<'_> {
        ObjectiveWalk::new(&self.objectives)
    }
}

/// A life theme: the top of the planning hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeTheme {
    /// Unique identifier (e.g., "HF")
    pub id: String,

    /// Display name
    pub name: String,

    /// Display color (CSS color string)
    #[serde(default)]
    pub color: String,

    /// Top-level objectives
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl LifeTheme {
    /// Create a theme with no objectives.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            objectives: Vec::new(),
        }
    }

    /// Iterate over every objective of the theme, at any depth.
    pub fn walk(&self) -> ObjectiveWalk<'_> {
        ObjectiveWalk::new(&self.objectives)
    }

    /// Find an objective anywhere in the theme.
    pub fn find_objective(&self, id: &str) -> Option<&Objective> {
        self.walk().find(|o| o.id == id)
    }

    /// Find an objective anywhere in the theme, mutably.
    pub fn find_objective_mut(&mut self, id: &str) -> Option<&mut Objective> {
        let mut stack: Vec<&mut Objective> = self.objectives.iter_mut().collect();
        while let Some(obj) = stack.pop() {
            if obj.id == id {
                return Some(obj);
            }
            stack.extend(obj.objectives.iter_mut());
        }
        None
    }

    /// Find a key result anywhere in the theme.
    pub fn find_key_result(&self, id: &str) -> Option<&KeyResult> {
        self.walk()
            .flat_map(|o| o.key_results.iter())
            .find(|kr| kr.id == id)
    }

    /// Find a key result anywhere in the theme, mutably.
    pub fn find_key_result_mut(&mut self, id: &str) -> Option<&mut KeyResult> {
        let mut stack: Vec<&mut Objective> = self.objectives.iter_mut().collect();
        while let Some(obj) = stack.pop() {
            let Objective {
                key_results,
                objectives,
                ..
            } = obj;
            if let Some(kr) = key_results.iter_mut().find(|kr| kr.id == id) {
                return Some(kr);
            }
            stack.extend(objectives.iter_mut());
        }
        None
    }

    /// Detach an objective (with its subtree) from wherever it lives.
    pub fn remove_objective(&mut self, id: &str) -> Option<Objective> {
        if let Some(pos) = self.objectives.iter().position(|o| o.id == id) {
            return Some(self.objectives.remove(pos));
        }
        let mut stack: Vec<&mut Objective> = self.objectives.iter_mut().collect();
        while let Some(obj) = stack.pop() {
            if let Some(pos) = obj.objectives.iter().position(|o| o.id == id) {
                return Some(obj.objectives.remove(pos));
            }
            stack.extend(obj.objectives.iter_mut());
        }
        None
    }

    /// Detach a key result from its objective.
    pub fn remove_key_result(&mut self, id: &str) -> Option<KeyResult> {
        let mut stack: Vec<&mut Objective> = self.objectives.iter_mut().collect();
        while let Some(obj) = stack.pop() {
            if let Some(pos) = obj.key_results.iter().position(|kr| kr.id == id) {
                return Some(obj.key_results.remove(pos));
            }
            stack.extend(obj.objectives.iter_mut());
        }
        None
    }

    /// Every objective and key result id in the theme.
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for obj in self.walk() {
            ids.push(obj.id.as_str());
            ids.extend(obj.key_results.iter().map(|kr| kr.id.as_str()));
        }
        ids
    }
}

/// Depth-first iterator over an objective forest, driven by an explicit stack.
pub struct ObjectiveWalk<'a> {
    stack: Vec<&'a Objective>,
}

impl<'a> ObjectiveWalk<'a> {
    fn new(roots: &'a [Objective]) -> Self {
        // Reversed so that siblings come out in document order
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for ObjectiveWalk<'a> {
    type Item = &'a Objective;

    fn next(&mut self) -> Option<Self::Item> {
        let obj = self.stack.pop()?;
        self.stack.extend(obj.objectives.iter().rev());
        Some(obj)
    }
}

/// Find the theme containing an objective.
pub fn theme_of_objective<'a>(themes: &'a [LifeTheme], objective_id: &str) -> Option<&'a LifeTheme> {
    themes.iter().find(|t| t.find_objective(objective_id).is_some())
}

/// Find the theme containing a key result.
pub fn theme_of_key_result<'a>(themes: &'a [LifeTheme], key_result_id: &str) -> Option<&'a LifeTheme> {
    themes.iter().find(|t| t.find_key_result(key_result_id).is_some())
}
