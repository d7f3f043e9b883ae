//! Command implementations for the Bearing CLI.
//!
//! Each command turns parsed arguments into a [`PlanningService`] call and
//! returns a value implementing [`Output`], printed as JSON by default or
//! as text with `-H`.

use crate::config::{self, BearingConfig, ResolvedConfig};
use crate::models::{
    BoardConfiguration, CascadePolicy, DayFocus, KeyResult, LifeTheme, NavigationContext,
    Objective, OkrStatus, Priority, Task, TaskOrder, TaskStatus,
};
use crate::planner::{NewTask, Outcome, PlanningService, TaskChanges};
use crate::storage::{GitStore, HistoryEntry, Storage};
use crate::workflow::priority::Promotion;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Exit code of a change refused by the workflow rules.
pub const EXIT_REJECTED: i32 = 2;
/// Exit code of a change that was only partly persisted.
pub const EXIT_PARTIAL: i32 = 3;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Format for human-readable output.
    fn to_human(&self) -> String;

    /// Serialize to a JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    /// Process exit code for this result.
    fn exit_code(&self) -> i32 {
        0
    }
}

// ==================== Argument parsing ====================

/// Parse a task status argument.
pub fn parse_task_status(s: &str) -> Result<TaskStatus> {
    TaskStatus::parse(s).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Unknown task status '{}' (todo, doing, done, archived)",
            s
        ))
    })
}

/// Parse a priority argument.
pub fn parse_priority(s: &str) -> Result<Priority> {
    Priority::parse(s)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown priority '{}'", s)))
}

/// Parse an objective or key result status argument.
pub fn parse_okr_status(s: &str) -> Result<OkrStatus> {
    OkrStatus::parse(s).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Unknown status '{}' (active, completed, archived)",
            s
        ))
    })
}

/// Parse a cascade policy argument.
pub fn parse_cascade_policy(s: &str) -> Result<CascadePolicy> {
    CascadePolicy::parse(s).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Unknown cascade policy '{}' (none, archive, delete, promote)",
            s
        ))
    })
}

// ==================== Service ====================

fn git_store(config: &ResolvedConfig) -> GitStore {
    GitStore::new(config.data_dir()).with_author(
        config.author_name.value.clone(),
        config.author_email.value.clone(),
    )
}

/// Open the planning service, initializing the data directory on first use.
pub fn open_service(config: &ResolvedConfig) -> Result<PlanningService> {
    let storage = Storage::open_or_init_with_store(Box::new(git_store(config)))?;
    Ok(PlanningService::new(storage).with_cascade_policy(config.cascade_policy()))
}

// ==================== System ====================

/// Result of `system init`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub data_dir: PathBuf,
    pub initialized: bool,
}

impl Output for InitResult {
    fn to_human(&self) -> String {
        if self.initialized {
            format!("Initialized bearing data in {}", self.data_dir.display())
        } else {
            format!("Already initialized: {}", self.data_dir.display())
        }
    }
}

/// Initialize the data directory. Running it twice is harmless.
pub fn system_init(config: &ResolvedConfig) -> Result<InitResult> {
    let data_dir = config.data_dir().to_path_buf();
    if Storage::exists(&data_dir)? {
        return Ok(InitResult {
            data_dir,
            initialized: false,
        });
    }
    Storage::init_with_store(Box::new(git_store(config)))?;
    Ok(InitResult {
        data_dir,
        initialized: true,
    })
}

/// Result of `system status`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub data_dir: PathBuf,
    pub location: String,
    pub cascade_policy: CascadePolicy,
    pub themes: usize,
    pub objectives: usize,
    pub tasks: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change: Option<HistoryEntry>,
}

impl Output for StatusResult {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Data: {} ({})", self.data_dir.display(), self.location),
            format!("Cascade policy: {}", self.cascade_policy),
            format!("{} theme(s), {} objective(s)", self.themes, self.objectives),
        ];
        let counts: Vec<String> = self
            .tasks
            .iter()
            .map(|(status, n)| format!("{} {}", n, status))
            .collect();
        lines.push(format!("Tasks: {}", counts.join(", ")));
        if let Some(entry) = &self.last_change {
            lines.push(format!(
                "Last change: {} ({})",
                entry.message,
                entry.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
        lines.join("\n")
    }
}

/// Summarize the data directory.
pub fn system_status(service: &PlanningService) -> Result<StatusResult> {
    let themes = service.list_themes()?;
    let mut tasks: BTreeMap<String, usize> = TaskStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for task in service.list_tasks(&Default::default())? {
        *tasks.entry(task.status.as_str().to_string()).or_default() += 1;
    }
    Ok(StatusResult {
        data_dir: service.storage().root().to_path_buf(),
        location: service.storage().location(),
        cascade_policy: service.cascade_policy(),
        themes: themes.len(),
        objectives: themes.iter().map(|t| t.walk().count()).sum(),
        tasks,
        last_change: service.history(1)?.into_iter().next(),
    })
}

impl Output for HistoryEntry {
    fn to_human(&self) -> String {
        format!(
            "{} {} {}",
            &self.commit[..self.commit.len().min(8)],
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.message
        )
    }
}

// ==================== Config ====================

impl Output for ResolvedConfig {
    fn to_human(&self) -> String {
        [
            format!("data-dir: {} ({})", self.data_dir.value.display(), self.data_dir.source),
            format!("cascade-policy: {} ({})", self.cascade_policy.value, self.cascade_policy.source),
            format!("output-format: {} ({})", self.output_format.value, self.output_format.source),
            format!("author-name: {} ({})", self.author_name.value, self.author_name.source),
            format!("author-email: {} ({})", self.author_email.value, self.author_email.source),
        ]
        .join("\n")
    }
}

/// Result of `config set`.
#[derive(Serialize)]
pub struct ConfigSetResult {
    pub path: PathBuf,
    pub key: String,
    pub value: String,
}

impl Output for ConfigSetResult {
    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// Set one value in the system or data-root config file.
pub fn config_set(
    resolved: &ResolvedConfig,
    key: &str,
    value: &str,
    system: bool,
) -> Result<ConfigSetResult> {
    if !system && key == "data-dir" {
        return Err(Error::Config(
            "data-dir can only be set in the system config (use --system)".to_string(),
        ));
    }
    let path = if system {
        config::system_config_path()
            .ok_or_else(|| Error::Config("Cannot determine the system config directory".to_string()))?
    } else {
        resolved.data_root_config_path()
    };
    let mut file_config: BearingConfig = config::read_config_file(&path)?;
    file_config.set(key, value).map_err(Error::Config)?;
    config::write_config_file(&path, &file_config)?;
    Ok(ConfigSetResult {
        path,
        key: key.to_string(),
        value: value.to_string(),
    })
}

// ==================== Outcomes ====================

impl<T: Output> Output for Outcome<T> {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.success {
            if let Some(value) = &self.value {
                lines.push(value.to_human());
            }
        } else {
            lines.push("Rejected:".to_string());
        }
        for violation in &self.violations {
            lines.push(format!("  {:?}: {}", violation.severity, violation));
        }
        if let Some(partial) = &self.partial {
            lines.push(format!(
                "Warning: {} was saved but {} failed: {}",
                partial.completed, partial.failed, partial.cause
            ));
        }
        lines.join("\n")
    }

    fn exit_code(&self) -> i32 {
        if !self.success {
            EXIT_REJECTED
        } else if self.partial.is_some() {
            EXIT_PARTIAL
        } else {
            0
        }
    }
}

impl<T: Output> Output for Vec<T> {
    fn to_human(&self) -> String {
        if self.is_empty() {
            return "(none)".to_string();
        }
        self.iter()
            .map(Output::to_human)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for String {
    fn to_human(&self) -> String {
        self.clone()
    }
}

impl Output for NaiveDate {
    fn to_human(&self) -> String {
        self.to_string()
    }
}

// ==================== OKRs ====================

fn objective_lines(objective: &Objective, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    lines.push(format!(
        "{}{} [{}] {}",
        indent, objective.id, objective.status, objective.title
    ));
    for kr in &objective.key_results {
        lines.push(format!("{}  {}", indent, kr.to_human()));
    }
    for child in &objective.objectives {
        objective_lines(child, depth + 1, lines);
    }
}

impl Output for LifeTheme {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} {} ({})", self.id, self.name, self.color)];
        for objective in &self.objectives {
            objective_lines(objective, 1, &mut lines);
        }
        lines.join("\n")
    }
}

impl Output for Objective {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        objective_lines(self, 0, &mut lines);
        lines.join("\n")
    }
}

impl Output for KeyResult {
    fn to_human(&self) -> String {
        match self.progress() {
            Some(pct) => format!(
                "{} [{}] {} ({} / {}, {:.0}%)",
                self.id, self.status, self.description, self.current_value, self.target_value, pct
            ),
            None => format!("{} [{}] {}", self.id, self.status, self.description),
        }
    }
}

// ==================== Calendar ====================

impl Output for DayFocus {
    fn to_human(&self) -> String {
        let mut line = self.date.to_string();
        if let Some(theme) = &self.theme_id {
            line.push_str(&format!(" [{}]", theme));
        }
        if !self.text.is_empty() {
            line.push_str(&format!(" {}", self.text));
        }
        line
    }
}

// ==================== Tasks ====================

impl Output for Task {
    fn to_human(&self) -> String {
        let mut line = format!(
            "{} [{}] {} ({})",
            self.id, self.status, self.title, self.priority
        );
        if let Some(parent) = &self.parent_task_id {
            line.push_str(&format!(" <- {}", parent));
        }
        if let Some(due) = self.due_date {
            line.push_str(&format!(" due {}", due));
        }
        line
    }
}

impl Output for TaskChanges {
    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self.updated.iter().map(Output::to_human).collect();
        lines.extend(self.deleted.iter().map(|id| format!("Deleted {}", id)));
        lines.join("\n")
    }
}

impl Output for TaskOrder {
    fn to_human(&self) -> String {
        self.zones()
            .map(|(zone, ids)| format!("{}: {}", zone, ids.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for Promotion {
    fn to_human(&self) -> String {
        format!("{}: {} -> {}", self.id, self.old_priority, self.new_priority)
    }
}

/// Build a new task from `task create` arguments.
#[allow(clippy::too_many_arguments)]
pub fn new_task(
    theme: String,
    title: String,
    description: Option<String>,
    priority: Option<String>,
    tags: Vec<String>,
    parent: Option<String>,
    day: Option<NaiveDate>,
    due: Option<NaiveDate>,
    promote_on: Option<NaiveDate>,
) -> Result<NewTask> {
    Ok(NewTask {
        theme_id: theme,
        title,
        description: description.unwrap_or_default(),
        tags: tags.into_iter().collect(),
        day_date: day,
        due_date: due,
        promotion_date: promote_on,
        priority: priority.as_deref().map(parse_priority).transpose()?.unwrap_or_default(),
        parent_task_id: parent,
    })
}

/// Field edits of `task update`.
#[derive(Debug, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub parent: Option<String>,
    pub no_parent: bool,
    pub day: Option<NaiveDate>,
    pub due: Option<NaiveDate>,
    pub promote_on: Option<NaiveDate>,
    pub clear_dates: bool,
}

impl TaskEdit {
    /// Apply the edits to a loaded task.
    pub fn apply(self, task: &mut Task) -> Result<()> {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = parse_priority(&priority)?;
        }
        for tag in self.remove_tags {
            task.tags.remove(&tag);
        }
        task.tags.extend(self.add_tags);
        if self.no_parent {
            task.parent_task_id = None;
        } else if let Some(parent) = self.parent {
            task.parent_task_id = Some(parent);
        }
        if self.clear_dates {
            task.day_date = None;
            task.due_date = None;
            task.promotion_date = None;
        }
        if self.day.is_some() {
            task.day_date = self.day;
        }
        if self.due.is_some() {
            task.due_date = self.due;
        }
        if self.promote_on.is_some() {
            task.promotion_date = self.promote_on;
        }
        Ok(())
    }
}

/// Load a task, apply field edits and store it.
pub fn task_update(
    service: &mut PlanningService,
    id: &str,
    edit: TaskEdit,
) -> Result<Outcome<TaskChanges>> {
    let mut task = service.get_task(id)?;
    edit.apply(&mut task)?;
    service.update_task(task)
}

// ==================== Board ====================

/// Board layout with the manual order of every zone.
#[derive(Serialize)]
pub struct BoardView {
    pub board: BoardConfiguration,
    pub order: TaskOrder,
}

impl Output for BoardView {
    fn to_human(&self) -> String {
        let limit = |l: Option<u32>| l.map(|l| format!(" (WIP {})", l)).unwrap_or_default();
        let mut lines = vec![self.board.name.clone()];
        for column in &self.board.columns {
            lines.push(format!("{}{}", column.name, limit(column.wip_limit)));
            for section in &column.sections {
                lines.push(format!("  {}{}", section.name, limit(section.wip_limit)));
            }
        }
        let order = self.order.to_human();
        if !order.is_empty() {
            lines.push(String::new());
            lines.push(order);
        }
        lines.join("\n")
    }
}

impl Output for BoardConfiguration {
    fn to_human(&self) -> String {
        BoardView {
            board: self.clone(),
            order: TaskOrder::new(),
        }
        .to_human()
    }
}

/// Show the board with its ordering.
pub fn board_show(service: &PlanningService) -> Result<BoardView> {
    Ok(BoardView {
        board: service.board_configuration()?,
        order: service.task_order()?,
    })
}

// ==================== Navigation ====================

impl Output for NavigationContext {
    fn to_human(&self) -> String {
        let mut line = format!("View: {}", self.current_view);
        if let Some(item) = &self.current_item {
            line.push_str(&format!(", item {}", item));
        }
        if let Some(theme) = &self.filter_theme_id {
            line.push_str(&format!(", theme {}", theme));
        }
        if let Some(date) = self.filter_date {
            line.push_str(&format!(", date {}", date));
        }
        line
    }
}
