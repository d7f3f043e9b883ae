//! Storage layer for Bearing data.
//!
//! This module reads and writes domain entities as JSON documents inside a
//! data root that is recorded by a [`VersionStore`] (git by default).
//!
//! ## Layout
//!
//! ```text
//! themes/themes.json                  all life themes with their OKR trees
//! calendar/<year>.json                day-focus entries of one year
//! tasks/<theme>/<status>/<id>.json    one file per task
//! tasks/<theme>/counter.json          highest task number ever issued
//! board_config.json                   board columns and sections
//! task_order.json                     manual ordering per drop zone
//! navigation_context.json             UI state, never committed
//! ```
//!
//! Every save or delete opens exactly one transaction, stages exactly the
//! files it touched, and commits with a message naming the operation and
//! the entity id. When it returns an error nothing has been recorded and
//! the working tree has been restored.

pub mod ids;
pub mod vcs;

pub use vcs::{CommitOutcome, GitStore, HistoryEntry, Transaction, VersionStore};

use crate::models::{
    BoardConfiguration, DayFocus, LifeTheme, NavigationContext, Task, TaskOrder, TaskStatus,
};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Themes document.
const THEMES_FILE: &str = "themes/themes.json";
/// Directory of per-year day-focus documents.
const CALENDAR_DIR: &str = "calendar";
/// Directory of task partitions.
const TASKS_DIR: &str = "tasks";
/// Board configuration document.
const BOARD_FILE: &str = "board_config.json";
/// Task ordering document.
const ORDER_FILE: &str = "task_order.json";
/// Per-theme task counter document, inside the theme's task directory.
const TASK_COUNTER_FILE: &str = "counter.json";

/// Highest task number ever issued for a theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskCounter {
    last_issued: u32,
}

/// Where a task was found.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskLocation {
    /// The task record
    pub task: Task,
    /// Theme partition holding the file
    pub theme_id: String,
    /// Status partition holding the file
    pub status: TaskStatus,
    /// Position within the partition (files sorted by id)
    pub index: usize,
}

/// Storage manager for one data root.
pub struct Storage {
    /// Root directory of the data
    pub root: PathBuf,
    /// Version history of the root
    store: Box<dyn VersionStore>,
}

impl Storage {
    /// Open existing storage at the given data root.
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_with_store(Box::new(GitStore::new(root)))
    }

    /// Initialize storage at the given data root.
    pub fn init(root: &Path) -> Result<Self> {
        Self::init_with_store(Box::new(GitStore::new(root)))
    }

    /// Open storage, initializing the data root first if needed.
    pub fn open_or_init(root: &Path) -> Result<Self> {
        Self::open_or_init_with_store(Box::new(GitStore::new(root)))
    }

    /// Check if storage exists at the given data root.
    pub fn exists(root: &Path) -> Result<bool> {
        GitStore::new(root).is_initialized()
    }

    /// Open storage over an already initialized version store.
    pub fn open_with_store(store: Box<dyn VersionStore>) -> Result<Self> {
        if !store.is_initialized()? {
            return Err(Error::NotInitialized);
        }
        Ok(Self {
            root: store.root().to_path_buf(),
            store,
        })
    }

    /// Initialize a version store and open storage over it.
    pub fn init_with_store(store: Box<dyn VersionStore>) -> Result<Self> {
        store.init()?;
        let root = store.root().to_path_buf();
        for dir in ["themes", CALENDAR_DIR, TASKS_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root, store })
    }

    /// Open storage over a version store, initializing it once if needed.
    pub fn open_or_init_with_store(store: Box<dyn VersionStore>) -> Result<Self> {
        if store.is_initialized()? {
            Self::open_with_store(store)
        } else {
            tracing::info!(root = %store.root().display(), "data root not initialized, initializing");
            Self::init_with_store(store)
        }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the storage location description (for display purposes).
    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Most recent history entries, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.store.history(limit)
    }

    // === Document helpers ===

    fn begin(&self) -> Transaction<'_> {
        Transaction::begin(self.store.as_ref())
    }

    /// Read a JSON document; `None` if the file does not exist.
    fn read_json<T: DeserializeOwned>(&self, rel: &Path) -> Result<Option<T>> {
        match fs::read_to_string(self.root.join(rel)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a JSON document via a temp file and rename.
    fn write_json<T: Serialize>(&self, rel: &Path, value: &T) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Write one document and commit it.
    fn commit_document<T: Serialize>(&mut self, rel: &Path, value: &T, message: &str) -> Result<CommitOutcome> {
        let mut tx = self.begin();
        self.write_json(rel, value)?;
        tx.stage([rel])?;
        tx.commit(message)
    }

    // === Theme Operations ===

    /// Load all life themes.
    pub fn load_themes(&self) -> Result<Vec<LifeTheme>> {
        Ok(self.read_json(Path::new(THEMES_FILE))?.unwrap_or_default())
    }

    /// Save a theme, replacing the stored theme with the same id.
    pub fn save_theme(&mut self, theme: &LifeTheme) -> Result<CommitOutcome> {
        let message = format!("Save theme {}", theme.id);
        self.save_theme_with_message(theme, &message)
    }

    /// Save a theme with a caller-chosen commit message.
    pub fn save_theme_with_message(&mut self, theme: &LifeTheme, message: &str) -> Result<CommitOutcome> {
        ids::validate_path_safe(&theme.id)?;
        let mut themes = self.load_themes()?;
        match themes.iter_mut().find(|t| t.id == theme.id) {
            Some(existing) => *existing = theme.clone(),
            None => themes.push(theme.clone()),
        }
        self.commit_document(Path::new(THEMES_FILE), &themes, message)
    }

    /// Delete a theme and its objective tree.
    pub fn delete_theme(&mut self, id: &str) -> Result<CommitOutcome> {
        let mut themes = self.load_themes()?;
        let before = themes.len();
        themes.retain(|t| t.id != id);
        if themes.len() == before {
            return Err(Error::NotFound(format!("Theme not found: {}", id)));
        }
        self.commit_document(Path::new(THEMES_FILE), &themes, &format!("Delete theme {}", id))
    }

    // === Day Focus Operations ===

    fn calendar_path(year: i32) -> PathBuf {
        Path::new(CALENDAR_DIR).join(format!("{}.json", year))
    }

    /// Load all day-focus entries of a year, ordered by date.
    pub fn load_year_focus(&self, year: i32) -> Result<Vec<DayFocus>> {
        let mut entries: Vec<DayFocus> = self
            .read_json(&Self::calendar_path(year))?
            .unwrap_or_default();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    /// Save the focus of one day, replacing any previous entry for that date.
    pub fn save_day_focus(&mut self, entry: &DayFocus) -> Result<CommitOutcome> {
        let year = entry.date.year();
        let mut entries = self.load_year_focus(year)?;
        match entries.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        entries.sort_by_key(|e| e.date);
        self.commit_document(
            &Self::calendar_path(year),
            &entries,
            &format!("Save day focus {}", entry.date),
        )
    }

    /// Remove the focus entry of one day.
    pub fn clear_day_focus(&mut self, date: NaiveDate) -> Result<CommitOutcome> {
        let year = date.year();
        let mut entries = self.load_year_focus(year)?;
        let before = entries.len();
        entries.retain(|e| e.date != date);
        if entries.len() == before {
            return Err(Error::NotFound(format!("No day focus for {}", date)));
        }
        self.commit_document(
            &Self::calendar_path(year),
            &entries,
            &format!("Clear day focus {}", date),
        )
    }

    // === Task Operations ===

    fn task_path(theme_id: &str, status: TaskStatus, id: &str) -> PathBuf {
        Path::new(TASKS_DIR)
            .join(theme_id)
            .join(status.as_str())
            .join(format!("{}.json", id))
    }

    fn counter_path(theme_id: &str) -> PathBuf {
        Path::new(TASKS_DIR).join(theme_id).join(TASK_COUNTER_FILE)
    }

    fn load_task_counter(&self, theme_id: &str) -> Result<TaskCounter> {
        Ok(self
            .read_json(&Self::counter_path(theme_id))?
            .unwrap_or_default())
    }

    /// Theme partitions present on disk, sorted.
    fn task_themes(&self) -> Result<Vec<String>> {
        let dir = self.root.join(TASKS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut themes = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                themes.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        themes.sort();
        Ok(themes)
    }

    /// Task ids stored in one partition, sorted.
    fn partition_ids(&self, theme_id: &str, status: TaskStatus) -> Result<Vec<String>> {
        let dir = self.root.join(TASKS_DIR).join(theme_id).join(status.as_str());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_task(&self, theme_id: &str, status: TaskStatus, id: &str) -> Result<Task> {
        self.read_json(&Self::task_path(theme_id, status, id))?
            .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
    }

    /// Load every task with the given status, across all themes.
    pub fn load_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for theme_id in self.task_themes()? {
            for id in self.partition_ids(&theme_id, status)? {
                tasks.push(self.read_task(&theme_id, status, &id)?);
            }
        }
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Load every task of every status.
    pub fn load_all_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for status in TaskStatus::ALL {
            tasks.extend(self.load_tasks_by_status(status)?);
        }
        Ok(tasks)
    }

    /// Find a task by walking every theme and status partition.
    pub fn find_task_by_id(&self, id: &str) -> Result<TaskLocation> {
        for theme_id in self.task_themes()? {
            for status in TaskStatus::ALL {
                let ids = self.partition_ids(&theme_id, status)?;
                if let Some(index) = ids.iter().position(|candidate| candidate == id) {
                    let task = self.read_task(&theme_id, status, id)?;
                    return Ok(TaskLocation {
                        task,
                        theme_id,
                        status,
                        index,
                    });
                }
            }
        }
        Err(Error::NotFound(format!("Task not found: {}", id)))
    }

    /// Save one task.
    pub fn save_task(&mut self, task: &Task) -> Result<CommitOutcome> {
        let verb = match self.find_task_by_id(&task.id) {
            Ok(_) => "Update",
            Err(Error::NotFound(_)) => "Create",
            Err(e) => return Err(e),
        };
        let message = format!("{} task {}", verb, task.id);
        self.apply_task_changes(std::slice::from_ref(task), &[], &message)
    }

    /// Save several tasks in one commit.
    pub fn save_tasks(&mut self, tasks: &[Task], message: &str) -> Result<CommitOutcome> {
        self.apply_task_changes(tasks, &[], message)
    }

    /// Delete one task.
    pub fn delete_task(&mut self, id: &str) -> Result<CommitOutcome> {
        let message = format!("Delete task {}", id);
        self.apply_task_changes(&[], &[id.to_string()], &message)
    }

    /// Write and delete task files as a single commit.
    ///
    /// A saved task whose status or theme changed has its old file removed
    /// in the same commit. Deleting an unknown id fails with `NotFound`
    /// before anything is written.
    pub fn apply_task_changes(
        &mut self,
        save: &[Task],
        delete: &[String],
        message: &str,
    ) -> Result<CommitOutcome> {
        // Highest task number touched per theme, deleted ones included
        let mut highest: BTreeMap<String, u32> = BTreeMap::new();
        let mut raise = |theme_id: &str, id: &str| {
            if let Some(n) = ids::task_number(id) {
                let entry = highest.entry(theme_id.to_string()).or_default();
                *entry = (*entry).max(n);
            }
        };

        let mut removals: Vec<PathBuf> = Vec::new();
        for id in delete {
            let loc = self.find_task_by_id(id)?;
            let path = Self::task_path(&loc.theme_id, loc.status, id);
            if !removals.contains(&path) {
                removals.push(path);
            }
            raise(&loc.theme_id, id);
        }

        let mut writes = Vec::new();
        for task in save {
            ids::validate_path_safe(&task.id)?;
            ids::validate_path_safe(&task.theme_id)?;
            let target = Self::task_path(&task.theme_id, task.status, &task.id);
            match self.find_task_by_id(&task.id) {
                Ok(loc) => {
                    let current = Self::task_path(&loc.theme_id, loc.status, &task.id);
                    if current != target && !removals.contains(&current) {
                        removals.push(current);
                    }
                }
                Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            raise(&task.theme_id, &task.id);
            writes.push((target, task));
        }
        removals.retain(|path| !writes.iter().any(|(target, _)| target == path));

        let mut counters = Vec::new();
        for (theme_id, n) in highest {
            let counter = self.load_task_counter(&theme_id)?;
            if n > counter.last_issued {
                counters.push((Self::counter_path(&theme_id), TaskCounter { last_issued: n }));
            }
        }

        let mut tx = self.begin();
        for rel in &removals {
            tx.stage_removal([rel]);
            fs::remove_file(self.root.join(rel))?;
        }
        for (rel, task) in &writes {
            self.write_json(rel, task)?;
            tx.stage([rel])?;
        }
        for (rel, counter) in &counters {
            self.write_json(rel, counter)?;
            tx.stage([rel])?;
        }
        tx.commit(message)
    }

    /// Next free task id for a theme.
    ///
    /// Scans every partition and never goes below the theme's counter, so
    /// the number of a deleted task is not issued again.
    pub fn next_task_id(&self, theme_id: &str) -> Result<String> {
        let mut existing = Vec::new();
        for status in TaskStatus::ALL {
            existing.extend(self.partition_ids(theme_id, status)?);
        }
        let counter = self.load_task_counter(theme_id)?;
        Ok(ids::task_id(
            theme_id,
            existing.iter().map(String::as_str),
            counter.last_issued,
        ))
    }

    /// Delete several tasks in one commit.
    pub fn delete_tasks(&mut self, ids: &[String], message: &str) -> Result<CommitOutcome> {
        self.apply_task_changes(&[], ids, message)
    }

    /// Next free theme id for a theme name.
    pub fn next_theme_id(&self, name: &str) -> Result<String> {
        let themes = self.load_themes()?;
        let existing: Vec<&str> = themes.iter().map(|t| t.id.as_str()).collect();
        Ok(ids::theme_id(name, &existing))
    }

    /// Next free objective id under a theme or objective.
    pub fn next_objective_id(&self, parent_id: &str) -> Result<String> {
        let themes = self.load_themes()?;
        let theme = Self::owning_theme(&themes, parent_id)?;
        Ok(ids::objective_id(parent_id, theme.all_ids()))
    }

    /// Next free key result id under an objective.
    pub fn next_key_result_id(&self, objective_id: &str) -> Result<String> {
        let themes = self.load_themes()?;
        let theme = Self::owning_theme(&themes, objective_id)?;
        Ok(ids::key_result_id(objective_id, theme.all_ids()))
    }

    fn owning_theme<'a>(themes: &'a [LifeTheme], id: &str) -> Result<&'a LifeTheme> {
        let theme_id = ids::theme_of(id);
        themes
            .iter()
            .find(|t| t.id == theme_id)
            .ok_or_else(|| Error::NotFound(format!("Theme not found: {}", theme_id)))
    }

    // === Board Operations ===

    /// Load the board configuration, or the default board if none is stored.
    pub fn load_board_configuration(&self) -> Result<BoardConfiguration> {
        Ok(self.read_json(Path::new(BOARD_FILE))?.unwrap_or_default())
    }

    /// Save the board configuration.
    pub fn save_board_configuration(&mut self, config: &BoardConfiguration) -> Result<CommitOutcome> {
        config.validate()?;
        self.commit_document(Path::new(BOARD_FILE), config, "Save board configuration")
    }

    /// Load the manual task order.
    pub fn load_task_order(&self) -> Result<TaskOrder> {
        Ok(self.read_json(Path::new(ORDER_FILE))?.unwrap_or_default())
    }

    /// Save the manual task order.
    pub fn save_task_order(&mut self, order: &TaskOrder) -> Result<CommitOutcome> {
        self.commit_document(Path::new(ORDER_FILE), order, "Save task order")
    }

    // === Navigation Context ===

    /// Load the navigation context, or the default one.
    pub fn load_navigation_context(&self) -> Result<NavigationContext> {
        Ok(self
            .read_json(Path::new(vcs::NAVIGATION_FILE))?
            .unwrap_or_default())
    }

    /// Save the navigation context. Written to disk only, never committed.
    pub fn save_navigation_context(&self, context: &NavigationContext) -> Result<()> {
        self.write_json(Path::new(vcs::NAVIGATION_FILE), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeyResult, Objective, Priority};
    use crate::test_utils::TestEnv;

    fn create_test_storage() -> (TestEnv, Storage) {
        let env = TestEnv::new();
        let storage = env.init_storage();
        (env, storage)
    }

    #[test]
    fn test_storage_init() {
        let (env, storage) = create_test_storage();
        assert!(Storage::exists(env.path()).unwrap());
        assert!(storage.root.join("tasks").is_dir());
        assert!(storage.root.join("calendar").is_dir());
    }

    #[test]
    fn test_open_uninitialized_fails() {
        let env = TestEnv::new();
        assert!(matches!(Storage::open(env.path()), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_open_or_init_initializes_once() {
        let env = TestEnv::new();
        Storage::open_or_init(env.path()).unwrap();
        let storage = Storage::open_or_init(env.path()).unwrap();
        assert_eq!(storage.history(10).unwrap().len(), 1);
    }

    #[test]
    fn test_theme_roundtrip() {
        let (_env, mut storage) = create_test_storage();
        let mut theme = LifeTheme::new("HF", "Health & Fitness", "#22c55e");
        let mut objective = Objective::new("HF.O1", "HF", "Run");
        let mut kr = KeyResult::new("HF.O1.KR1", "HF.O1", "km per week");
        kr.target_value = 30.0;
        objective.key_results.push(kr);
        theme.objectives.push(objective);

        storage.save_theme(&theme).unwrap();
        let loaded = storage.load_themes().unwrap();
        assert_eq!(loaded, vec![theme]);
        assert_eq!(storage.history(1).unwrap()[0].message, "Save theme HF");
    }

    #[test]
    fn test_save_theme_replaces_existing() {
        let (_env, mut storage) = create_test_storage();
        storage.save_theme(&LifeTheme::new("HF", "Health", "")).unwrap();
        storage.save_theme(&LifeTheme::new("HF", "Health & Fitness", "")).unwrap();
        let themes = storage.load_themes().unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Health & Fitness");
    }

    #[test]
    fn test_delete_missing_theme() {
        let (_env, mut storage) = create_test_storage();
        assert!(storage.delete_theme("XX").unwrap_err().is_not_found());
    }

    #[test]
    fn test_day_focus_upsert_and_clear() {
        let (_env, mut storage) = create_test_storage();
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let mut entry = DayFocus::new(date);
        entry.text = "Deep work".to_string();
        storage.save_day_focus(&entry).unwrap();
        entry.theme_id = Some("HF".to_string());
        storage.save_day_focus(&entry).unwrap();

        let year = storage.load_year_focus(2026).unwrap();
        assert_eq!(year, vec![entry]);
        assert!(storage.load_year_focus(2025).unwrap().is_empty());

        storage.clear_day_focus(date).unwrap();
        assert!(storage.load_year_focus(2026).unwrap().is_empty());
        assert!(storage.clear_day_focus(date).unwrap_err().is_not_found());
    }

    #[test]
    fn test_task_roundtrip_and_find() {
        let (_env, mut storage) = create_test_storage();
        let mut task = Task::new("HF-T1", "HF", "Run 5k");
        task.priority = Priority::ImportantUrgent;
        task.tags.insert("outdoor".to_string());
        storage.save_task(&task).unwrap();

        let loc = storage.find_task_by_id("HF-T1").unwrap();
        assert_eq!(loc.task, task);
        assert_eq!(loc.theme_id, "HF");
        assert_eq!(loc.status, TaskStatus::Todo);
        assert_eq!(loc.index, 0);
        assert_eq!(storage.history(1).unwrap()[0].message, "Create task HF-T1");
    }

    #[test]
    fn test_find_missing_task() {
        let (_env, storage) = create_test_storage();
        assert!(storage.find_task_by_id("HF-T9").unwrap_err().is_not_found());
    }

    #[test]
    fn test_status_change_moves_file() {
        let (_env, mut storage) = create_test_storage();
        let mut task = Task::new("HF-T1", "HF", "Run");
        storage.save_task(&task).unwrap();
        task.status = TaskStatus::Doing;
        storage.save_task(&task).unwrap();

        assert!(storage.load_tasks_by_status(TaskStatus::Todo).unwrap().is_empty());
        assert_eq!(storage.load_tasks_by_status(TaskStatus::Doing).unwrap().len(), 1);
        assert!(!storage.root.join("tasks/HF/todo/HF-T1.json").exists());
        assert_eq!(storage.history(1).unwrap()[0].message, "Update task HF-T1");
    }

    #[test]
    fn test_delete_task() {
        let (_env, mut storage) = create_test_storage();
        storage.save_task(&Task::new("HF-T1", "HF", "Run")).unwrap();
        storage.delete_task("HF-T1").unwrap();
        assert!(storage.find_task_by_id("HF-T1").is_err());
        assert!(storage.delete_task("HF-T1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_next_task_id_counts_archived() {
        let (_env, mut storage) = create_test_storage();
        let mut archived = Task::new("HF-T7", "HF", "Old");
        archived.status = TaskStatus::Archived;
        storage.save_task(&archived).unwrap();
        storage.save_task(&Task::new("HF-T2", "HF", "New")).unwrap();

        assert_eq!(storage.next_task_id("HF").unwrap(), "HF-T8");
        assert_eq!(storage.next_task_id("C").unwrap(), "C-T1");
    }

    #[test]
    fn test_deleted_task_number_is_not_reissued() {
        let (_env, mut storage) = create_test_storage();
        storage.save_task(&Task::new("HF-T1", "HF", "a")).unwrap();
        let before = storage.history(100).unwrap().len();
        storage.save_task(&Task::new("HF-T2", "HF", "b")).unwrap();

        // The counter rides along in the task's own commit
        assert_eq!(storage.history(100).unwrap().len(), before + 1);
        assert!(storage.root.join("tasks/HF/counter.json").exists());

        storage.delete_task("HF-T2").unwrap();
        assert_eq!(storage.next_task_id("HF").unwrap(), "HF-T3");
        storage.delete_task("HF-T1").unwrap();
        assert_eq!(storage.next_task_id("HF").unwrap(), "HF-T3");
        assert!(storage.load_all_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_delete_raises_missing_counter() {
        let (_env, mut storage) = create_test_storage();
        storage.save_task(&Task::new("HF-T1", "HF", "a")).unwrap();
        storage.save_task(&Task::new("HF-T2", "HF", "b")).unwrap();
        fs::remove_file(storage.root.join("tasks/HF/counter.json")).unwrap();

        storage.delete_task("HF-T2").unwrap();
        assert_eq!(storage.next_task_id("HF").unwrap(), "HF-T3");
    }

    #[test]
    fn test_duplicate_removals_are_merged() {
        let (_env, mut storage) = create_test_storage();
        let mut task = Task::new("HF-T1", "HF", "a");
        storage.save_task(&task).unwrap();
        storage.save_task(&Task::new("HF-T2", "HF", "b")).unwrap();

        storage
            .delete_tasks(&["HF-T2".to_string(), "HF-T2".to_string()], "Drop twice")
            .unwrap();
        assert!(storage.find_task_by_id("HF-T2").unwrap_err().is_not_found());

        task.status = TaskStatus::Doing;
        storage
            .apply_task_changes(&[task.clone()], &["HF-T1".to_string()], "Move and drop")
            .unwrap();
        assert_eq!(storage.find_task_by_id("HF-T1").unwrap().status, TaskStatus::Doing);
        assert!(!storage.root.join("tasks/HF/todo/HF-T1.json").exists());
    }

    #[test]
    fn test_batch_changes_are_one_commit() {
        let (_env, mut storage) = create_test_storage();
        storage.save_task(&Task::new("HF-T1", "HF", "a")).unwrap();
        let before = storage.history(100).unwrap().len();

        storage
            .apply_task_changes(
                &[Task::new("HF-T2", "HF", "b"), Task::new("HF-T3", "HF", "c")],
                &["HF-T1".to_string()],
                "Batch",
            )
            .unwrap();

        assert_eq!(storage.history(100).unwrap().len(), before + 1);
        assert_eq!(storage.load_all_tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_next_okr_ids() {
        let (_env, mut storage) = create_test_storage();
        let mut theme = LifeTheme::new("HF", "Health & Fitness", "");
        let mut objective = Objective::new("HF.O1", "HF", "Run");
        objective.key_results.push(KeyResult::new("HF.O1.KR1", "HF.O1", "km"));
        theme.objectives.push(objective);
        storage.save_theme(&theme).unwrap();

        assert_eq!(storage.next_theme_id("Hobby Fun").unwrap(), "HF2");
        assert_eq!(storage.next_objective_id("HF").unwrap(), "HF.O2");
        assert_eq!(storage.next_objective_id("HF.O1").unwrap(), "HF.O1.O1");
        assert_eq!(storage.next_key_result_id("HF.O1").unwrap(), "HF.O1.KR2");
        assert!(storage.next_objective_id("XX").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_tasks_in_one_commit() {
        let (_env, mut storage) = create_test_storage();
        storage
            .save_tasks(&[Task::new("HF-T1", "HF", "a"), Task::new("HF-T2", "HF", "b")], "Seed")
            .unwrap();
        let before = storage.history(100).unwrap().len();
        storage
            .delete_tasks(&["HF-T1".to_string(), "HF-T2".to_string()], "Drop both")
            .unwrap();
        assert!(storage.load_all_tasks().unwrap().is_empty());
        assert_eq!(storage.history(100).unwrap().len(), before + 1);
    }

    #[test]
    fn test_board_configuration_default_and_save() {
        let (_env, mut storage) = create_test_storage();
        let mut board = storage.load_board_configuration().unwrap();
        assert_eq!(board, BoardConfiguration::default());

        board.columns[1].wip_limit = Some(3);
        storage.save_board_configuration(&board).unwrap();
        assert_eq!(storage.load_board_configuration().unwrap(), board);
    }

    #[test]
    fn test_task_order_roundtrip() {
        let (_env, mut storage) = create_test_storage();
        let mut order = TaskOrder::new();
        order.set_zone("doing", vec!["HF-T1".to_string(), "HF-T2".to_string()]);
        storage.save_task_order(&order).unwrap();
        assert_eq!(storage.load_task_order().unwrap(), order);
    }

    #[test]
    fn test_navigation_context_is_not_versioned() {
        let (_env, storage) = create_test_storage();
        let before = storage.history(100).unwrap().len();
        let ctx = NavigationContext {
            current_view: "okr".to_string(),
            current_item: Some("HF.O1".to_string()),
            ..Default::default()
        };
        storage.save_navigation_context(&ctx).unwrap();

        assert_eq!(storage.load_navigation_context().unwrap(), ctx);
        assert_eq!(storage.history(100).unwrap().len(), before);
    }
}
