//! Versioned store: a data directory recorded as git history.
//!
//! Every mutation of domain data goes through a [`Transaction`]: files are
//! written to the working tree first, then staged and recorded as a single
//! commit. If staging or committing fails, or the transaction is rolled
//! back or dropped unfinished, every staged path is restored from `HEAD`:
//! tracked files are rewritten from their committed blobs and new files
//! are removed, even when the index itself cannot be touched. The
//! working tree therefore never keeps uncommitted domain data once an
//! operation has returned.
//!
//! ## Layout
//!
//! `init` creates the data root, a `.git` repository inside it, a
//! `.gitignore` that keeps the navigation context and local config out of
//! history, and an initial commit so `HEAD` always exists.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// File excluded from history: UI navigation state.
pub const NAVIGATION_FILE: &str = "navigation_context.json";
/// File excluded from history: local preferences.
pub const LOCAL_CONFIG_FILE: &str = "config.kdl";

/// Author recorded on commits when none is configured.
pub const DEFAULT_AUTHOR_NAME: &str = "Bearing";
/// Author email recorded on commits when none is configured.
pub const DEFAULT_AUTHOR_EMAIL: &str = "bearing@localhost";

/// Result of committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "commit")]
pub enum CommitOutcome {
    /// A new history entry was recorded
    Committed(String),
    /// The staged paths matched `HEAD`; nothing was recorded
    Unchanged,
}

impl CommitOutcome {
    /// The new commit hash, if one was recorded.
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            Self::Committed(id) => Some(id),
            Self::Unchanged => None,
        }
    }
}

/// One entry of the version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Full commit hash
    pub commit: String,
    /// Commit message subject
    pub message: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
}

/// Trait for stores that record a directory as a sequence of commits.
///
/// All paths are relative to [`VersionStore::root`].
pub trait VersionStore: Send + Sync {
    /// Root of the working tree.
    fn root(&self) -> &Path;

    /// Whether the root already holds a repository.
    fn is_initialized(&self) -> Result<bool>;

    /// Create the root, its repository and the initial commit.
    fn init(&self) -> Result<()>;

    /// Stage paths: existing files are added, missing files are staged as removed.
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Record everything staged as one commit.
    fn commit(&self, message: &str) -> Result<CommitOutcome>;

    /// Unstage paths and restore them to their `HEAD` state.
    ///
    /// Every path is attempted even if an earlier step fails; the first
    /// error is returned.
    fn discard(&self, paths: &[PathBuf]) -> Result<()>;

    /// Most recent history entries, newest first.
    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;
}

/// A group of file changes recorded as one commit.
///
/// Dropping a transaction without committing rolls it back.
pub struct Transaction<'a> {
    store: &'a dyn VersionStore,
    written: Vec<PathBuf>,
    removed: Vec<PathBuf>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction on a store.
    pub fn begin(store: &'a dyn VersionStore) -> Self {
        Self {
            store,
            written: Vec::new(),
            removed: Vec::new(),
            finished: false,
        }
    }

    /// Stage files that have been written to disk.
    ///
    /// Fails with [`Error::MissingPath`] if any of them does not exist.
    pub fn stage<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref().to_path_buf();
            if !self.store.root().join(&path).exists() {
                return Err(Error::MissingPath(path.display().to_string()));
            }
            if !self.written.contains(&path) {
                self.written.push(path);
            }
        }
        Ok(())
    }

    /// Stage files that have been deleted from disk.
    pub fn stage_removal<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref().to_path_buf();
            if !self.removed.contains(&path) {
                self.removed.push(path);
            }
        }
    }

    /// Every path touched by this transaction.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.written
            .iter()
            .chain(self.removed.iter())
            .cloned()
            .collect()
    }

    /// Record all staged paths as one commit.
    ///
    /// On failure the working tree is restored for every staged path and
    /// nothing is recorded.
    pub fn commit(mut self, message: &str) -> Result<CommitOutcome> {
        self.finished = true;
        let paths = self.paths();
        if paths.is_empty() {
            return Ok(CommitOutcome::Unchanged);
        }

        match self.apply(&paths, message) {
            Ok(outcome) => {
                if let CommitOutcome::Committed(ref id) = outcome {
                    tracing::info!(commit = %id, %message, "recorded commit");
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, %message, "commit failed, restoring working tree");
                if let Err(restore) = self.store.discard(&paths) {
                    tracing::warn!(error = %restore, "failed to restore working tree");
                }
                Err(e)
            }
        }
    }

    /// Abandon the transaction and restore every staged path.
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        let paths = self.paths();
        if paths.is_empty() {
            return Ok(());
        }
        self.store.discard(&paths)
    }

    fn apply(&self, paths: &[PathBuf], message: &str) -> Result<CommitOutcome> {
        // Files may have vanished between stage() and commit()
        for path in &self.written {
            if !self.store.root().join(path).exists() {
                return Err(Error::MissingPath(path.display().to_string()));
            }
        }
        self.store.stage(paths)?;
        self.store.commit(message)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let paths = self.paths();
        if paths.is_empty() {
            return;
        }
        tracing::warn!(paths = paths.len(), "transaction dropped without commit, rolling back");
        if let Err(e) = self.store.discard(&paths) {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}

/// Version store backed by a git repository at the data root.
pub struct GitStore {
    /// Root of the working tree
    root: PathBuf,
    /// Commit author name
    author_name: String,
    /// Commit author email
    author_email: String,
}

impl GitStore {
    /// Create a git store for the given data root.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }

    /// Set the author recorded on commits.
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    /// Run git in the data root and return its raw output.
    fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(?args, root = %self.root.display(), "git");
        Command::new("git")
            .arg("-c")
            .arg(format!("user.name={}", self.author_name))
            .arg("-c")
            .arg(format!("user.email={}", self.author_email))
            .args(["-c", "commit.gpgsign=false", "-c", "core.quotepath=false"])
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::VersionStore(format!("Failed to run git: {}", e)))
    }

    /// Run git and fail unless it exits successfully.
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(args, &stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Put one path back to its `HEAD` content without touching the index.
    ///
    /// Paths absent from `HEAD` are removed from the working tree.
    fn restore_from_head(&self, path: &Path) -> Result<()> {
        let rel = git_path(path);
        let full = self.root.join(path);
        let output = self.run(&["cat-file", "blob", &format!("HEAD:{}", rel)])?;
        if output.status.success() {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, &output.stdout)?;
        } else if full.exists() {
            fs::remove_file(&full)?;
        }
        Ok(())
    }
}

impl VersionStore for GitStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn is_initialized(&self) -> Result<bool> {
        // Checked directly so a parent repository is never mistaken for ours
        Ok(self.root.join(".git").exists())
    }

    fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        if self.is_initialized()? {
            return Ok(());
        }

        self.run_checked(&["init", "-q"])?;
        fs::write(
            self.root.join(".gitignore"),
            format!("{}\n{}\n", NAVIGATION_FILE, LOCAL_CONFIG_FILE),
        )?;
        self.run_checked(&["add", "--", ".gitignore"])?;
        self.run_checked(&[
            "commit",
            "-q",
            "--no-verify",
            "-m",
            "Initialize bearing data repository",
        ])?;

        tracing::info!(root = %self.root.display(), "initialized data repository");
        Ok(())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let (present, missing): (Vec<&PathBuf>, Vec<&PathBuf>) =
            paths.iter().partition(|p| self.root.join(p).exists());

        if !present.is_empty() {
            let mut args = vec!["add", "--"];
            let rels: Vec<String> = present.iter().map(|p| git_path(p)).collect();
            args.extend(rels.iter().map(String::as_str));
            self.run_checked(&args)?;
        }
        if !missing.is_empty() {
            let mut args = vec!["rm", "-q", "--cached", "--ignore-unmatch", "--"];
            let rels: Vec<String> = missing.iter().map(|p| git_path(p)).collect();
            args.extend(rels.iter().map(String::as_str));
            self.run_checked(&args)?;
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitOutcome> {
        // `diff --cached --quiet` exits 0 when the index matches HEAD
        let output = self.run(&["diff", "--cached", "--quiet"])?;
        match output.status.code() {
            Some(0) => return Ok(CommitOutcome::Unchanged),
            Some(1) => {}
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Err(classify_failure(&["diff", "--cached"], &stderr));
            }
        }

        self.run_checked(&["commit", "-q", "--no-verify", "-m", message])?;
        let id = self.run_checked(&["rev-parse", "HEAD"])?;
        Ok(CommitOutcome::Committed(id))
    }

    fn discard(&self, paths: &[PathBuf]) -> Result<()> {
        // The index may be locked by another process; the working tree is
        // restored from HEAD objects regardless.
        let mut first_error = self.run_checked(&["reset", "-q"]).err();
        if let Some(e) = &first_error {
            tracing::warn!(error = %e, "could not unstage paths, restoring files anyway");
        }

        for path in paths {
            if let Err(e) = self.restore_from_head(path) {
                tracing::warn!(error = %e, path = %path.display(), "could not restore path");
                first_error.get_or_insert(e);
            }
        }
        tracing::debug!(paths = paths.len(), "restored working tree from HEAD");
        first_error.map_or(Ok(()), Err)
    }

    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = limit.to_string();
        let out = self.run_checked(&["log", "-n", &limit, "--format=%H%x1f%aI%x1f%s"])?;

        let mut entries = Vec::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            let mut parts = line.splitn(3, '\x1f');
            let (Some(commit), Some(date), Some(message)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let timestamp = DateTime::parse_from_rfc3339(date)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::VersionStore(format!("Bad commit date '{}': {}", date, e)))?;
            entries.push(HistoryEntry {
                commit: commit.to_string(),
                message: message.to_string(),
                timestamp,
            });
        }
        Ok(entries)
    }

    fn location(&self) -> String {
        format!("git repository: {}", self.root.display())
    }
}

/// Path as git expects it in pathspecs and `HEAD:<path>` lookups.
fn git_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Map a failed git invocation to an error kind.
fn classify_failure(args: &[&str], stderr: &str) -> Error {
    if stderr.contains("index.lock") {
        return Error::Locked(stderr.to_string());
    }
    let command = args.first().copied().unwrap_or("git");
    Error::VersionStore(format!("git {} failed: {}", command, stderr))
}
