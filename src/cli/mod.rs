//! CLI argument definitions for Bearing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version string with the commit and time of the build.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BEARING_GIT_COMMIT"),
    " ",
    env!("BEARING_BUILD_TIMESTAMP"),
    ")"
);

/// Bearing - life themes, OKRs and a task board with a full history.
///
/// Every change is recorded as one commit in the data directory.
#[derive(Parser, Debug)]
#[command(name = "bearing")]
#[command(author, version = VERSION, about = "A personal planning engine with a versioned history", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory to use instead of the configured one.
    /// Can also be set via BEARING_DATA_DIR environment variable.
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Subtask cascade policy (none, archive, delete, promote)
    #[arg(long = "cascade", global = true)]
    pub cascade_policy: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Life theme management
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// Objective management
    Objective {
        #[command(subcommand)]
        command: ObjectiveCommands,
    },

    /// Key result management
    Kr {
        #[command(subcommand)]
        command: KeyResultCommands,
    },

    /// Day focus calendar
    Focus {
        #[command(subcommand)]
        command: FocusCommands,
    },

    /// Task management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Escalate tasks whose promotion date has arrived
    Promote {
        /// Day to promote for (defaults to the local date)
        #[arg(long, env = "BEARING_TODAY")]
        today: Option<NaiveDate>,
    },

    /// Board layout and WIP limits
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },

    /// Saved UI navigation state
    Nav {
        #[command(subcommand)]
        command: NavCommands,
    },

    /// Configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Data directory administration
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// Life theme subcommands
#[derive(Subcommand, Debug)]
pub enum ThemeCommands {
    /// List themes with their objective trees
    List,

    /// Create a theme; its id is derived from the name's initials
    Create {
        /// Theme name (e.g., "Health & Fitness")
        name: String,

        /// Display color
        #[arg(short, long, default_value = "#6366f1")]
        color: String,
    },

    /// Rename or recolor a theme
    Update {
        /// Theme ID (e.g., HF)
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New color
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a theme and its objectives (refused while tasks use it)
    Delete {
        /// Theme ID
        id: String,
    },
}

/// Objective subcommands
#[derive(Subcommand, Debug)]
pub enum ObjectiveCommands {
    /// Create an objective under a theme or another objective
    Create {
        /// Parent theme or objective ID (e.g., HF or HF.O1)
        parent: String,

        /// Objective title
        title: String,
    },

    /// Change an objective's title
    Update {
        /// Objective ID (e.g., HF.O1)
        id: String,

        /// New title
        title: String,
    },

    /// Delete an objective with everything below it
    Delete {
        /// Objective ID
        id: String,
    },

    /// Set the status (active, completed, archived)
    Status {
        /// Objective ID
        id: String,

        /// New status
        status: String,
    },
}

/// Key result subcommands
#[derive(Subcommand, Debug)]
pub enum KeyResultCommands {
    /// Add a key result to an objective
    Create {
        /// Objective ID (e.g., HF.O1)
        objective: String,

        /// What is measured
        description: String,

        /// Starting value
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Target value (0 for an untracked result)
        #[arg(long, default_value_t = 0.0)]
        target: f64,
    },

    /// Change a key result's description or values
    Update {
        /// Key result ID (e.g., HF.O1.KR1)
        id: String,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New starting value
        #[arg(long)]
        start: Option<f64>,

        /// New current value
        #[arg(long)]
        current: Option<f64>,

        /// New target value
        #[arg(long)]
        target: Option<f64>,
    },

    /// Delete a key result
    Delete {
        /// Key result ID
        id: String,
    },

    /// Set the status (active, completed, archived)
    Status {
        /// Key result ID
        id: String,

        /// New status
        status: String,
    },
}

/// Day focus subcommands
#[derive(Subcommand, Debug)]
pub enum FocusCommands {
    /// List the focus entries of a year
    List {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Set the focus of a day
    Set {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,

        /// Theme the day is dedicated to
        #[arg(short, long)]
        theme: Option<String>,

        /// Short focus text
        #[arg(long, default_value = "")]
        text: String,

        /// Longer notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Clear the focus of a day
    Clear {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task in the todo column
    Create {
        /// Theme ID (e.g., HF)
        theme: String,

        /// Task title
        title: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (important-urgent, important-not-urgent, not-important-urgent)
        #[arg(short, long)]
        priority: Option<String>,

        /// Tags for the task
        #[arg(short, long)]
        tag: Vec<String>,

        /// Parent task ID, making this a subtask
        #[arg(long)]
        parent: Option<String>,

        /// Day the task is planned for
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Deadline
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Date from which the priority escalates
        #[arg(long = "promote-on")]
        promote_on: Option<NaiveDate>,
    },

    /// List tasks in board order
    List {
        /// Filter by theme
        #[arg(long)]
        theme: Option<String>,

        /// Filter by status (todo, doing, done, archived)
        #[arg(long)]
        status: Option<String>,

        /// Only subtasks of this task
        #[arg(long)]
        parent: Option<String>,

        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID (e.g., HF-T1)
        id: String,
    },

    /// Edit a task's fields (status and zone changes use `status` and `move`)
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// Add a tag
        #[arg(long)]
        add_tag: Vec<String>,

        /// Remove a tag
        #[arg(long)]
        remove_tag: Vec<String>,

        /// New parent task ID
        #[arg(long, conflicts_with = "no_parent")]
        parent: Option<String>,

        /// Make the task top-level
        #[arg(long)]
        no_parent: bool,

        /// New planned day
        #[arg(long)]
        day: Option<NaiveDate>,

        /// New deadline
        #[arg(long)]
        due: Option<NaiveDate>,

        /// New promotion date
        #[arg(long = "promote-on")]
        promote_on: Option<NaiveDate>,

        /// Remove the planned day, deadline and promotion date
        #[arg(long)]
        clear_dates: bool,
    },

    /// Change a task's status (todo, doing, done, archived)
    Status {
        /// Task ID
        id: String,

        /// New status
        status: String,
    },

    /// Move a task to a drop zone (column, section or "archived")
    Move {
        /// Task ID
        id: String,

        /// Target zone (e.g., doing, important-urgent, archived)
        zone: String,

        /// Position within the zone (0-based, default: end)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Set the manual order of a drop zone
    Reorder {
        /// Drop zone
        zone: String,

        /// Task IDs in their new order
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete a task, applying the cascade policy to its subtasks
    Delete {
        /// Task ID
        id: String,
    },
}

/// Board subcommands
#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Show the board layout and the task order of every zone
    Show,

    /// Set or clear the WIP limit of a column or section
    Wip {
        /// Column or section name
        zone: String,

        /// Maximum number of tasks (omit to remove the limit)
        limit: Option<u32>,
    },
}

/// Navigation subcommands
#[derive(Subcommand, Debug)]
pub enum NavCommands {
    /// Show the saved navigation context
    Show,

    /// Save the navigation context
    Save {
        /// View that is open
        view: String,

        /// Item selected in that view
        #[arg(long)]
        item: Option<String>,

        /// Theme filter
        #[arg(long)]
        theme: Option<String>,

        /// Date filter
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show every resolved value and where it came from
    Show,

    /// Set a value in a config file
    Set {
        /// Configuration key (data-dir, cascade-policy, output-format, author-name, author-email)
        key: String,

        /// Configuration value
        value: String,

        /// Write the system config instead of the data directory's
        #[arg(long)]
        system: bool,
    },
}

/// System administration subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Initialize the data directory
    Init,

    /// Summarize the data directory
    Status,

    /// Show the most recent history entries
    History {
        /// Number of entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}
