//! Bearing CLI - a personal planning engine with a versioned history.

use bearing::cli::{
    BoardCommands, Cli, Commands, ConfigCommands, FocusCommands, KeyResultCommands, NavCommands,
    ObjectiveCommands, SystemCommands, TaskCommands, ThemeCommands,
};
use bearing::commands::{self, Output, TaskEdit};
use bearing::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use bearing::models::{DayFocus, NavigationContext};
use bearing::planner::{KeyResultUpdate, PlanningService, TaskFilter};
use chrono::{Datelike, Local};
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "BEARING_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging();

    let mut human = cli.human_readable;
    let result = overrides(&cli).and_then(|overrides| {
        let config = resolve_config(&overrides)?;
        human = config.output_format() == OutputFormat::Human;
        run_command(cli.command, &config, human)
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn overrides(cli: &Cli) -> Result<ConfigOverrides, bearing::Error> {
    let mut overrides = ConfigOverrides::new();
    if let Some(dir) = &cli.data_dir {
        overrides = overrides.with_data_dir(dir);
    }
    if let Some(policy) = &cli.cascade_policy {
        overrides = overrides.with_cascade_policy(commands::parse_cascade_policy(policy)?);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    Ok(overrides)
}

fn output<T: Output>(result: &T, human: bool) -> i32 {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
    result.exit_code()
}

fn run_command(
    command: Commands,
    config: &ResolvedConfig,
    human: bool,
) -> Result<i32, bearing::Error> {
    // Commands that do not open the planning service
    match command {
        Commands::System {
            command: SystemCommands::Init,
        } => Ok(output(&commands::system_init(config)?, human)),
        Commands::Config { command } => run_config(command, config, human),
        command => {
            let mut service = commands::open_service(config)?;
            run_planning(command, &mut service, config, human)
        }
    }
}

fn run_config(
    command: ConfigCommands,
    config: &ResolvedConfig,
    human: bool,
) -> Result<i32, bearing::Error> {
    match command {
        ConfigCommands::Show => Ok(output(config, human)),
        ConfigCommands::Set { key, value, system } => {
            let result = commands::config_set(config, &key, &value, system)?;
            Ok(output(&result, human))
        }
    }
}

fn run_planning(
    command: Commands,
    service: &mut PlanningService,
    config: &ResolvedConfig,
    human: bool,
) -> Result<i32, bearing::Error> {
    let code = match command {
        Commands::Theme { command } => match command {
            ThemeCommands::List => output(&service.list_themes()?, human),
            ThemeCommands::Create { name, color } => {
                output(&service.create_theme(&name, &color)?, human)
            }
            ThemeCommands::Update { id, name, color } => output(
                &service.update_theme(&id, name.as_deref(), color.as_deref())?,
                human,
            ),
            ThemeCommands::Delete { id } => output(&service.delete_theme(&id)?, human),
        },

        Commands::Objective { command } => match command {
            ObjectiveCommands::Create { parent, title } => {
                output(&service.create_objective(&parent, &title)?, human)
            }
            ObjectiveCommands::Update { id, title } => {
                output(&service.update_objective(&id, &title)?, human)
            }
            ObjectiveCommands::Delete { id } => output(&service.delete_objective(&id)?, human),
            ObjectiveCommands::Status { id, status } => {
                let status = commands::parse_okr_status(&status)?;
                output(&service.set_objective_status(&id, status)?, human)
            }
        },

        Commands::Kr { command } => match command {
            KeyResultCommands::Create {
                objective,
                description,
                start,
                target,
            } => output(
                &service.create_key_result(&objective, &description, start, target)?,
                human,
            ),
            KeyResultCommands::Update {
                id,
                description,
                start,
                current,
                target,
            } => {
                let update = KeyResultUpdate {
                    description,
                    start_value: start,
                    current_value: current,
                    target_value: target,
                };
                output(&service.update_key_result(&id, update)?, human)
            }
            KeyResultCommands::Delete { id } => output(&service.delete_key_result(&id)?, human),
            KeyResultCommands::Status { id, status } => {
                let status = commands::parse_okr_status(&status)?;
                output(&service.set_key_result_status(&id, status)?, human)
            }
        },

        Commands::Focus { command } => match command {
            FocusCommands::List { year } => {
                let year = year.unwrap_or_else(|| Local::now().year());
                output(&service.get_year_focus(year)?, human)
            }
            FocusCommands::Set {
                date,
                theme,
                text,
                notes,
            } => {
                let entry = DayFocus {
                    date,
                    theme_id: theme,
                    text,
                    notes,
                };
                output(&service.save_day_focus(entry)?, human)
            }
            FocusCommands::Clear { date } => output(&service.clear_day_focus(date)?, human),
        },

        Commands::Task { command } => match command {
            TaskCommands::Create {
                theme,
                title,
                description,
                priority,
                tag,
                parent,
                day,
                due,
                promote_on,
            } => {
                let new = commands::new_task(
                    theme,
                    title,
                    description,
                    priority,
                    tag,
                    parent,
                    day,
                    due,
                    promote_on,
                )?;
                output(&service.create_task(new)?, human)
            }
            TaskCommands::List {
                theme,
                status,
                parent,
                tag,
            } => {
                let filter = TaskFilter {
                    theme_id: theme,
                    status: status
                        .as_deref()
                        .map(commands::parse_task_status)
                        .transpose()?,
                    parent_task_id: parent,
                    tag,
                };
                output(&service.list_tasks(&filter)?, human)
            }
            TaskCommands::Show { id } => output(&service.get_task(&id)?, human),
            TaskCommands::Update {
                id,
                title,
                description,
                priority,
                add_tag,
                remove_tag,
                parent,
                no_parent,
                day,
                due,
                promote_on,
                clear_dates,
            } => {
                let edit = TaskEdit {
                    title,
                    description,
                    priority,
                    add_tags: add_tag,
                    remove_tags: remove_tag,
                    parent,
                    no_parent,
                    day,
                    due,
                    promote_on,
                    clear_dates,
                };
                output(&commands::task_update(service, &id, edit)?, human)
            }
            TaskCommands::Status { id, status } => {
                let status = commands::parse_task_status(&status)?;
                output(&service.set_task_status(&id, status)?, human)
            }
            TaskCommands::Move { id, zone, position } => {
                output(&service.move_task(&id, &zone, position)?, human)
            }
            TaskCommands::Reorder { zone, ids } => {
                output(&service.reorder_tasks(&zone, &ids)?, human)
            }
            TaskCommands::Delete { id } => output(&service.delete_task(&id, None)?, human),
        },

        Commands::Promote { today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            output(&service.run_priority_promotion(today)?, human)
        }

        Commands::Board { command } => match command {
            BoardCommands::Show => output(&commands::board_show(service)?, human),
            BoardCommands::Wip { zone, limit } => {
                output(&service.set_wip_limit(&zone, limit)?, human)
            }
        },

        Commands::Nav { command } => match command {
            NavCommands::Show => output(&service.load_navigation_context()?, human),
            NavCommands::Save {
                view,
                item,
                theme,
                date,
            } => {
                let context = NavigationContext {
                    current_view: view,
                    current_item: item,
                    filter_theme_id: theme,
                    filter_date: date,
                    last_accessed: None,
                };
                output(&service.save_navigation_context(context)?, human)
            }
        },

        Commands::System { command } => match command {
            SystemCommands::Status => output(&commands::system_status(service)?, human),
            SystemCommands::History { limit } => output(&service.history(limit)?, human),
            SystemCommands::Init => output(&commands::system_init(config)?, human),
        },

        Commands::Config { command } => return run_config(command, config, human),
    };

    Ok(code)
}
