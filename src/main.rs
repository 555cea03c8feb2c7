use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use timeflow::commands::*;
use timeflow::tui::run_tui;
use timeflow::storage::log_path;
use timeflow::{Config, HttpAdvisor, JsonFileStorage, SystemClock};

#[derive(Parser)]
#[command(name = "timeflow")]
#[command(about = "Track time spent on tasks, day by day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Estimated duration in minutes
        #[arg(short, long, allow_negative_numbers = true)]
        estimate: i64,
    },
    /// List all tasks with today's progress
    List,
    /// Edit a task
    Edit {
        id: u64,
        /// New task name
        #[arg(short, long)]
        name: Option<String>,
        /// New estimate in minutes
        #[arg(short, long, allow_negative_numbers = true)]
        estimate: Option<i64>,
    },
    /// Remove a task and all of its logs
    Remove {
        id: u64,
    },
    /// Log minutes spent on a task
    Log {
        id: u64,
        /// Minutes spent (replaces the day's value)
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
        /// Day in YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Also mark the task completed for the day
        #[arg(long)]
        done: bool,
    },
    /// Mark a task as complete for a day
    Complete {
        id: u64,
        /// Day in YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Mark incomplete instead
        #[arg(long)]
        undo: bool,
    },
    /// Show tasks still pending today
    Today,
    /// Show what was logged on a day
    Day {
        /// Day in YYYY-MM-DD (defaults to today)
        date: Option<String>,
    },
    /// Show a task's logged history
    History {
        id: u64,
    },
    /// Show a monthly calendar of activity
    Calendar {
        /// Month in YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Show the current completion streak
    Streak,
    /// Ask the AI advisor for a better estimate
    Suggest {
        id: u64,
        /// Estimate to evaluate instead of the stored one
        #[arg(short, long, allow_negative_numbers = true)]
        estimate: Option<i64>,
        /// Apply the suggested adjustment to the task
        #[arg(long)]
        apply: bool,
    },
    /// Reset all data (delete tasks and logs)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, None | Some(Commands::Ui)));

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Tracing is opt-in via RUST_LOG. It goes to stderr, except under the TUI,
/// which owns the terminal: there it is appended to a log file, or dropped if
/// that file cannot be opened.
fn init_tracing(tui: bool) {
    let Ok(filter) = EnvFilter::try_from_default_env() else { return };
    if !tui {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return;
    }
    let path = log_path();
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let storage = JsonFileStorage::new(config.state_path());

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Reset { force } => cmd_reset(&storage, force)?,
        Commands::Completions { shell } => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => anyhow::bail!("Unsupported shell: {}", shell),
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "timeflow", &mut io::stdout());
        }
        command => {
            let session = Session::open(Box::new(storage), SystemClock);
            run_with_session(command, session, &config)?;
        }
    }
    Ok(())
}

fn run_with_session(command: Commands, mut session: Session, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Add { name, estimate } => { cmd_add(&mut session, &name, estimate, false)?; }
        Commands::List => cmd_list(&session),
        Commands::Edit { id, name, estimate } => { cmd_edit(&mut session, id, name.as_deref(), estimate, false)?; }
        Commands::Remove { id } => { cmd_remove(&mut session, id, false)?; }
        Commands::Log { id, minutes, date, done } => { cmd_log(&mut session, id, minutes, date.as_deref(), done, false)?; }
        Commands::Complete { id, date, undo } => { cmd_complete(&mut session, id, date.as_deref(), undo, false)?; }
        Commands::Today => cmd_today(&session),
        Commands::Day { date } => cmd_day(&session, date.as_deref())?,
        Commands::History { id } => cmd_history(&session, id)?,
        Commands::Calendar { month } => cmd_calendar(&session, month.as_deref())?,
        Commands::Streak => cmd_streak(&session),
        Commands::Suggest { id, estimate, apply } => {
            let advisor = HttpAdvisor::from_config(&config.advisor)?;
            cmd_suggest(&mut session, &advisor, id, estimate, apply, false)?;
        }
        Commands::Ui => run_tui(session).map_err(|e| anyhow::anyhow!("Error running TUI: {}", e))?,
        // need no stored state; dispatched by `run`
        Commands::Reset { .. } | Commands::Completions { .. } => {}
    }
    Ok(())
}
