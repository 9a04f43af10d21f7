mod commands;
mod input;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use duet_core::config::DuetConfig;

use crate::input::DisplayArgs;

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Lay out shared calendar events as day, week, month and dual timelines")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (-q errors only, -qq silent)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    /// Config file to use instead of ~/.config/duet/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one day as overlap clusters
    Day {
        /// Date to show (YYYY-MM-DD, "today", "tomorrow", "yesterday")
        #[arg(short, long)]
        date: Option<String>,

        /// Event files (.ics or .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Show the week containing a date
    Week {
        /// Any date in the week (YYYY-MM-DD, "today", ...)
        #[arg(short, long)]
        date: Option<String>,

        /// Event files (.ics or .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Show a month grid
    Month {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        /// Event files (.ics or .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Show your events next to your partner's
    Dual {
        /// Date to show (YYYY-MM-DD, "today", ...)
        #[arg(short, long)]
        date: Option<String>,

        /// Your event file
        #[arg(long)]
        user: PathBuf,

        /// Your partner's event file
        #[arg(long)]
        partner: PathBuf,

        /// Also print empty slots
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Convert a time between zones
    Convert {
        /// RFC 3339 instant, or a wall-clock time (YYYY-MM-DDTHH:MM) with --from
        time: String,

        /// Zone to convert to
        #[arg(long)]
        to: String,

        /// Zone the wall-clock time is in
        #[arg(long)]
        from: Option<String>,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => DuetConfig::config_path()?,
    };

    match cli.command {
        Commands::Day {
            date,
            files,
            display,
        } => commands::timeline::run_day(&config_path, date.as_deref(), &files, &display),
        Commands::Week {
            date,
            files,
            display,
        } => commands::timeline::run_week(&config_path, date.as_deref(), &files, &display),
        Commands::Month {
            month,
            files,
            display,
        } => commands::month::run(&config_path, month.as_deref(), &files, &display),
        Commands::Dual {
            date,
            user,
            partner,
            all,
            display,
        } => commands::dual::run(&config_path, date.as_deref(), &user, &partner, all, &display),
        Commands::Convert { time, to, from } => commands::convert::run(&time, &to, from.as_deref()),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(&config_path, force),
            ConfigAction::Show => commands::config::show(&config_path),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
