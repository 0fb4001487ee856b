use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "checkmate", version, about = "Checkmate focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Keep the timer running in this terminal
    Watch {
        /// Start the suggested break as soon as a focus session ends
        #[arg(long)]
        auto_break: bool,
    },
    /// Focus-time totals for today, this week and this month
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Task list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CHECKMATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = commands::show_instructions_once() {
        tracing::warn!(error = %e, "could not check first-run state");
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Watch { auto_break } => commands::watch::run(auto_break),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Task { action } => commands::task::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
