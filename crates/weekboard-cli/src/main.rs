use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "weekboard", version, about = "Weekly priorities and habits from the terminal")]
struct Cli {
    /// Week to act on, relative to the current week (-1 is last week)
    #[arg(long, global = true, default_value_t = 0, allow_hyphen_values = true)]
    week_offset: i64,

    /// Print machine-readable JSON instead of the plain view
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the weekly board (priorities and habit grid)
    Board,
    /// Weekly priorities management
    Priority {
        #[command(subcommand)]
        action: commands::priority::PriorityAction,
    },
    /// Habit grid management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Show the active week and its days
    Week,
    /// Follow the board live, re-rendering on every change
    Watch,
    /// Show the signed-in identity
    Whoami,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "weekboard_core=warn,weekboard=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Board) | None => commands::board::run(cli.week_offset, cli.json).await,
        Some(Commands::Priority { action }) => commands::priority::run(action, cli.json).await,
        Some(Commands::Habit { action }) => {
            commands::habit::run(action, cli.week_offset, cli.json).await
        }
        Some(Commands::Week) => commands::week::run(cli.week_offset, cli.json),
        Some(Commands::Watch) => commands::watch::run(cli.week_offset).await,
        Some(Commands::Whoami) => commands::whoami::run(cli.json).await,
        Some(Commands::Config { action }) => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
