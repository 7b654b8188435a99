use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_feed_cli::cli::{execute, init_tracing, watch, FeedCommand};
use portal_feed_core::models::{ActivityStatus, ActivityType, Priority, Selection, TimeRange};
use portal_feed_core::{FeedConfig, FeedSession, FilterState, HttpEventStore};

#[derive(Parser)]
#[command(name = "portal-feed")]
#[command(about = "Activity feed and notification inbox for the school portal")]
struct Cli {
    /// Path to JSON config file (baseUrl, authToken, pollIntervalSecs, ...)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the event store base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Override the bearer token
    #[arg(long)]
    token: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the filtered activity feed grouped by day
    Feed {
        /// all, today, week or month
        #[arg(long, default_value = "all")]
        time_range: TimeRange,
        /// Activity type, e.g. RESULT_UPLOAD, or all
        #[arg(long = "type", default_value = "all")]
        activity_type: Selection<ActivityType>,
        /// NEW, READ, CRITICAL, INFO or all
        #[arg(long, default_value = "all")]
        status: Selection<ActivityStatus>,
        /// HIGH, MEDIUM, LOW or all
        #[arg(long, default_value = "all")]
        priority: Selection<Priority>,
    },

    /// Show the feed header counters
    Stats,

    /// List the newest notifications
    Notifications {
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Print the unread notification count
    Unread,

    /// Mark one notification as read
    MarkRead { id: String },

    /// Mark every notification as read
    MarkAllRead,

    /// Poll the unread count and print it whenever it changes
    Watch,
}

impl From<Commands> for FeedCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Feed {
                time_range,
                activity_type,
                status,
                priority,
            } => FeedCommand::Feed(
                FilterState::new()
                    .with_time_range(time_range)
                    .with_type(activity_type)
                    .with_status(status)
                    .with_priority(priority),
            ),
            Commands::Stats => FeedCommand::Stats,
            Commands::Notifications { limit } => FeedCommand::Notifications { limit },
            Commands::Unread => FeedCommand::Unread,
            Commands::MarkRead { id } => FeedCommand::MarkRead { id },
            Commands::MarkAllRead => FeedCommand::MarkAllRead,
            Commands::Watch => FeedCommand::Watch,
        }
    }
}

fn load_config(cli: &Cli) -> Result<FeedConfig> {
    let mut config = match &cli.config {
        Some(path) => FeedConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FeedConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        config.auth_token = Some(token.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let store = HttpEventStore::from_config(&config).context("Failed to build HTTP client")?;
    let session = FeedSession::new(config, store);

    let command = FeedCommand::from(cli.command);
    if command == FeedCommand::Watch {
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        return watch(&session, cli.json, &mut std::io::stdout(), shutdown).await;
    }

    let output = execute(&session, &command, cli.json).await?;
    println!("{}", output.text);
    session.shutdown();
    if output.failed {
        std::process::exit(1);
    }
    Ok(())
}
