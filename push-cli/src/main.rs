//! # push
//!
//! Command-line client for Pushover notifications.
//!
//! ## Commands
//!
//! - `login`: Log in and register this machine as a receiving device
//! - `logout`: Forget the registered device
//! - `send`: Send a notification
//! - `messages`: Fetch, store, and acknowledge new messages
//! - `history`: Query locally stored messages
//! - `mark-read`: Acknowledge messages up to an id
//! - `config`: Show the current configuration
//!
//! ## Example
//!
//! ```bash
//! # Register this machine (prompts for app token, email, password)
//! push login --device-name laptop
//!
//! # Send a notification
//! push send -t "Build" -p 1 "Deploy finished"
//!
//! # Fetch new messages
//! push messages
//!
//! # Search what was received in the last day
//! push history --since 1d --search deploy
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod prompt;

use commands::{history, login, logout, mark_read, messages, send, show_config};

/// Command-line client for Pushover notifications.
#[derive(Parser, Debug)]
#[command(name = "push")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the message database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and register this machine as a device
    Login {
        /// Name to register the device under
        #[arg(long)]
        device_name: Option<String>,
    },

    /// Forget the registered device
    Logout,

    /// Send a notification
    Send(SendArgs),

    /// Fetch new messages, store them, and mark them read
    Messages {
        /// Maximum number of messages to display (0 or less shows 10)
        #[arg(long, short = 'n', default_value = "10", allow_hyphen_values = true)]
        limit: i64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Query stored messages
    History {
        /// Maximum number of rows
        #[arg(long, short = 'n', default_value = "20")]
        limit: i64,

        /// Only rows at or after this time (e.g. 2h, 3d, yesterday, 2024-01-31)
        #[arg(long)]
        since: Option<String>,

        /// Only rows at or before this time
        #[arg(long)]
        until: Option<String>,

        /// Substring to search for in title or message
        #[arg(long)]
        search: Option<String>,

        /// Show sent notifications instead of received messages
        #[arg(long)]
        sent: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Mark messages up to an id as read
    MarkRead {
        /// Highest message id to acknowledge
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Show the current configuration
    Config,
}

/// Arguments for `push send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message text (words are joined with spaces)
    #[arg(required = true)]
    pub message: Vec<String>,

    /// Message title
    #[arg(long, short)]
    pub title: Option<String>,

    /// Priority from -2 (lowest) to 2 (emergency)
    #[arg(long, short, allow_negative_numbers = true,
          value_parser = clap::value_parser!(i64).range(-2..=2))]
    pub priority: Option<i64>,

    /// Supplementary URL
    #[arg(long, short)]
    pub url: Option<String>,

    /// Title for the supplementary URL
    #[arg(long)]
    pub url_title: Option<String>,

    /// Notification sound
    #[arg(long, short)]
    pub sound: Option<String>,

    /// Target device (defaults to the configured default device)
    #[arg(long, short)]
    pub device: Option<String>,

    /// Render the message as HTML
    #[arg(long, conflicts_with = "monospace")]
    pub html: bool,

    /// Render the message in a monospace font
    #[arg(long)]
    pub monospace: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let db_path = data_dir.join("push.db");

    match cli.command {
        Commands::Login { device_name } => {
            login::run(&config_path, device_name.as_deref()).await?;
        }
        Commands::Logout => {
            logout::run(&config_path).await?;
        }
        Commands::Send(args) => {
            send::run(&config_path, &db_path, args).await?;
        }
        Commands::Messages { limit, json } => {
            messages::run(&config_path, &db_path, limit, json).await?;
        }
        Commands::History {
            limit,
            since,
            until,
            search,
            sent,
            json,
        } => {
            let filter = history::HistoryFilter {
                limit,
                since,
                until,
                search,
                sent,
            };
            history::run(&db_path, &filter, json).await?;
        }
        Commands::MarkRead { id } => {
            mark_read::run(&config_path, id).await?;
        }
        Commands::Config => {
            show_config::run(&config_path).await?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins, then `PUSH_LOG`, then `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("PUSH_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "push").context("Could not determine home directory")
}

/// Get the default config file path.
fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the default data directory.
fn default_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}
