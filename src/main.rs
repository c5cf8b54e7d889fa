mod api;
mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::players::PlayerFilter;

#[derive(Parser)]
#[command(name = "league-hub")]
#[command(about = "League standings, fixtures and squads for a football league site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print the league table
    Table {
        #[arg(short, long)]
        season: Option<String>,
        /// Write the table as CSV to stdout
        #[arg(long)]
        csv: bool,
    },
    /// Show the matchweek in progress (or the next one)
    Current {
        #[arg(short, long)]
        season: Option<String>,
    },
    /// List fixtures, one page at a time
    Fixtures {
        #[arg(short, long)]
        season: Option<String>,
        #[arg(short, long)]
        matchweek: Option<String>,
        #[arg(short, long, default_value = "0")]
        page: usize,
        /// Walk through every page
        #[arg(long)]
        all: bool,
    },
    /// List players
    Players {
        #[arg(short, long)]
        club: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(short, long)]
        season: Option<String>,
    },
    /// Recompute and save table position changes
    Finalize {
        #[arg(short, long)]
        season: Option<String>,
    },
    /// Initialize the database
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting league hub API server on port {}", port);
            api::serve(port, config).await?;
        }
        Some(Commands::Table { season, csv }) => {
            cli::show_table(&config, season.as_deref(), csv).await?;
        }
        Some(Commands::Current { season }) => {
            cli::show_current_matchweek(&config, season.as_deref()).await?;
        }
        Some(Commands::Fixtures {
            season,
            matchweek,
            page,
            all,
        }) => {
            cli::show_fixtures(&config, season.as_deref(), matchweek.as_deref(), page, all).await?;
        }
        Some(Commands::Players {
            club,
            search,
            season,
        }) => {
            cli::show_players(&config, PlayerFilter { club, search, season }).await?;
        }
        Some(Commands::Finalize { season }) => {
            tracing::info!("Finalizing standings...");
            cli::finalize(&config, season.as_deref()).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database(&config.database_url).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting league hub API server on port 3000");
            api::serve(3000, config).await?;
        }
    }

    Ok(())
}
