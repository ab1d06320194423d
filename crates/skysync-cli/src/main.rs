mod artifact;
mod gate;
mod notify;
mod refresh;
mod store;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gate::{RefreshGate, RefreshKind};

#[derive(Debug, Parser)]
#[command(name = "skysync")]
#[command(about = "Weather refresh orchestration for tracked locations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh weather for all tracked locations, or a single one
    Refresh {
        /// Restrict the refresh to a specific location (by id)
        #[arg(long)]
        location: Option<String>,

        /// Run as the periodic automatic batch instead of a manual one
        #[arg(long)]
        automatic: bool,

        /// Refresh even locations whose snapshot is still fresh
        #[arg(long)]
        force: bool,
    },
    /// List the registered weather sources
    Sources,
    /// List the tracked locations and their ids
    Locations,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = skysync_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Refresh {
            location,
            automatic,
            force,
        } => {
            let kind = if automatic {
                RefreshKind::Automatic
            } else {
                RefreshKind::Manual
            };
            let gate = RefreshGate::default();
            refresh::run_refresh(&config, &gate, kind, location.as_deref(), force).await
        }
        Commands::Sources => {
            let registry = refresh::build_registry(&config)?;
            for id in registry.ids() {
                println!("{id}");
            }
            Ok(())
        }
        Commands::Locations => {
            let file = skysync_core::load_locations(&config.locations_path)?;
            for location in file.into_locations() {
                println!(
                    "{}  {}  ({}, {})  source={}",
                    location.formatted_id,
                    location.display_name,
                    location.latitude,
                    location.longitude,
                    location.weather_source
                );
            }
            Ok(())
        }
    }
}
