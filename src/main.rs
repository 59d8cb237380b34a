mod aggregator;
mod catalog;
mod city_index;
mod commands;
mod config;
mod csv_loader;
mod geocoder;
mod geometry;
mod image_index;
mod unused;

use clap::Parser;
use config::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // 日志默认 info，可用 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    match &cli.command {
        Commands::Import => {
            commands::import(&config)?;
        }
        Commands::Geocode(args) => {
            commands::geocode(&config, args)?;
        }
        Commands::Unused => {
            commands::unused(&config)?;
        }
    }

    Ok(())
}
