#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::Parser;
use coresync::Config;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod app;
mod cli;

use cli::commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    app::dispatch::dispatch(cli, config).await
}
