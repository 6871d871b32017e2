pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod worker;

use log::info;
use std::io;
use tokio_util::sync::CancellationToken;

pub use cli::Cli;
pub use client::StatusCakeClient;
pub use config::{Config, Settings};
pub use error::Error;
pub use models::{TestDetail, TestSummary};

/// Resolves settings from `cli` and the config file, then prints the test table to stdout.
pub async fn run(cli: Cli, token: CancellationToken) -> Result<(), Error> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = Settings::resolve(cli, config)?;

    info!("Querying {}", settings.base_url);
    let client = StatusCakeClient::new(&settings)?;

    let mut stdout = io::stdout();
    worker::run_report(&client, settings.concurrency, &token, &mut stdout).await?;
    Ok(())
}
