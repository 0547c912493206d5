//! CLI entry point for the convention export.
//!
//! Usage: `cargo run -- [--output data/conventions.csv]`

use std::process;

use clap::Parser;
use convention_export::{Config, ListingClient};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let result = match ListingClient::new(config.timeout()) {
        Ok(client) => convention_export::export(&client, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(rows) => println!("Wrote {} with {} rows", config.output.display(), rows),
        Err(e) => {
            tracing::error!(error = %e, "Export failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
