//! Chat Relay Client - Entry Point
//!
//! Connects to the relay and exchanges lines between stdin/stdout and the server.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chat_relay::{client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with received messages
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::parse();
    client::run(&config).await?;
    Ok(())
}
