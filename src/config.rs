//! Command line configuration
//!
//! Parsed with clap's derive API. `ServerConfig::default()` matches the
//! command line defaults so the library can be driven without arguments.

use std::time::Duration;

use clap::Parser;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default bound on the dispatcher event queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default bound on a single broadcast write, in milliseconds
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// Chat relay server options
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Multi-client TCP chat relay", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Maximum number of queued events before connection readers block
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Maximum time spent writing one broadcast to one peer
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    pub write_timeout_ms: u64,
}

impl ServerConfig {
    /// Per-peer write bound as a `Duration`
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

/// Interactive client options
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Line-based client for the chat relay", long_about = None)]
pub struct ClientConfig {
    /// Server address to connect to
    #[arg(default_value = DEFAULT_ADDR)]
    pub addr: String,
}
