//! Multi-client TCP Chat Relay Library
//!
//! Clients connect, send text lines, and the relay rebroadcasts each line
//! to every other connected client.
//!
//! # Wire protocol
//! Every message is `[u32 big-endian length][length bytes of UTF-8]`.
//! Maximum length is 4096 bytes; a zero length means "nothing" and is
//! ignored by both ends. Chat lines and join/leave notices are plain text
//! frames, indistinguishable on the wire.
//!
//! # Architecture
//! Uses the Actor pattern with an `mpsc` channel:
//! - `Dispatcher` is the central actor owning the peer registry
//! - Each connection has a reader task feeding events to the dispatcher
//! - No locks needed - the registry is only touched by the dispatcher task
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     serve(listener, &config).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod handler;
pub mod listener;
pub mod message;
pub mod peer;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use config::{ClientConfig, ServerConfig};
pub use error::{AppError, FrameError};
pub use frame::MAX_MESSAGE_SIZE;
pub use handler::handle_connection;
pub use listener::serve;
pub use message::{ChatEvent, DisconnectEvent, Notice, RelayEvent};
pub use peer::{Peer, PeerInfo};
pub use registry::Registry;
pub use server::{Dispatcher, DispatcherHandle};
pub use types::{Identity, IdentityGenerator};
