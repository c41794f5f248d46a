//! Peer definitions
//!
//! A peer is a connected participant: its identity, its endpoint address
//! (the registry key) and the write half of its transport.

use std::fmt;
use std::net::SocketAddr;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::types::Identity;

/// Identity and endpoint of a peer
///
/// Cheap to clone; this is what travels inside events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Display identity, stable for the connection's lifetime
    pub identity: Identity,
    /// Remote address, unique among registered peers
    pub endpoint: SocketAddr,
}

impl PeerInfo {
    /// Create peer info from an identity and endpoint
    pub fn new(identity: Identity, endpoint: SocketAddr) -> Self {
        Self { identity, endpoint }
    }
}

/// Registered peer
///
/// Holds the write half of the peer's transport. The read half belongs to
/// the peer's own connection reader; only the dispatcher writes here.
pub struct Peer<W> {
    /// Identity and endpoint
    pub info: PeerInfo,
    /// Write half of the transport
    pub writer: W,
    /// Set once a write failed or was cut short; the stream may hold a
    /// partial frame and must not receive any more
    pub poisoned: bool,
}

impl<W> Peer<W> {
    /// Create a peer owning the given writer
    pub fn new(info: PeerInfo, writer: W) -> Self {
        Self {
            info,
            writer,
            poisoned: false,
        }
    }

    /// Display identity of this peer
    pub fn identity(&self) -> &Identity {
        &self.info.identity
    }

    /// Endpoint address of this peer
    pub fn endpoint(&self) -> SocketAddr {
        self.info.endpoint
    }
}

impl<W> Peer<W>
where
    W: AsyncWrite + Unpin,
{
    /// Write an already-encoded frame to this peer
    pub async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await
    }

    /// Stop writing to this peer and shut its write half down
    ///
    /// The client sees end-of-stream instead of a frame spliced onto a
    /// partial one.
    pub async fn poison(&mut self) -> std::io::Result<()> {
        self.poisoned = true;
        self.writer.shutdown().await
    }
}

impl<W> fmt::Debug for Peer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("info", &self.info)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
