//! Dispatcher events and outbound text
//!
//! Inbound: events queued by connection readers and the accept loop.
//! Outbound: the plain-text lines the relay broadcasts. Chat lines and
//! join/leave notices are indistinguishable on the wire.

use std::fmt;
use std::net::SocketAddr;

use crate::peer::{Peer, PeerInfo};
use crate::types::Identity;

/// A decoded chat line paired with its sender
#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// Peer the line came from
    pub sender: PeerInfo,
    /// Trimmed, non-empty text
    pub text: String,
}

/// A peer's stream has ended
///
/// Carries the identity as well as the endpoint, so a late disconnect for
/// an old connection cannot remove a newer peer that reused the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEvent {
    /// Endpoint of the peer that left
    pub endpoint: SocketAddr,
    /// Identity of the connection that ended
    pub identity: Identity,
}

/// Events queued to the dispatcher
///
/// All three kinds share one queue so that a connection's join, chat lines
/// and disconnect reach the dispatcher in the order they were produced.
#[derive(Debug)]
pub enum RelayEvent<W> {
    /// New peer accepted; register it and announce it
    Join(Peer<W>),
    /// Chat line from a connected peer
    Chat(ChatEvent),
    /// Peer's reader has closed
    Disconnect(DisconnectEvent),
}

/// Text broadcast to peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// `<identity>: <text>`
    Chat { from: Identity, text: String },
    /// `<identity> joined the room`
    Joined(Identity),
    /// `<identity> left the room`
    Left(Identity),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Chat { from, text } => write!(f, "{}: {}", from, text),
            Notice::Joined(identity) => write!(f, "{} joined the room", identity),
            Notice::Left(identity) => write!(f, "{} left the room", identity),
        }
    }
}
