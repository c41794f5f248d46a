//! Dispatcher actor implementation
//!
//! The single task that owns the peer registry. Connection readers and the
//! accept loop talk to it only through a bounded mpsc queue, so membership
//! changes and broadcasts are processed one event at a time without locks.

use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::message::{ChatEvent, DisconnectEvent, Notice, RelayEvent};
use crate::peer::{Peer, PeerInfo};
use crate::registry::Registry;

/// Sending side of the dispatcher queue
///
/// Cloned into the accept loop and every connection reader. Sends block
/// while the queue is full; nothing is dropped.
pub struct DispatcherHandle<W> {
    sender: mpsc::Sender<RelayEvent<W>>,
}

impl<W> Clone for DispatcherHandle<W> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<W> DispatcherHandle<W> {
    pub(crate) fn new(sender: mpsc::Sender<RelayEvent<W>>) -> Self {
        Self { sender }
    }

    /// Register a newly accepted peer
    pub async fn join(&self, peer: Peer<W>) -> Result<(), AppError> {
        self.send(RelayEvent::Join(peer)).await
    }

    /// Queue a chat line for broadcast
    pub async fn chat(&self, event: ChatEvent) -> Result<(), AppError> {
        self.send(RelayEvent::Chat(event)).await
    }

    /// Report that a peer's stream has ended
    pub async fn disconnect(&self, peer: PeerInfo) -> Result<(), AppError> {
        let PeerInfo { identity, endpoint } = peer;
        self.send(RelayEvent::Disconnect(DisconnectEvent { endpoint, identity }))
            .await
    }

    async fn send(&self, event: RelayEvent<W>) -> Result<(), AppError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| AppError::ChannelSend)
    }
}

/// The dispatcher actor
///
/// Sole owner of the registry. Every insert, remove and broadcast happens
/// inside `run`, one event at a time.
pub struct Dispatcher<W> {
    /// Connected peers: endpoint -> Peer
    registry: Registry<W>,
    /// Event receiver channel
    receiver: mpsc::Receiver<RelayEvent<W>>,
}

impl<W> Dispatcher<W> {
    /// Create a dispatcher and the handle that feeds it
    ///
    /// `capacity` bounds the event queue (minimum 1); `write_timeout` bounds
    /// each per-peer write during a broadcast.
    pub fn new(capacity: usize, write_timeout: Duration) -> (Self, DispatcherHandle<W>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            registry: Registry::new(write_timeout),
            receiver,
        };
        (dispatcher, DispatcherHandle::new(sender))
    }

    /// Current registry contents
    pub fn registry(&self) -> &Registry<W> {
        &self.registry
    }
}

impl<W> Dispatcher<W>
where
    W: AsyncWrite + Unpin,
{
    /// Run the dispatcher event loop
    ///
    /// Processes events until every handle has been dropped. In the server
    /// the accept loop keeps a handle for the life of the process.
    pub async fn run(mut self) {
        info!("Dispatcher started");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event).await;
        }

        info!("Dispatcher shutting down");
    }

    /// Process a single event
    async fn handle_event(&mut self, event: RelayEvent<W>) {
        match event {
            RelayEvent::Join(peer) => self.handle_join(peer).await,
            RelayEvent::Chat(event) => self.handle_chat(event).await,
            RelayEvent::Disconnect(event) => self.handle_disconnect(event).await,
        }
    }

    /// Handle a newly accepted peer
    async fn handle_join(&mut self, peer: Peer<W>) {
        let endpoint = peer.endpoint();
        let notice = Notice::Joined(peer.identity().clone());
        info!("{} joined from {}", peer.identity(), endpoint);

        if let Some(stale) = self.registry.insert(peer) {
            debug!("Replaced stale entry for {} at {}", stale.identity(), endpoint);
        }
        debug!("Total peers: {}", self.registry.len());

        self.registry.broadcast(endpoint, &notice.to_string()).await;
    }

    /// Handle a chat line
    ///
    /// Uses the sender carried by the event directly; no registry lookup.
    async fn handle_chat(&mut self, event: ChatEvent) {
        let ChatEvent { sender, text } = event;
        let notice = Notice::Chat {
            from: sender.identity,
            text,
        };
        self.registry
            .broadcast(sender.endpoint, &notice.to_string())
            .await;
    }

    /// Handle peer disconnection
    ///
    /// Idempotent: an endpoint that is no longer registered, or is now
    /// held by a different identity, is ignored.
    async fn handle_disconnect(&mut self, event: DisconnectEvent) {
        let registered = self
            .registry
            .get(&event.endpoint)
            .map(|peer| peer.identity() == &event.identity);
        match registered {
            None => {
                debug!("Ignoring disconnect for unknown endpoint {}", event.endpoint);
                return;
            }
            Some(false) => {
                debug!(
                    "Ignoring stale disconnect of {} at {}",
                    event.identity, event.endpoint
                );
                return;
            }
            Some(true) => {}
        }
        let Some(peer) = self.registry.remove(&event.endpoint) else {
            return;
        };

        info!("{} ({}) left", peer.identity(), event.endpoint);
        debug!("Total peers: {}", self.registry.len());

        let notice = Notice::Left(peer.identity().clone());
        self.registry
            .broadcast(event.endpoint, &notice.to_string())
            .await;
        // Dropping the peer here closes the write half of its transport
    }
}
