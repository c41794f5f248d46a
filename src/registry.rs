//! Peer registry and broadcast sender
//!
//! The registry maps endpoint addresses to registered peers. It is owned by
//! the dispatcher task and never shared, so it needs no lock: iteration in
//! `broadcast` can never interleave with an insert or remove.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::time;
use tracing::{debug, warn};

use crate::error::FrameError;
use crate::frame;
use crate::peer::Peer;

/// Set of currently connected peers, keyed by endpoint address
pub struct Registry<W> {
    /// All registered peers: endpoint -> Peer
    peers: HashMap<SocketAddr, Peer<W>>,
    /// Upper bound on a single peer write during a broadcast
    write_timeout: Duration,
}

impl<W> Registry<W> {
    /// Create an empty registry
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            peers: HashMap::new(),
            write_timeout,
        }
    }

    /// Register a peer
    ///
    /// Returns the peer previously registered at the same endpoint, if any.
    pub fn insert(&mut self, peer: Peer<W>) -> Option<Peer<W>> {
        self.peers.insert(peer.endpoint(), peer)
    }

    /// Remove a peer, returning it if it was registered
    pub fn remove(&mut self, endpoint: &SocketAddr) -> Option<Peer<W>> {
        self.peers.remove(endpoint)
    }

    /// Look up a peer by endpoint
    pub fn get(&self, endpoint: &SocketAddr) -> Option<&Peer<W>> {
        self.peers.get(endpoint)
    }

    /// Check if an endpoint is registered
    pub fn contains(&self, endpoint: &SocketAddr) -> bool {
        self.peers.contains_key(endpoint)
    }

    /// Number of registered peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Check if no peers are registered
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<W> Registry<W>
where
    W: AsyncWrite + Unpin,
{
    /// Send `message` to every registered peer except `exclude`
    ///
    /// Best effort: a failed or timed-out write is logged and skipped, and
    /// never removes the peer. Its own reader notices the broken stream.
    /// A cancelled write may have left part of a frame on the stream, so the
    /// peer is poisoned and receives nothing further.
    /// Returns the number of peers the frame was written to.
    pub async fn broadcast(&mut self, exclude: SocketAddr, message: &str) -> usize {
        let frame = match frame::encode(message) {
            Ok(frame) => frame,
            Err(FrameError::EmptyPayload) => {
                debug!("Skipping broadcast of empty message");
                return 0;
            }
            Err(e) => {
                warn!("Cannot broadcast message from {}: {}", exclude, e);
                return 0;
            }
        };

        debug!("Broadcasting '{}' (originated from {})", message, exclude);

        let write_timeout = self.write_timeout;
        let mut delivered = 0;
        for (endpoint, peer) in self.peers.iter_mut() {
            if *endpoint == exclude {
                continue;
            }
            if peer.poisoned {
                debug!("Skipping poisoned peer {} ({})", peer.identity(), endpoint);
                continue;
            }
            match time::timeout(write_timeout, peer.write_frame(&frame)).await {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(e)) => {
                    warn!("Error writing to {} ({}): {}", peer.identity(), endpoint, e);
                }
                Err(_) => {
                    warn!(
                        "Write to {} ({}) timed out after {:?}",
                        peer.identity(),
                        endpoint,
                        write_timeout
                    );
                }
            }

            match time::timeout(write_timeout, peer.poison()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("Shutdown of {} failed: {}", peer.identity(), e),
                Err(_) => debug!("Shutdown of {} timed out", peer.identity()),
            }
        }

        if delivered > 0 {
            debug!("Broadcast sent to {} peers", delivered);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;
    use crate::peer::PeerInfo;
    use crate::types::Identity;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn peer<W>(name: &str, port: u16, writer: W) -> Peer<W> {
        Peer::new(PeerInfo::new(Identity(name.to_string()), addr(port)), writer)
    }

    fn written(registry: &Registry<Vec<u8>>, port: u16) -> Vec<u8> {
        registry.get(&addr(port)).unwrap().writer.clone()
    }

    /// Writer whose every write fails
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            _: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Writer that never accepts any bytes
    struct Stalled;

    impl AsyncWrite for Stalled {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            _: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Pending
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Pending
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Writer with selectable behaviour per peer
    enum TestWriter {
        Buffer(Vec<u8>),
        Broken(BrokenPipe),
        Stalled(Stalled),
    }

    impl AsyncWrite for TestWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            match self.get_mut() {
                TestWriter::Buffer(w) => Pin::new(w).poll_write(cx, buf),
                TestWriter::Broken(w) => Pin::new(w).poll_write(cx, buf),
                TestWriter::Stalled(w) => Pin::new(w).poll_write(cx, buf),
            }
        }

        fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            match self.get_mut() {
                TestWriter::Buffer(w) => Pin::new(w).poll_flush(cx),
                TestWriter::Broken(w) => Pin::new(w).poll_flush(cx),
                TestWriter::Stalled(w) => Pin::new(w).poll_flush(cx),
            }
        }

        fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            match self.get_mut() {
                TestWriter::Buffer(w) => Pin::new(w).poll_shutdown(cx),
                TestWriter::Broken(w) => Pin::new(w).poll_shutdown(cx),
                TestWriter::Stalled(w) => Pin::new(w).poll_shutdown(cx),
            }
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = Registry::new(TIMEOUT);
        assert!(registry.is_empty());

        assert!(registry.insert(peer("user1", 1, Vec::<u8>::new())).is_none());
        assert!(registry.contains(&addr(1)));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(&addr(1)).unwrap();
        assert_eq!(removed.identity().as_str(), "user1");
        assert!(registry.remove(&addr(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_replaces_same_endpoint() {
        let mut registry = Registry::new(TIMEOUT);
        registry.insert(peer("user1", 1, Vec::<u8>::new()));

        let old = registry.insert(peer("user2", 1, Vec::<u8>::new())).unwrap();
        assert_eq!(old.identity().as_str(), "user1");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&addr(1)).unwrap().identity().as_str(), "user2");
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let mut registry = Registry::new(TIMEOUT);
        registry.insert(peer("a", 1, Vec::new()));
        registry.insert(peer("b", 2, Vec::new()));
        registry.insert(peer("c", 3, Vec::new()));

        let delivered = registry.broadcast(addr(1), "a: hi").await;
        assert_eq!(delivered, 2);

        let expected = frame::encode("a: hi").unwrap();
        assert!(written(&registry, 1).is_empty());
        assert_eq!(written(&registry, 2), expected);
        assert_eq!(written(&registry, 3), expected);
    }

    #[tokio::test]
    async fn test_broadcast_from_unregistered_sender_reaches_everyone() {
        let mut registry = Registry::new(TIMEOUT);
        registry.insert(peer("a", 1, Vec::<u8>::new()));
        registry.insert(peer("b", 2, Vec::<u8>::new()));

        assert_eq!(registry.broadcast(addr(9), "x left the room").await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_skips_failed_writes() {
        let mut registry = Registry::new(TIMEOUT);
        registry.insert(peer("a", 1, TestWriter::Buffer(Vec::new())));
        registry.insert(peer("b", 2, TestWriter::Broken(BrokenPipe)));
        registry.insert(peer("c", 3, TestWriter::Buffer(Vec::new())));

        let delivered = registry.broadcast(addr(1), "a: hi").await;
        assert_eq!(delivered, 1);

        // Failed peers stay registered; their readers report the disconnect
        assert_eq!(registry.len(), 3);
        match &registry.get(&addr(3)).unwrap().writer {
            TestWriter::Buffer(buf) => assert_eq!(*buf, frame::encode("a: hi").unwrap()),
            _ => panic!("expected buffer writer"),
        }

        assert!(registry.get(&addr(2)).unwrap().poisoned);
        assert_eq!(registry.broadcast(addr(1), "a: again").await, 1);
    }

    #[tokio::test]
    async fn test_timed_out_write_never_splices_frames() {
        let mut registry = Registry::new(Duration::from_millis(50));
        let (server_end, mut client_end) = tokio::io::duplex(8);
        registry.insert(peer("a", 1, server_end));

        // 20-byte frame into an 8-byte pipe nobody drains: times out midway
        assert_eq!(registry.broadcast(addr(2), "b: first message").await, 0);
        assert!(registry.get(&addr(1)).unwrap().poisoned);

        assert_eq!(registry.broadcast(addr(2), "b: second message here").await, 0);

        // The client sees a truncated frame and end-of-stream, never a
        // header followed by bytes of another frame
        let result = frame::read_frame(&mut client_end).await;
        assert!(matches!(result, Err(FrameError::Io(_))));
    }

    #[tokio::test]
    async fn test_broadcast_bounds_slow_writes() {
        let mut registry = Registry::new(Duration::from_millis(50));
        registry.insert(peer("a", 1, TestWriter::Stalled(Stalled)));
        registry.insert(peer("b", 2, TestWriter::Buffer(Vec::new())));

        let delivered = registry.broadcast(addr(3), "hello").await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_broadcast_rejects_unframeable_message() {
        let mut registry = Registry::new(TIMEOUT);
        registry.insert(peer("a", 1, Vec::new()));

        assert_eq!(registry.broadcast(addr(2), "").await, 0);
        let huge = "x".repeat(frame::MAX_MESSAGE_SIZE + 1);
        assert_eq!(registry.broadcast(addr(2), &huge).await, 0);
        assert!(written(&registry, 1).is_empty());
    }
}
