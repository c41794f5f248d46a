//! Connection reader
//!
//! One task per accepted connection: decode frames from the peer's read
//! half and forward chat lines to the dispatcher. Whatever ends the loop,
//! the dispatcher is told exactly once that the peer is gone.

use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::error::AppError;
use crate::frame;
use crate::message::ChatEvent;
use crate::peer::PeerInfo;
use crate::server::DispatcherHandle;

/// Handle one peer's inbound stream
///
/// Returns `Ok(())` when the peer closed the stream normally. A protocol
/// violation (oversize frame) or transport error is returned as `Err`;
/// either way the disconnect has already been reported and `reader`
/// released by the time this returns.
pub async fn handle_connection<R, W>(
    mut reader: R,
    peer: PeerInfo,
    handle: DispatcherHandle<W>,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    debug!("Reader started for {} ({})", peer.identity, peer.endpoint);

    let result = read_loop(&mut reader, &peer, &handle).await;

    if handle.disconnect(peer.clone()).await.is_err() {
        debug!("Dispatcher closed before disconnect of {}", peer.identity);
    }
    drop(reader);

    if result.is_ok() {
        info!("{} ({}) closed the connection", peer.identity, peer.endpoint);
    }
    result
}

/// Read frames until end-of-stream or a fatal error
async fn read_loop<R, W>(
    reader: &mut R,
    peer: &PeerInfo,
    handle: &DispatcherHandle<W>,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    while let Some(body) = frame::read_frame(reader).await? {
        if body.is_empty() {
            debug!("{} sent a zero-length frame, ignoring", peer.identity);
            continue;
        }

        let text = String::from_utf8_lossy(&body);
        let text = text.trim();
        if text.is_empty() {
            debug!("{} sent a blank message, ignoring", peer.identity);
            continue;
        }

        debug!("Received '{}' from {}", text, peer.identity);
        handle
            .chat(ChatEvent {
                sender: peer.clone(),
                text: text.to_string(),
            })
            .await?;
    }
    Ok(())
}
