//! Accept loop
//!
//! Wires the relay together: starts the dispatcher, then for every accepted
//! connection assigns an identity, registers the peer and spawns its reader.

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::peer::{Peer, PeerInfo};
use crate::server::Dispatcher;
use crate::types::IdentityGenerator;

/// Serve chat peers on `listener`
///
/// Runs until the dispatcher goes away, which does not happen in normal
/// operation. Accept errors are logged and the loop keeps going.
pub async fn serve(listener: TcpListener, config: &ServerConfig) -> Result<(), AppError> {
    let (dispatcher, handle) =
        Dispatcher::<OwnedWriteHalf>::new(config.queue_capacity, config.write_timeout());
    tokio::spawn(dispatcher.run());

    let mut identities = IdentityGenerator::new();

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let info = PeerInfo::new(identities.next_identity(), addr);
        info!("New connection from {} as {}", addr, info.identity);

        let (read_half, write_half) = stream.into_split();

        // Queued before the reader exists, so the join precedes its messages
        if let Err(e) = handle.join(Peer::new(info.clone(), write_half)).await {
            error!("Failed to register {}: {}", info.identity, e);
            return Err(e);
        }

        let handle = handle.clone();
        tokio::spawn(async move {
            let identity = info.identity.clone();
            if let Err(e) = handle_connection(read_half, info, handle).await {
                warn!("Connection of {} closed: {}", identity, e);
            }
        });
    }
}
