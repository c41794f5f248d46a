//! Interactive line client
//!
//! Reads lines from stdin and sends each as one frame; prints every frame
//! received from the server as `> <text>`.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{AppError, FrameError};
use crate::frame;

/// Send one line of user input
///
/// Returns `Ok(false)` when the line is blank and nothing was sent.
pub async fn send_line<W>(writer: &mut W, line: &str) -> Result<bool, FrameError>
where
    W: AsyncWrite + Unpin,
{
    match frame::write_frame(writer, line.trim()).await {
        Ok(()) => Ok(true),
        Err(FrameError::EmptyPayload) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy frames from the server to `out` until the stream ends
///
/// Applies the server's validation policy: zero-length and blank frames are
/// skipped, an oversize frame ends the stream with an error.
pub async fn relay_incoming<R, O>(reader: &mut R, out: &mut O) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    while let Some(body) = frame::read_frame(reader).await? {
        let text = String::from_utf8_lossy(&body);
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty message from server");
            continue;
        }
        out.write_all(format!("> {}\n", text).as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

/// Run an interactive session against the server at `config.addr`
///
/// Ends on stdin EOF, when the server closes the connection, or when a
/// send fails.
pub async fn run(config: &ClientConfig) -> Result<(), AppError> {
    info!("Attempting to connect to {}...", config.addr);
    let stream = TcpStream::connect(&config.addr).await?;
    info!("Connection established to {}", config.addr);

    let (mut read_half, mut write_half) = stream.into_split();

    let mut incoming = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        match relay_incoming(&mut read_half, &mut stdout).await {
            Ok(()) => info!("Server closed the connection"),
            Err(e) => warn!("Stopped reading from server: {}", e),
        }
    });

    info!("Enter messages to send (Ctrl+D to exit):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match send_line(&mut write_half, &line).await {
                    Ok(_) => {}
                    Err(e @ FrameError::PayloadTooLarge { .. }) => {
                        warn!("Message not sent: {}", e);
                    }
                    Err(e) => {
                        error!("Error sending message: {}", e);
                        break;
                    }
                }
            }
            _ = &mut incoming => {
                break;
            }
        }
    }

    info!("Client exiting");
    if let Err(e) = write_half.shutdown().await {
        debug!("Shutdown after session end failed: {}", e);
    }
    incoming.abort();
    Ok(())
}
