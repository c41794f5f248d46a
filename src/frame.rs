//! Length-prefixed framing
//!
//! Every message on the stream is `[u32 big-endian length][length bytes of UTF-8]`.
//! Both directions share one validation policy: a zero length means
//! "nothing" and is skipped, a length above [`MAX_MESSAGE_SIZE`] is fatal.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Maximum payload size in bytes
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Size of the length prefix in bytes
pub const HEADER_LEN: usize = 4;

/// Encode a text payload into a frame
///
/// Returns `EmptyPayload` when the text is blank (callers treat this as
/// "nothing to send") and `PayloadTooLarge` when it does not fit in a frame.
/// The payload itself is written as given, untrimmed.
pub fn encode(text: &str) -> Result<Vec<u8>, FrameError> {
    if text.trim().is_empty() {
        return Err(FrameError::EmptyPayload);
    }

    let payload = text.as_bytes();
    check_length(payload.len())?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Interpret a 4-byte header as a big-endian payload length
pub fn decode_header(header: [u8; HEADER_LEN]) -> u32 {
    u32::from_be_bytes(header)
}

fn check_length(len: usize) -> Result<(), FrameError> {
    if len > MAX_MESSAGE_SIZE {
        return Err(FrameError::PayloadTooLarge {
            len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

/// Read one frame from the stream
///
/// - `Ok(None)`: the stream ended before a header could be read
/// - `Ok(Some(body))`: one frame; `body` is empty for a zero-length frame,
///   in which case no body read is attempted
/// - `Err(PayloadTooLarge)`: declared length over the maximum; no body bytes
///   are consumed and the stream can no longer be trusted
/// - `Err(Io)`: transport failure, including end-of-stream mid-body
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    if let Err(e) = reader.read_exact(&mut header).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(e.into());
    }

    let len = decode_header(header) as usize;
    if len == 0 {
        return Ok(Some(Vec::new()));
    }
    check_length(len)?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Encode `text` and write the whole frame to `writer`
pub async fn write_frame<W>(writer: &mut W, text: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(text)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
