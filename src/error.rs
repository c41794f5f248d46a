//! Error types for the chat relay
//!
//! Defines framing errors and application-level errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Framing errors
///
/// `EmptyPayload` is a validation no-op (nothing to send), while
/// `PayloadTooLarge` is fatal to the connection that produced it.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Payload is empty after trimming, nothing to send
    #[error("Empty payload")]
    EmptyPayload,

    /// Declared or actual payload length exceeds the maximum frame size
    #[error("Payload of {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// IO error while reading or writing a frame
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application-level errors
///
/// All of these are fatal to the task that hits them, never to the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Framing error (protocol violation or transport failure)
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - dispatcher is gone)
    #[error("Dispatcher channel closed")]
    ChannelSend,
}
