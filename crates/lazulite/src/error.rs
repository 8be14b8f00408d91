// crates/lazulite/src/error.rs
use lazulite_binary::BinaryError;
use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `recv` or `peek` found nothing queued for delivery.
    #[error("receive queue is empty")]
    RecvQueueEmpty,

    /// The message at the head of the receive queue is still missing
    /// fragments.
    #[error("head message incomplete, waiting for more fragments")]
    FragmentIncomplete,

    /// The caller's buffer cannot hold the next message.
    #[error("buffer too small: message is {needed} bytes, buffer holds {given}")]
    BufferTooSmall { needed: usize, given: usize },

    /// `send` would fragment the message into more pieces than the receive
    /// window can ever hold.
    #[error("message needs {fragments} fragments, limit is {limit}")]
    MessageTooLarge { fragments: usize, limit: usize },

    /// Input datagram shorter than a single segment header.
    #[error("input of {size} bytes is shorter than a segment header ({overhead})")]
    InputTooShort { size: usize, overhead: usize },

    /// Segment tagged with a conversation id this session does not own.
    #[error("conversation mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ConvMismatch { expected: u32, actual: u32 },

    /// Declared payload length runs past the end of the datagram.
    #[error("payload truncated: declared {declared} bytes, {remaining} remaining")]
    PayloadTruncated { declared: usize, remaining: usize },

    /// Unknown command byte in a segment header.
    #[error("unknown command: {0}")]
    UnknownCommand(u8),

    /// Requested MTU is smaller than the header overhead allows.
    #[error("invalid mtu: {0}")]
    InvalidMtu(usize),

    /// Malformed wire data.
    #[error("codec error: {0}")]
    Binary(#[from] BinaryError),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
