use thiserror::Error;

/// Errors that can occur while reading wire data.
#[derive(Error, Debug)]
pub enum BinaryError {
    /// Not enough bytes remaining in the buffer for the requested read.
    #[error("not enough bytes in buffer: needed {needed}, remaining {remaining}")]
    UnexpectedEof { needed: usize, remaining: usize },
}

/// Result type alias for binary operations.
pub type Result<T> = std::result::Result<T, BinaryError>;
