use crate::engine::EngineError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by compression and decompression sessions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A construction parameter was out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A session method was called after `finish`.
    #[error("{0} cannot be called after finish")]
    Finished(&'static str),

    /// The engine accepted fewer bytes than it was offered. The engine is
    /// expected to consume every byte that fits in its write window, so this
    /// indicates an engine bug rather than bad input data.
    #[error("the compression engine consumed {accepted} of {offered} bytes")]
    ShortWrite { offered: usize, accepted: usize },

    /// The engine reported a failure, anything from a failed allocation to
    /// malformed compressed data. The message carries the engine's own
    /// description.
    #[error("lzma error: {0}")]
    Engine(#[from] EngineError),

    /// The total decoded size is not a multiple of the configured word size.
    /// Raised by the buffer, reader, and file helpers; session-level callers
    /// receive the remainder from [`Decoder::finish`](crate::Decoder::finish)
    /// instead.
    #[error(
        "the total number of bytes is not a multiple of {} ({} remaining)",
        .word_size,
        .remainder.len()
    )]
    TrailingBytes { word_size: usize, remainder: Vec<u8> },

    /// File or stream I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
