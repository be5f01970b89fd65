//! Incremental LZMA compression and decompression sessions.
//!
//! The sessions accept input in chunks of any size and drain the underlying
//! liblzma stream completely on every call, so output never lags behind by
//! more than the engine's own pipeline. Decoded output can be released in
//! multiples of a caller-chosen word size, which keeps fixed-width records
//! intact across chunk boundaries; the remainder that never formed a whole
//! word is handed back by [`Decoder::finish`].

pub mod engine;

mod decoder;
mod encoder;
mod error;
mod session;

pub use decoder::{
    decompress_buffer, decompress_file, decompress_reader, Decoder, DEFAULT_CHUNK_SIZE,
    DEFAULT_WORD_SIZE,
};
pub use encoder::{
    compress_buffer, compress_file, Encoder, EncoderOptions, FileEncoder, DEFAULT_LEVEL,
};
pub use error::{Error, Result};
