use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::engine::lzma::LzmaDecompressor;
use crate::error::{Error, Result};
use crate::session::Session;

/// Word size used by [`Decoder::new`]: output is released byte by byte.
pub const DEFAULT_WORD_SIZE: usize = 1;

/// Read chunk size used by the reader and file helpers.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

/// Streaming decompression session.
///
/// Compressed bytes go in through [`decompress`](Decoder::decompress) in
/// chunks of any size; decompressed bytes come out in multiples of the
/// configured word size, so fixed-width records stay intact across chunk
/// boundaries. [`finish`](Decoder::finish) returns the final aligned output
/// together with the remainder that did not form a complete word.
pub struct Decoder {
    session: Option<Session<LzmaDecompressor>>,
    word_size: usize,
}

impl Decoder {
    /// Creates a decoder that releases output byte by byte.
    pub fn new() -> Result<Decoder> {
        Decoder::with_word_size(DEFAULT_WORD_SIZE)
    }

    /// Creates a decoder that releases output only in multiples of
    /// `word_size` bytes.
    pub fn with_word_size(word_size: usize) -> Result<Decoder> {
        if word_size == 0 {
            return Err(Error::InvalidParameter(
                "word_size cannot be zero".to_owned(),
            ));
        }
        Ok(Decoder {
            session: Some(Session::new(LzmaDecompressor::new()?)),
            word_size,
        })
    }

    /// Feeds a chunk of compressed bytes and returns the decompressed bytes
    /// available so far, truncated to a multiple of the word size. An empty
    /// chunk is legal and still drains the engine.
    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let session = self
            .session
            .as_mut()
            .ok_or(Error::Finished("decompress"))?;
        session.feed(chunk)?;
        Ok(session.take_aligned(self.word_size))
    }

    /// Signals the end of the compressed stream, drains the engine, and
    /// releases it. Returns the final word-aligned output and the remainder
    /// (always shorter than one word).
    pub fn finish(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut session = self.session.take().ok_or(Error::Finished("finish"))?;
        session.finish()?;
        let aligned = session.take_aligned(self.word_size);
        Ok((aligned, session.take_all()))
    }
}

/// Decompresses everything `reader` yields, failing with
/// [`Error::TrailingBytes`] if the total decoded size is not a multiple of
/// `word_size`.
pub fn decompress_reader<R: Read>(mut reader: R, word_size: usize) -> Result<Vec<u8>> {
    let mut decoder = Decoder::with_word_size(word_size)?;
    let mut chunk = vec![0u8; DEFAULT_CHUNK_SIZE];
    let mut decoded = Vec::new();
    loop {
        let count = reader.read(&mut chunk)?;
        if count == 0 {
            break;
        }
        decoded.extend_from_slice(&decoder.decompress(&chunk[..count])?);
    }
    let (aligned, remainder) = decoder.finish()?;
    decoded.extend_from_slice(&aligned);
    if !remainder.is_empty() {
        return Err(Error::TrailingBytes {
            word_size,
            remainder,
        });
    }
    Ok(decoded)
}

/// Decompresses the file at `path`.
pub fn decompress_file<P: AsRef<Path>>(path: P, word_size: usize) -> Result<Vec<u8>> {
    decompress_reader(BufReader::new(File::open(path)?), word_size)
}

/// Decompresses a complete in-memory buffer.
pub fn decompress_buffer(buffer: &[u8], word_size: usize) -> Result<Vec<u8>> {
    decompress_reader(buffer, word_size)
}
