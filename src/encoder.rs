use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::lzma::LzmaCompressor;
use crate::error::{Error, Result};
use crate::session::Session;

/// Compression level used by [`Encoder::new`] and
/// [`EncoderOptions::default`].
pub const DEFAULT_LEVEL: u32 = 6;

const MIN_DICTIONARY_SIZE: u32 = 1 << 12;
const MAX_DICTIONARY_SIZE: u32 = 1 << 29;
const MIN_MATCH_LEN_LIMIT: u32 = 5;
const MAX_MATCH_LEN_LIMIT: u32 = 273;
const MIN_MEMBER_SIZE: u64 = 100_000;
const MAX_MEMBER_SIZE: u64 = 1 << 51;

/// (dictionary_size, match_len_limit) presets for levels 0 to 9.
const LEVELS: [(u32, u32); 10] = [
    (65535, 16),
    (1 << 20, 5),
    (3 << 19, 6),
    (1 << 21, 8),
    (3 << 20, 12),
    (1 << 22, 20),
    (1 << 23, 36),
    (1 << 24, 68),
    (3 << 23, 132),
    (1 << 25, 273),
];

/// Tuning parameters for the compression engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOptions {
    dictionary_size: u32,
    match_len_limit: u32,
    member_size: u64,
}

impl Default for EncoderOptions {
    fn default() -> EncoderOptions {
        EncoderOptions {
            dictionary_size: 1 << 23,
            match_len_limit: 36,
            member_size: 1 << 51,
        }
    }
}

impl EncoderOptions {
    /// Looks up the preset for a compression level between 0 (fast) and 9
    /// (best).
    pub fn level(level: u32) -> Result<EncoderOptions> {
        let Some(&(dictionary_size, match_len_limit)) = LEVELS.get(level as usize) else {
            return Err(Error::InvalidParameter(format!(
                "level must be between 0 and 9, got {level}"
            )));
        };
        Ok(EncoderOptions {
            dictionary_size,
            match_len_limit,
            ..EncoderOptions::default()
        })
    }

    /// Sets the dictionary size in bytes; valid range [4 KiB, 512 MiB).
    pub fn dictionary_size(mut self, dictionary_size: u32) -> EncoderOptions {
        self.dictionary_size = dictionary_size;
        self
    }

    /// Sets the match length limit; valid range [5, 273].
    pub fn match_len_limit(mut self, match_len_limit: u32) -> EncoderOptions {
        self.match_len_limit = match_len_limit;
        self
    }

    /// Sets the compressed size at which a member is closed and a new one
    /// started; valid range [100 000, 2^51].
    pub fn member_size(mut self, member_size: u64) -> EncoderOptions {
        self.member_size = member_size;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_DICTIONARY_SIZE..MAX_DICTIONARY_SIZE).contains(&self.dictionary_size) {
            return Err(Error::InvalidParameter(format!(
                "dictionary size must be in [{MIN_DICTIONARY_SIZE}, {MAX_DICTIONARY_SIZE}), got {}",
                self.dictionary_size
            )));
        }
        if !(MIN_MATCH_LEN_LIMIT..=MAX_MATCH_LEN_LIMIT).contains(&self.match_len_limit) {
            return Err(Error::InvalidParameter(format!(
                "match length limit must be in [{MIN_MATCH_LEN_LIMIT}, {MAX_MATCH_LEN_LIMIT}], got {}",
                self.match_len_limit
            )));
        }
        if !(MIN_MEMBER_SIZE..=MAX_MEMBER_SIZE).contains(&self.member_size) {
            return Err(Error::InvalidParameter(format!(
                "member size must be in [{MIN_MEMBER_SIZE}, {MAX_MEMBER_SIZE}], got {}",
                self.member_size
            )));
        }
        Ok(())
    }
}

/// Streaming compression session.
///
/// Raw bytes go in through [`compress`](Encoder::compress) in chunks of any
/// size; whatever compressed bytes the engine produces come out immediately.
/// [`finish`](Encoder::finish) flushes the final member and returns the
/// compressed tail.
pub struct Encoder {
    session: Option<Session<LzmaCompressor>>,
}

impl Encoder {
    /// Creates an encoder with the default options (level 6).
    pub fn new() -> Result<Encoder> {
        Encoder::with_options(EncoderOptions::default())
    }

    /// Creates an encoder with explicit tuning parameters.
    pub fn with_options(options: EncoderOptions) -> Result<Encoder> {
        options.validate()?;
        let engine = LzmaCompressor::new(
            options.dictionary_size,
            options.match_len_limit,
            options.member_size,
        )?;
        Ok(Encoder {
            session: Some(Session::new(engine)),
        })
    }

    /// Feeds a chunk of raw bytes and returns the compressed bytes the
    /// engine produced for it, possibly none.
    pub fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let session = self.session.as_mut().ok_or(Error::Finished("compress"))?;
        session.feed(chunk)?;
        Ok(session.take_all())
    }

    /// Signals the end of the input, drains the engine, and releases it.
    /// Returns the compressed tail.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let mut session = self.session.take().ok_or(Error::Finished("finish"))?;
        session.finish()?;
        Ok(session.take_all())
    }
}

/// Compresses a complete in-memory buffer.
pub fn compress_buffer(buffer: &[u8], options: EncoderOptions) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_options(options)?;
    let bound = unsafe { lzma_sys::lzma_stream_buffer_bound(buffer.len()) };
    let mut compressed = Vec::with_capacity(bound);
    compressed.extend_from_slice(&encoder.compress(buffer)?);
    compressed.extend_from_slice(&encoder.finish()?);
    Ok(compressed)
}

/// Compression session that writes its output to a file as it goes.
pub struct FileEncoder {
    encoder: Encoder,
    output: BufWriter<File>,
}

impl FileEncoder {
    /// Creates `path` and prepares an encoder writing to it.
    pub fn create<P: AsRef<Path>>(path: P, options: EncoderOptions) -> Result<FileEncoder> {
        Ok(FileEncoder {
            encoder: Encoder::with_options(options)?,
            output: BufWriter::new(File::create(path)?),
        })
    }

    /// Compresses a chunk and writes the produced bytes to the file.
    pub fn compress(&mut self, chunk: &[u8]) -> Result<()> {
        let compressed = self.encoder.compress(chunk)?;
        self.output.write_all(&compressed)?;
        Ok(())
    }

    /// Flushes the compressed tail and the file.
    pub fn finish(mut self) -> Result<()> {
        let tail = self.encoder.finish()?;
        self.output.write_all(&tail)?;
        self.output.flush()?;
        Ok(())
    }
}

/// Compresses `buffer` into a new file at `path`.
pub fn compress_file<P: AsRef<Path>>(path: P, buffer: &[u8], options: EncoderOptions) -> Result<()> {
    let mut encoder = FileEncoder::create(path, options)?;
    encoder.compress(buffer)?;
    encoder.finish()
}
