use byteorder::{ByteOrder, LittleEndian};
use xz2::stream::{Action, LzmaOptions, Status, Stream};

use crate::engine::{Engine, EngineError};

/// How many input bytes an engine stages before asking the caller to drain.
const INPUT_WINDOW: usize = 64 * 1024;

/// Dictionary sizes above this are rejected when parsing stream headers, so a
/// corrupt header cannot drive read-buffer sizing to absurd values.
const MAX_HEADER_DICTIONARY_SIZE: u32 = 1 << 29;

impl From<xz2::stream::Error> for EngineError {
    fn from(error: xz2::stream::Error) -> EngineError {
        EngineError::new(error.to_string())
    }
}

fn new_decode_stream() -> Result<Stream, EngineError> {
    Stream::new_lzma_decoder(u64::MAX).map_err(EngineError::from)
}

fn new_encode_stream(dictionary_size: u32, match_len_limit: u32) -> Result<Stream, EngineError> {
    let mut options = LzmaOptions::new_preset(6).map_err(EngineError::from)?;
    options.dict_size(dictionary_size);
    options.nice_len(match_len_limit);
    Stream::new_lzma_encoder(&options).map_err(EngineError::from)
}

/// Streaming LZMA decompression engine over liblzma.
///
/// Decodes LZMA_alone streams. Concatenated streams decode as one: when a
/// member ends and more input follows, a fresh liblzma stream picks up the
/// next member, and the consumed-input counter keeps counting across the
/// boundary.
pub struct LzmaDecompressor {
    stream: Stream,
    pending: Vec<u8>,
    dictionary_size: usize,
    header_parsed: bool,
    base_in: u64,
    finishing: bool,
    between_members: bool,
    eof: bool,
}

impl LzmaDecompressor {
    pub fn new() -> Result<LzmaDecompressor, EngineError> {
        Ok(LzmaDecompressor {
            stream: new_decode_stream()?,
            pending: Vec::new(),
            dictionary_size: 0,
            header_parsed: false,
            base_in: 0,
            finishing: false,
            between_members: false,
            eof: false,
        })
    }

    /// True once the current member has consumed input, meaning a stream that
    /// stops here ends mid-member.
    fn mid_member(&self) -> bool {
        self.stream.total_in() > 0 || !self.pending.is_empty()
    }
}

impl Engine for LzmaDecompressor {
    fn write_window(&self) -> usize {
        INPUT_WINDOW.saturating_sub(self.pending.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EngineError> {
        let accepted = data.len().min(self.write_window());
        self.pending.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn finish_input(&mut self) -> Result<(), EngineError> {
        self.finishing = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EngineError> {
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        if self.between_members {
            if self.pending.is_empty() {
                if self.finishing {
                    self.eof = true;
                }
                return Ok(0);
            }
            log::debug!("member boundary, restarting the decode stream");
            self.base_in += self.stream.total_in();
            self.stream = new_decode_stream()?;
            self.header_parsed = false;
            self.between_members = false;
        }
        if !self.header_parsed && self.pending.len() >= 5 {
            // LZMA_alone header: 1 properties byte, 4 bytes dictionary size,
            // 8 bytes uncompressed size.
            let dictionary_size = LittleEndian::read_u32(&self.pending[1..5]);
            if dictionary_size <= MAX_HEADER_DICTIONARY_SIZE {
                self.dictionary_size = dictionary_size as usize;
            }
            self.header_parsed = true;
        }
        let action = if self.finishing {
            Action::Finish
        } else {
            Action::Run
        };
        let before_in = self.stream.total_in();
        let before_out = self.stream.total_out();
        let status = self.stream.process(&self.pending, buf, action)?;
        let consumed = (self.stream.total_in() - before_in) as usize;
        if consumed > 0 {
            self.pending.drain(..consumed);
        }
        let produced = (self.stream.total_out() - before_out) as usize;
        if matches!(status, Status::StreamEnd) {
            self.between_members = true;
            if self.finishing && self.pending.is_empty() {
                self.eof = true;
            }
        } else if self.finishing && consumed == 0 && produced == 0 && self.mid_member() {
            return Err(EngineError::new("unexpected end of input"));
        }
        Ok(produced)
    }

    fn total_in(&self) -> u64 {
        self.base_in + self.stream.total_in()
    }

    fn dictionary_size(&self) -> usize {
        self.dictionary_size
    }
}

/// Streaming LZMA compression engine over liblzma.
///
/// Produces LZMA_alone streams. Once the compressed bytes of the current
/// member reach `member_size`, the member is closed and a new one started, so
/// no single member grows beyond the limit by more than one read.
pub struct LzmaCompressor {
    stream: Stream,
    dictionary_size: u32,
    match_len_limit: u32,
    member_size: u64,
    pending: Vec<u8>,
    base_in: u64,
    finishing: bool,
    /// Closing the current member at the size limit; input already written
    /// stays staged for the next member.
    rolling: bool,
    between_members: bool,
    eof: bool,
}

impl LzmaCompressor {
    pub fn new(
        dictionary_size: u32,
        match_len_limit: u32,
        member_size: u64,
    ) -> Result<LzmaCompressor, EngineError> {
        Ok(LzmaCompressor {
            stream: new_encode_stream(dictionary_size, match_len_limit)?,
            dictionary_size,
            match_len_limit,
            member_size,
            pending: Vec::new(),
            base_in: 0,
            finishing: false,
            rolling: false,
            between_members: false,
            eof: false,
        })
    }
}

impl Engine for LzmaCompressor {
    fn write_window(&self) -> usize {
        INPUT_WINDOW.saturating_sub(self.pending.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EngineError> {
        let accepted = data.len().min(self.write_window());
        self.pending.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn finish_input(&mut self) -> Result<(), EngineError> {
        self.finishing = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EngineError> {
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        if self.between_members {
            if self.pending.is_empty() {
                if self.finishing {
                    self.eof = true;
                }
                return Ok(0);
            }
            log::debug!("member size limit reached, starting a new member");
            self.base_in += self.stream.total_in();
            self.stream = new_encode_stream(self.dictionary_size, self.match_len_limit)?;
            self.rolling = false;
            self.between_members = false;
        }
        let action = if self.finishing || self.rolling {
            Action::Finish
        } else {
            Action::Run
        };
        let input: &[u8] = if self.rolling { &[] } else { &self.pending };
        let before_in = self.stream.total_in();
        let before_out = self.stream.total_out();
        let status = self.stream.process(input, buf, action)?;
        let consumed = (self.stream.total_in() - before_in) as usize;
        if consumed > 0 {
            self.pending.drain(..consumed);
        }
        let produced = (self.stream.total_out() - before_out) as usize;
        if matches!(status, Status::StreamEnd) {
            if self.finishing && self.pending.is_empty() {
                self.eof = true;
            } else {
                self.between_members = true;
            }
        } else if !self.rolling && !self.finishing && self.stream.total_out() >= self.member_size {
            self.rolling = true;
        }
        Ok(produced)
    }

    fn total_in(&self) -> u64 {
        self.base_in + self.stream.total_in()
    }

    fn dictionary_size(&self) -> usize {
        self.dictionary_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(engine: &mut dyn Engine, out: &mut Vec<u8>) {
        let mut buf = vec![0u8; INPUT_WINDOW];
        loop {
            let before = engine.total_in();
            let count = engine.read(&mut buf).unwrap();
            if count == 0 {
                if engine.total_in() == before {
                    break;
                }
                continue;
            }
            out.extend_from_slice(&buf[..count]);
        }
    }

    #[test]
    fn engine_level_round_trip() {
        let data = b"hello world hello world hello world hello world";

        let mut compressor = LzmaCompressor::new(1 << 20, 36, 1 << 51).unwrap();
        let mut compressed = Vec::new();
        let written = compressor.write(data).unwrap();
        assert_eq!(written, data.len());
        compressor.finish_input().unwrap();
        drain(&mut compressor, &mut compressed);
        assert!(!compressed.is_empty());

        let mut decompressor = LzmaDecompressor::new().unwrap();
        let mut decompressed = Vec::new();
        let written = decompressor.write(&compressed).unwrap();
        assert_eq!(written, compressed.len());
        decompressor.finish_input().unwrap();
        drain(&mut decompressor, &mut decompressed);
        assert_eq!(decompressed, data);
    }

    #[test]
    fn decode_engine_reports_header_dictionary_size() {
        let dictionary_size = 1 << 21;
        let mut compressor = LzmaCompressor::new(dictionary_size, 36, 1 << 51).unwrap();
        let mut compressed = Vec::new();
        compressor.write(b"payload").unwrap();
        compressor.finish_input().unwrap();
        drain(&mut compressor, &mut compressed);

        let mut decompressor = LzmaDecompressor::new().unwrap();
        assert_eq!(decompressor.dictionary_size(), 0);
        decompressor.write(&compressed).unwrap();
        let mut decompressed = Vec::new();
        decompressor.finish_input().unwrap();
        drain(&mut decompressor, &mut decompressed);
        assert_eq!(decompressor.dictionary_size(), dictionary_size as usize);
        assert_eq!(decompressed, b"payload");
    }

    #[test]
    fn write_respects_the_window() {
        let mut compressor = LzmaCompressor::new(1 << 20, 36, 1 << 51).unwrap();
        let oversized = vec![0u8; INPUT_WINDOW + 1];
        let accepted = compressor.write(&oversized).unwrap();
        assert_eq!(accepted, INPUT_WINDOW);
        assert_eq!(compressor.write_window(), 0);
    }
}
