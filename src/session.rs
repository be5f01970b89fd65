use crate::engine::Engine;
use crate::error::{Error, Result};

/// Floor for drain read buffers; raised to the engine dictionary size when
/// that is larger, so one read can cover a full dictionary's worth of output.
const READ_BUFFER_FLOOR: usize = 64 * 1024;

/// Feed/drain core shared by both session directions. Input goes into the
/// engine in window-bounded sub-writes; everything the engine can produce is
/// read back out after each one and accumulated until the caller takes it.
pub(crate) struct Session<E> {
    engine: E,
    output: Vec<u8>,
    /// Reusable read buffer, kept at `max(READ_BUFFER_FLOOR, dictionary
    /// size)` so repeated drain passes do not reallocate.
    scratch: Vec<u8>,
}

impl<E: Engine> Session<E> {
    pub(crate) fn new(engine: E) -> Session<E> {
        Session {
            engine,
            output: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Pushes `chunk` into the engine in sub-writes bounded by the engine's
    /// write window, draining after each one. Runs at least one drain pass
    /// even for an empty chunk.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        let mut remaining = chunk;
        loop {
            let window = self.engine.write_window().min(remaining.len());
            if window > 0 {
                let accepted = self.engine.write(&remaining[..window])?;
                if accepted != window {
                    return Err(Error::ShortWrite {
                        offered: window,
                        accepted,
                    });
                }
                remaining = &remaining[accepted..];
            }
            self.drain()?;
            if remaining.is_empty() {
                return Ok(());
            }
        }
    }

    /// Signals end-of-input and drains whatever the engine still holds.
    pub(crate) fn finish(&mut self) -> Result<()> {
        self.engine.finish_input()?;
        self.drain()
    }

    /// Reads engine output until a zero-byte read with an unchanged
    /// consumed-input counter signals exhaustion. A zero-byte read with a
    /// changed counter means the engine advanced without emitting bytes and
    /// wants another read.
    fn drain(&mut self) -> Result<()> {
        loop {
            let free = READ_BUFFER_FLOOR.max(self.engine.dictionary_size());
            if self.scratch.len() < free {
                self.scratch.resize(free, 0);
            }
            let before_in = self.engine.total_in();
            let count = self.engine.read(&mut self.scratch[..free])?;
            if count == 0 {
                if self.engine.total_in() == before_in {
                    return Ok(());
                }
                continue;
            }
            self.output.extend_from_slice(&self.scratch[..count]);
        }
    }

    /// Removes and returns the largest accumulator prefix whose length is a
    /// multiple of `word_size`, preserving the order and content of the rest.
    pub(crate) fn take_aligned(&mut self, word_size: usize) -> Vec<u8> {
        let aligned = self.output.len() / word_size * word_size;
        if aligned == 0 {
            return Vec::new();
        }
        let tail = self.output.split_off(aligned);
        std::mem::replace(&mut self.output, tail)
    }

    /// Removes and returns the whole accumulator.
    pub(crate) fn take_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}
