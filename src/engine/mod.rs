use thiserror::Error;

pub mod lzma;

/// Failure reported by a compression engine, carrying the engine's own error
/// message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> EngineError {
        EngineError {
            message: message.into(),
        }
    }
}

/// Push/pull boundary of a compression or decompression engine.
///
/// Input is pushed with [`write`](Engine::write) in slices bounded by
/// [`write_window`](Engine::write_window); output is pulled with
/// [`read`](Engine::read). An engine may buffer data internally and emit it
/// lazily relative to its input, so a zero-byte read is ambiguous on its own:
/// compare [`total_in`](Engine::total_in) before and after the read to tell
/// "exhausted for now" (counter unchanged) from "advanced internally, read
/// again" (counter changed).
pub trait Engine {
    /// Max number of bytes the engine accepts right now.
    fn write_window(&self) -> usize;

    /// Pushes input bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, EngineError>;

    /// Signals that no more input will be written.
    fn finish_input(&mut self) -> Result<(), EngineError>;

    /// Pulls produced bytes into `buf`, returning the count.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EngineError>;

    /// Total input bytes consumed internally, monotonic across the whole
    /// stream including member boundaries.
    fn total_in(&self) -> u64;

    /// Dictionary size in bytes if known, 0 otherwise. Used to size read
    /// buffers so that a large dictionary does not force one read call per
    /// buffer growth step.
    fn dictionary_size(&self) -> usize;
}
