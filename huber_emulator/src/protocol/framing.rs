//! Byte stream to command line framing.

use crate::error::ProtocolError;
use heapless::Vec;
use huber_common::consts::{IN_TERMINATOR, MAX_COMMAND_LEN};

/// Assembles `\r`-terminated command lines from a byte stream.
///
/// The buffer has a fixed capacity. A line that does not fit is discarded up
/// to its terminator and reported as [`ProtocolError::LineTooLong`]. Line
/// feeds are dropped so clients terminating with `\r\n` still work.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8, MAX_COMMAND_LEN>,
    overflowed: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns a line (or framing error) when a terminator
    /// completes it; empty lines are skipped.
    pub fn push(&mut self, byte: u8) -> Option<Result<String, ProtocolError>> {
        match byte {
            IN_TERMINATOR => self.take_line(),
            b'\n' => None,
            _ => {
                if !self.overflowed && self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Feed a chunk, collecting every completed line.
    pub fn extend(&mut self, bytes: &[u8]) -> std::vec::Vec<Result<String, ProtocolError>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    fn take_line(&mut self) -> Option<Result<String, ProtocolError>> {
        let result = if self.overflowed {
            Some(Err(ProtocolError::LineTooLong {
                limit: MAX_COMMAND_LEN,
            }))
        } else if self.buffer.is_empty() {
            None
        } else {
            Some(
                std::str::from_utf8(&self.buffer)
                    .map(str::to_string)
                    .map_err(|_| ProtocolError::InvalidEncoding),
            )
        };
        self.buffer.clear();
        self.overflowed = false;
        result
    }
}
