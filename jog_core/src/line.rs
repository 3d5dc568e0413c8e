//! Byte-to-line assembly for the command link.
//!
//! CR or LF ends a line, bytes outside printable ASCII are discarded, and a
//! line never grows past `capacity`: extra bytes are dropped until the next
//! terminator, so an overlong line is truncated and the following line parses
//! cleanly.

use jog_traits::SerialSource;

pub const DEFAULT_LINE_CAPACITY: usize = 31;

#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: String,
    capacity: usize,
    truncated: bool,
    dropped_bytes: u64,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_CAPACITY)
    }
}

impl LineAssembler {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: String::with_capacity(capacity),
            capacity,
            truncated: false,
            dropped_bytes: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes discarded so far for being over capacity.
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes
    }

    /// Feed one byte; returns a line when `byte` completes a non-empty one.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' | b'\n' => {
                if self.truncated {
                    tracing::warn!(
                        capacity = self.capacity,
                        kept = %self.buf,
                        "command line too long, truncated"
                    );
                    self.truncated = false;
                }
                if self.buf.is_empty() {
                    None
                } else {
                    Some(std::mem::replace(
                        &mut self.buf,
                        String::with_capacity(self.capacity),
                    ))
                }
            }
            32..=126 => {
                if self.buf.len() < self.capacity {
                    self.buf.push(char::from(byte));
                } else {
                    self.truncated = true;
                    self.dropped_bytes += 1;
                }
                None
            }
            _ => None,
        }
    }

    /// Pull every buffered byte from `src`, collecting the completed lines.
    pub fn drain<S: SerialSource + ?Sized>(&mut self, src: &mut S) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(b) = src.read_byte() {
            if let Some(line) = self.push(b) {
                lines.push(line);
            }
        }
        lines
    }
}
