//! Fixed capacity transport buffers
//!
//! [`InputBuffer`] collects bytes received from the host until a whole line is
//! available; [`OutputBuffer`] holds reply bytes until the host side drains
//! them. Neither ever grows: the input buffer refuses bytes when full and
//! remembers that it did, the output buffer silently drops them.

use heapless::Vec;

/// Capacity of the inbound line buffer in bytes
pub const INPUT_CAPACITY: usize = 192;

/// Capacity of the outbound reply buffer in bytes
pub const OUTPUT_CAPACITY: usize = 224;

/// Fill level above which verbs that produce data refuse to run
pub const OUTPUT_HIGH_WATERMARK: usize = 192;

/// Inbound byte buffer with an overflow ("corrupted") flag
#[derive(Debug, Default)]
pub struct InputBuffer<const N: usize> {
    data: Vec<u8, N>,
    corrupted: bool,
}

impl<const N: usize> InputBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            corrupted: false,
        }
    }

    /// Append one byte
    ///
    /// Returns `false` and sets the corrupted flag when the buffer is full;
    /// the byte is lost.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.data.push(byte).is_err() {
            self.corrupted = true;
            return false;
        }
        true
    }

    /// Drop the first `consumed` bytes, moving the rest to the front
    pub fn compact(&mut self, consumed: usize) {
        let consumed = consumed.min(self.data.len());
        if consumed == 0 {
            return;
        }
        let remaining = self.data.len() - consumed;
        self.data.copy_within(consumed.., 0);
        self.data.truncate(remaining);
    }

    /// Drop all bytes and reset the corrupted flag
    pub fn clear(&mut self) {
        self.data.clear();
        self.corrupted = false;
    }

    /// Whether bytes were dropped since the flag was last cleared
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// Whether no more bytes fit
    pub fn is_full(&self) -> bool {
        self.data.is_full()
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffered bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Outbound byte buffer with a high watermark
#[derive(Debug)]
pub struct OutputBuffer<const N: usize> {
    data: Vec<u8, N>,
    high_watermark: usize,
}

impl<const N: usize> OutputBuffer<N> {
    /// Create an empty buffer
    pub const fn new(high_watermark: usize) -> Self {
        Self {
            data: Vec::new(),
            high_watermark,
        }
    }

    /// Append one byte; returns `false` if it was dropped
    pub fn push(&mut self, byte: u8) -> bool {
        self.data.push(byte).is_ok()
    }

    /// Append as many of `bytes` as fit
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if !self.push(byte) {
                break;
            }
        }
    }

    /// Whether the fill level reached the high watermark
    pub fn is_above_watermark(&self) -> bool {
        self.data.len() >= self.high_watermark
    }

    /// Move up to `out.len()` bytes into `out`, oldest first
    ///
    /// Returns how many bytes were written.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.data.len());
        out[..count].copy_from_slice(&self.data[..count]);
        let remaining = self.data.len() - count;
        self.data.copy_within(count.., 0);
        self.data.truncate(remaining);
        count
    }

    /// Drop all bytes
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffered bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl<const N: usize> Default for OutputBuffer<N> {
    fn default() -> Self {
        Self::new(N)
    }
}
