//! Line framing
//!
//! Lines end at LF. A CR directly in front of the LF belongs to the terminator
//! (CRLF), even when the two arrive in separate receive chunks; any other CR
//! is an ordinary byte of the line. The terminator shape is kept so the reply
//! can mirror it.
//!
//! The framer never owns the bytes: it scans a buffer the caller appends to,
//! remembering how far it got, so each byte is looked at once.
//!
//! ```
//! use usb_oled::framer::{LineFramer, Terminator};
//!
//! let mut framer = LineFramer::new();
//!
//! // CR arrives in one chunk...
//! let mut data = b"hi\r".to_vec();
//! assert!(framer.next_line(&data, 0).is_none());
//!
//! // ...and its LF in the next
//! data.push(b'\n');
//! let frame = framer.next_line(&data, 0).unwrap();
//! assert_eq!(frame.content(&data), b"hi");
//! assert_eq!(frame.terminator, Terminator::CrLf);
//! ```

/// Carriage return
pub const CR: u8 = 0x0D;

/// Line feed
pub const LF: u8 = 0x0A;

/// Terminator seen at the end of a line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminator {
    /// Bare LF
    Lf,
    /// CR followed by LF
    CrLf,
}

impl Terminator {
    /// Bytes to echo at the end of the reply
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Location of one complete line in the scanned buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Index of the first content byte
    pub start: usize,
    /// Index one past the last content byte (terminator excluded)
    pub end: usize,
    /// Terminator shape
    pub terminator: Terminator,
    /// Index where the next line starts
    pub next: usize,
}

impl Frame {
    /// Content bytes of the line
    pub fn content<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start..self.end]
    }
}

/// Incremental LF / CRLF line splitter
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFramer {
    /// Index of the first byte not yet scanned
    scanned: usize,
    /// Last scanned (or dropped) byte was a CR
    pending_cr: bool,
    /// Bytes of the current line were dropped because the buffer was full
    dropped: bool,
}

impl LineFramer {
    /// Create a framer for an empty buffer
    pub const fn new() -> Self {
        Self {
            scanned: 0,
            pending_cr: false,
            dropped: false,
        }
    }

    /// Find the next complete line in `data`, starting at `start`
    ///
    /// `start` is where the current line begins (0 after a compaction, or the
    /// `next` of the previous frame). Returns `None` when no LF has arrived yet;
    /// call again once more bytes were appended.
    pub fn next_line(&mut self, data: &[u8], start: usize) -> Option<Frame> {
        let from = self.scanned.max(start);
        for (index, &byte) in data.iter().enumerate().skip(from) {
            if byte == LF {
                let crlf = self.pending_cr;
                self.pending_cr = false;
                self.dropped = false;
                self.scanned = index + 1;
                return Some(Frame {
                    start,
                    end: if crlf && index > start { index - 1 } else { index },
                    terminator: if crlf { Terminator::CrLf } else { Terminator::Lf },
                    next: index + 1,
                });
            }
            self.pending_cr = byte == CR;
        }
        self.scanned = data.len().max(from);
        None
    }

    /// Record a byte that did not fit in the buffer
    ///
    /// Only the CR lookahead is tracked; the byte itself is lost.
    pub fn observe_dropped(&mut self, byte: u8) {
        self.dropped = true;
        self.pending_cr = byte == CR;
    }

    /// End the current line at an LF that did not fit in the buffer
    ///
    /// The line is whatever was kept from `start` to the end of `data`. A CR
    /// at the very end is only treated as part of the terminator when nothing
    /// was dropped after it. `data[start..]` must have been scanned by
    /// [`LineFramer::next_line`] without finding an LF.
    pub fn terminate(&mut self, data: &[u8], start: usize) -> Frame {
        let strip_cr = self.pending_cr && !self.dropped && data.len() > start;
        let terminator = if self.pending_cr {
            Terminator::CrLf
        } else {
            Terminator::Lf
        };
        self.pending_cr = false;
        self.dropped = false;
        self.scanned = data.len();
        Frame {
            start,
            end: if strip_cr { data.len() - 1 } else { data.len() },
            terminator,
            next: data.len(),
        }
    }

    /// Account for `count` bytes removed from the front of the buffer
    pub fn consume(&mut self, count: usize) {
        self.scanned = self.scanned.saturating_sub(count);
    }

    /// Forget all scanning state (buffer was cleared)
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether the last scanned byte was a CR waiting for its LF
    pub fn pending_cr(&self) -> bool {
        self.pending_cr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lf_line() {
        let mut framer = LineFramer::new();
        let data = b"abc\n";
        let frame = framer.next_line(data, 0).unwrap();
        assert_eq!(frame.content(data), b"abc");
        assert_eq!(frame.terminator, Terminator::Lf);
        assert_eq!(frame.next, 4);
    }

    #[test]
    fn test_several_lines_in_one_buffer() {
        let mut framer = LineFramer::new();
        let data = b"a\r\n\nb\n";

        let first = framer.next_line(data, 0).unwrap();
        assert_eq!(first.content(data), b"a");
        assert_eq!(first.terminator, Terminator::CrLf);

        let empty = framer.next_line(data, first.next).unwrap();
        assert_eq!(empty.content(data), b"");
        assert_eq!(empty.terminator, Terminator::Lf);

        let last = framer.next_line(data, empty.next).unwrap();
        assert_eq!(last.content(data), b"b");
        assert!(framer.next_line(data, last.next).is_none());
    }

    #[test]
    fn test_lone_cr_is_content() {
        let mut framer = LineFramer::new();
        let data = b"a\rb\n";
        let frame = framer.next_line(data, 0).unwrap();
        assert_eq!(frame.content(data), b"a\rb");
        assert_eq!(frame.terminator, Terminator::Lf);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut framer = LineFramer::new();
        let mut data = b"text\r".to_vec();
        assert!(framer.next_line(&data, 0).is_none());
        assert!(framer.pending_cr());

        data.push(LF);
        let frame = framer.next_line(&data, 0).unwrap();
        assert_eq!(frame.content(&data), b"text");
        assert_eq!(frame.terminator, Terminator::CrLf);
        assert!(!framer.pending_cr());
    }

    #[test]
    fn test_consume_shifts_scan_position() {
        let mut framer = LineFramer::new();
        let mut data = b"ab\ncd".to_vec();
        let frame = framer.next_line(&data, 0).unwrap();
        assert!(framer.next_line(&data, frame.next).is_none());

        data.drain(..frame.next);
        framer.consume(frame.next);
        data.push(LF);
        let frame = framer.next_line(&data, 0).unwrap();
        assert_eq!(frame.content(&data), b"cd");
    }

    #[test]
    fn test_terminate_strips_kept_cr() {
        let mut framer = LineFramer::new();
        let data = b"full\r";
        assert!(framer.next_line(data, 0).is_none());

        let frame = framer.terminate(data, 0);
        assert_eq!(frame.content(data), b"full");
        assert_eq!(frame.terminator, Terminator::CrLf);
    }

    #[test]
    fn test_terminate_after_dropped_cr() {
        let mut framer = LineFramer::new();
        let data = b"full";
        assert!(framer.next_line(data, 0).is_none());
        framer.observe_dropped(b'x');
        framer.observe_dropped(CR);

        let frame = framer.terminate(data, 0);
        assert_eq!(frame.content(data), b"full");
        assert_eq!(frame.terminator, Terminator::CrLf);
    }

    #[test]
    fn test_terminate_keeps_cr_followed_by_dropped_bytes() {
        let mut framer = LineFramer::new();
        let data = b"full\r";
        assert!(framer.next_line(data, 0).is_none());
        framer.observe_dropped(b'x');

        let frame = framer.terminate(data, 0);
        assert_eq!(frame.content(data), b"full\r");
        assert_eq!(frame.terminator, Terminator::Lf);
    }
}
