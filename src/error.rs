//! Error types for the terminal
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during display configuration construction
//! - [`Error`] - Runtime errors of the display driver (geometry and hardware)
//! - [`HexError`] - Malformed hex-encoded command arguments
//! - [`CommandError`] - Why a command line failed
//! - [`StorageError`] - Settings could not be read or written
//!
//! None of these reach the serial client in detail: every failure of a line is
//! collapsed into a single `!` in the reply.
//!
//! ## Example
//!
//! ```
//! use usb_oled::{Builder, BuilderError};
//!
//! // Not a 7-bit I2C address
//! let result = Builder::new().address(0x80).build();
//! assert!(matches!(result, Err(BuilderError::InvalidAddress(0x80))));
//! ```

use crate::interface::DisplayInterface;

/// Errors that can occur when driving the display
///
/// Generic over the interface type to preserve the specific bus error.
#[derive(Debug)]
pub enum Error<I: DisplayInterface> {
    /// Interface error (I2C acknowledge failure, bus error)
    ///
    /// Wraps the underlying error from the [`DisplayInterface`] implementation.
    Interface(I::Error),
    /// Cursor position outside the display
    ///
    /// Coordinates are 0-based cell positions.
    OutOfBounds {
        /// Row that was requested
        row: u8,
        /// Column that was requested
        column: u8,
    },
    /// The cursor is on the last row and cannot advance
    PageFull,
    /// Custom glyph must be exactly 8 (single height) or 16 (double height) bytes
    InvalidGlyphLength {
        /// Provided length in bytes
        provided: usize,
    },
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(e) => write!(f, "Interface error: {e:?}"),
            Self::OutOfBounds { row, column } => {
                write!(f, "Cursor out of bounds: row {row}, column {column}")
            }
            Self::PageFull => write!(f, "No row left below the cursor"),
            Self::InvalidGlyphLength { provided } => {
                write!(f, "Invalid glyph length: expected 8 or 16 bytes, provided {provided}")
            }
        }
    }
}

impl<I: DisplayInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// Address is not a usable 7-bit I2C address (1..=0x7F)
    InvalidAddress(u8),
    /// Bus speed outside 1..=1000 kHz
    InvalidSpeed(u16),
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidAddress(address) => {
                write!(f, "Invalid I2C address 0x{address:02X} (must be 0x01..=0x7F)")
            }
            Self::InvalidSpeed(khz) => {
                write!(f, "Invalid I2C speed {khz} kHz (must be 1..=1000)")
            }
        }
    }
}

impl core::error::Error for BuilderError {}

/// Errors from decoding hex-encoded arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// Hex arguments always come in digit pairs
    OddLength,
    /// Not an ASCII hex digit
    InvalidDigit(u8),
    /// Destination cannot hold the decoded bytes
    OutputTooSmall,
}

impl core::fmt::Display for HexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OddLength => write!(f, "Odd number of hex digits"),
            Self::InvalidDigit(byte) => write!(f, "Invalid hex digit 0x{byte:02X}"),
            Self::OutputTooSmall => write!(f, "Decoded data does not fit"),
        }
    }
}

impl core::error::Error for HexError {}

/// Errors from the settings storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not read the record
    Read,
    /// Backend could not erase or program the record
    Write,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read => write!(f, "Settings read failed"),
            Self::Write => write!(f, "Settings write failed"),
        }
    }
}

impl core::error::Error for StorageError {}

/// Why a command line failed
///
/// The display error detail is logged where it happens; here it is reduced to
/// [`CommandError::Display`] so the type does not depend on the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The line held the command escape but no verb
    MissingVerb,
    /// Verb not known to the active command table
    UnknownVerb(u8),
    /// Verb is known but not with this many argument characters
    ArgumentCount {
        /// Verb byte
        verb: u8,
        /// Number of argument characters provided
        provided: usize,
    },
    /// Malformed hex argument
    Hex(HexError),
    /// Argument decoded but is out of range for the setting
    InvalidValue,
    /// The outbound buffer is above its high watermark
    OutputFull,
    /// The display driver rejected the operation
    Display,
    /// Settings could not be persisted
    Storage(StorageError),
}

impl From<HexError> for CommandError {
    fn from(error: HexError) -> Self {
        Self::Hex(error)
    }
}

impl From<StorageError> for CommandError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingVerb => write!(f, "Command without verb"),
            Self::UnknownVerb(verb) => write!(f, "Unknown verb 0x{verb:02X}"),
            Self::ArgumentCount { verb, provided } => write!(
                f,
                "Verb 0x{verb:02X} does not take {provided} argument characters"
            ),
            Self::Hex(e) => write!(f, "{e}"),
            Self::InvalidValue => write!(f, "Argument out of range"),
            Self::OutputFull => write!(f, "Output buffer above high watermark"),
            Self::Display => write!(f, "Display operation failed"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for CommandError {}
