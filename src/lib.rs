//! USB serial to SSD1306 OLED terminal
//!
//! The line protocol engine of a small USB-CDC device that shows text on a
//! 128x32 or 128x64 SSD1306 OLED. The host sends lines; plain lines are drawn
//! as text in a grid of 8x8 px character cells, lines starting with a tab are
//! commands that configure the device and can produce a reply.
//!
//! ## Features
//!
//! - `no_std`, no allocation: every buffer has a fixed capacity
//! - `embedded-hal` v1.0 I2C support
//! - 5x8 and double height 8x13 text from `embedded-graphics` mono fonts
//! - Persistent settings behind a 16 byte storage record
//! - Two command grammars ([`Revision::Legacy`] and [`Revision::Current`])
//! - Rolling bar graph
//!
//! ## Usage
//!
//! ```rust,no_run
//! use embedded_hal::i2c::{ErrorType, I2c, Operation};
//! use usb_oled::{HalTransport, Interface, MemoryStorage, Revision, Terminal, TerminalConfig};
//! # use core::convert::Infallible;
//! # struct MockI2c;
//! # impl ErrorType for MockI2c { type Error = Infallible; }
//! # impl I2c for MockI2c {
//! #     fn transaction(
//! #         &mut self,
//! #         _address: u8,
//! #         _operations: &mut [Operation<'_>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! let interface = Interface::new(HalTransport::new(MockI2c), 0x3C);
//! let config = TerminalConfig {
//!     revision: Revision::Current,
//!     banner: None,
//! };
//! let mut terminal = Terminal::new(interface, MemoryStorage::new(), config);
//! if terminal.start().is_err() {
//!     return;
//! }
//!
//! // Small text on the first row, then ask for the I2C address
//! terminal.receive(b"Hello\n\t@\n");
//! terminal.process();
//!
//! let mut reply = [0; 16];
//! let count = terminal.transmit(&mut reply);
//! assert_eq!(&reply[..count], b"\n3C\n");
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// Input and output byte buffers
pub mod buffer;
/// SSD1306 command definitions
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Text cell display operations
pub mod display;
/// Error types
pub mod error;
/// Glyph rendering
pub mod font;
/// Line framing
pub mod framer;
/// Bar graph
pub mod graph;
/// Hex digit codec
pub mod hex;
/// Hardware interface abstraction
pub mod interface;
/// Line protocol interpreter
pub mod protocol;
/// Persistent settings
pub mod settings;
/// Terminal main loop
pub mod terminal;

#[cfg(test)]
mod mock;

pub use config::{Builder, Config, Dimensions, DisplayHeight, TerminalConfig};
pub use display::Display;
pub use error::{BuilderError, CommandError, Error, HexError, StorageError};
pub use interface::InterfaceError;
pub use interface::{DisplayInterface, HalTransport, I2cTransport, Interface};
pub use protocol::Revision;
pub use settings::{MemoryStorage, Settings, SettingsStorage, SettingsStore};
pub use terminal::Terminal;
