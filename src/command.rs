//! SSD1306 command definitions
//!
//! This module defines the command bytes used to control the SSD1306 OLED
//! controller. Every I2C transaction to the controller starts with a control
//! byte that tells it how to interpret the rest of the transaction.
//!
//! ## Transaction Structure
//!
//! 1. Start condition + 7-bit address (write)
//! 2. Control byte: [`CONTROL_COMMAND`] or [`CONTROL_DATA`]
//! 3. Command bytes (with their arguments) or display RAM bytes
//! 4. Stop condition
//!
//! ## Example
//!
//! ```rust
//! use usb_oled::{command, DisplayInterface};
//! # use core::convert::Infallible;
//! # struct Sink;
//! # impl DisplayInterface for Sink {
//! #     type Error = Infallible;
//! #     fn send_commands(&mut self, _c: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn send_data(&mut self, _d: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn send_fill(&mut self, _v: u8, _n: usize) -> Result<(), Infallible> { Ok(()) }
//! #     fn set_address(&mut self, _a: u8) {}
//! #     fn set_speed_khz(&mut self, _k: u16) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # let mut interface = Sink;
//! // Full contrast
//! let _ = interface.send_commands(&[command::SET_CONTRAST, 0xFF]);
//!
//! // Select page 2, column 0
//! let _ = interface.send_commands(&[command::SET_PAGE_START | 2]);
//! let _ = interface.send_commands(&[command::SET_LOWER_COLUMN, command::SET_UPPER_COLUMN]);
//! ```

// Control bytes

/// Control byte announcing a stream of command bytes (Co = 0, D/C# = 0)
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte announcing a stream of display RAM bytes (Co = 0, D/C# = 1)
pub const CONTROL_DATA: u8 = 0x40;

// Addressing commands

/// Set lower nibble of the column start address (0x00-0x0F, page addressing mode)
pub const SET_LOWER_COLUMN: u8 = 0x00;

/// Set upper nibble of the column start address (0x10-0x1F, page addressing mode)
pub const SET_UPPER_COLUMN: u8 = 0x10;

/// Set memory addressing mode (0x20)
///
/// Requires 1 byte: 0b00 horizontal, 0b01 vertical, 0b10 page
pub const SET_MEMORY_ADDRESSING_MODE: u8 = 0x20;

/// Page addressing mode argument for [`SET_MEMORY_ADDRESSING_MODE`]
pub const ADDRESSING_MODE_PAGE: u8 = 0b10;

/// Set page start address (0xB0-0xB7, page addressing mode)
pub const SET_PAGE_START: u8 = 0xB0;

/// Set display start line (0x40-0x7F)
pub const SET_DISPLAY_START_LINE: u8 = 0x40;

// Fundamental commands

/// Set contrast control (0x81)
///
/// Requires 1 byte: contrast 0-255
pub const SET_CONTRAST: u8 = 0x81;

/// Resume to RAM content display (0xA4)
pub const ENTIRE_DISPLAY_ON_RESUME: u8 = 0xA4;

/// Normal display, RAM bit 1 = pixel on (0xA6)
pub const SET_NORMAL_DISPLAY: u8 = 0xA6;

/// Inverse display, RAM bit 0 = pixel on (0xA7)
pub const SET_INVERSE_DISPLAY: u8 = 0xA7;

/// Display off, sleep mode (0xAE)
pub const SET_DISPLAY_OFF: u8 = 0xAE;

/// Display on, normal mode (0xAF)
pub const SET_DISPLAY_ON: u8 = 0xAF;

// Hardware configuration commands

/// Column address 0 is mapped to SEG0 (0xA0)
pub const SET_SEGMENT_REMAP_NORMAL: u8 = 0xA0;

/// Column address 127 is mapped to SEG0 (0xA1)
pub const SET_SEGMENT_REMAP_REVERSED: u8 = 0xA1;

/// Set multiplex ratio (0xA8)
///
/// Requires 1 byte: display height - 1
pub const SET_MULTIPLEX_RATIO: u8 = 0xA8;

/// Scan from COM0 to COM[N-1] (0xC0)
pub const SET_COM_SCAN_INCREMENT: u8 = 0xC0;

/// Scan from COM[N-1] to COM0 (0xC8)
pub const SET_COM_SCAN_DECREMENT: u8 = 0xC8;

/// Set display offset (0xD3)
///
/// Requires 1 byte: vertical shift 0-63
pub const SET_DISPLAY_OFFSET: u8 = 0xD3;

/// Set COM pins hardware configuration (0xDA)
///
/// Requires 1 byte: 0x02 for 128x32, 0x12 for 128x64
pub const SET_COM_PINS: u8 = 0xDA;

// Timing and driving scheme commands

/// Set display clock divide ratio / oscillator frequency (0xD5)
///
/// Requires 1 byte (0x80 is the reset value)
pub const SET_CLOCK_DIVIDE: u8 = 0xD5;

/// Set pre-charge period (0xD9)
///
/// Requires 1 byte: 0x22 external VCC, 0xF1 internal VCC
pub const SET_PRECHARGE_PERIOD: u8 = 0xD9;

/// Set VCOMH deselect level (0xDB)
///
/// Requires 1 byte
pub const SET_VCOMH_DESELECT: u8 = 0xDB;

// Charge pump

/// Charge pump setting (0x8D)
///
/// Requires 1 byte: 0x10 external VCC, 0x14 internal VCC (pump enabled)
pub const SET_CHARGE_PUMP: u8 = 0x8D;

/// Charge pump argument enabling the internal pump
pub const CHARGE_PUMP_ENABLE: u8 = 0x14;
