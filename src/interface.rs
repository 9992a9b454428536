//! Hardware interface abstraction
//!
//! Two layers sit between the display driver and the wire:
//!
//! - [`I2cTransport`] is the minimal bus capability: start a write transaction
//!   to an address, write bytes, stop. Bit-banged masters, hardware peripherals
//!   and test transcripts all fit behind it.
//! - [`DisplayInterface`] speaks SSD1306 framing on top of that: every
//!   transaction starts with a control byte selecting command or data.
//!   [`Interface`] implements it for any [`I2cTransport`].
//!
//! [`HalTransport`] adapts an `embedded-hal` v1.0 [`I2c`] bus to
//! [`I2cTransport`] by collecting one start..stop transaction and writing it in
//! a single bus operation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::i2c::{ErrorType, I2c, Operation};
//! use usb_oled::{DisplayInterface, HalTransport, Interface};
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
//! let mut interface = Interface::new(HalTransport::new(MockI2c), 0x3C);
//!
//! // Display off
//! let _ = interface.send_commands(&[0xAE]);
//!
//! // One glyph worth of display RAM
//! let _ = interface.send_data(&[0x00, 0x7E, 0x11, 0x11, 0x7E, 0x00, 0x00, 0x00]);
//! ```

use core::fmt::Debug;
use embedded_hal::i2c::I2c;
use heapless::Vec;
use log::debug;

use crate::command::{CONTROL_COMMAND, CONTROL_DATA};

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Minimal I2C master capability used by the display
///
/// A transaction is `start`, any number of `write_byte`, then `stop`. `stop`
/// is always called once `start` was attempted, even if a write failed, so
/// implementations can release the bus.
pub trait I2cTransport {
    /// Error type for bus operations (typically a missing acknowledge)
    type Error: Debug;

    /// Issue a start condition and address the device for writing
    fn start(&mut self, address: u8) -> InterfaceResult<(), Self::Error>;

    /// Write one byte within the current transaction
    fn write_byte(&mut self, value: u8) -> InterfaceResult<(), Self::Error>;

    /// Issue a stop condition
    fn stop(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Change the bus clock
    ///
    /// Transports without a configurable clock keep the default, which ignores
    /// the request.
    fn set_speed_khz(&mut self, khz: u16) -> InterfaceResult<(), Self::Error> {
        debug!("transport ignores bus speed change to {khz} kHz");
        Ok(())
    }
}

/// Trait for hardware interface to the SSD1306 controller
///
/// This trait abstracts over the transport so that the
/// [`Display`](crate::display::Display) can be driven by any bus, or by a
/// recording fake in tests.
pub trait DisplayInterface {
    /// Error type for interface operations
    type Error: Debug;

    /// Send one command transaction (command byte followed by its arguments)
    fn send_commands(&mut self, commands: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Send display RAM bytes at the current address pointer
    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Send `count` copies of `value` as display RAM bytes
    fn send_fill(&mut self, value: u8, count: usize) -> InterfaceResult<(), Self::Error>;

    /// Change the device address used for following transactions
    fn set_address(&mut self, address: u8);

    /// Change the bus clock
    fn set_speed_khz(&mut self, khz: u16) -> InterfaceResult<(), Self::Error>;
}

/// SSD1306 framing over an [`I2cTransport`]
#[derive(Debug)]
pub struct Interface<T> {
    /// Bus transport
    transport: T,
    /// 7-bit device address
    address: u8,
}

impl<T: I2cTransport> Interface<T> {
    /// Create a new Interface talking to `address`
    pub fn new(transport: T, address: u8) -> Self {
        Self { transport, address }
    }

    /// Current device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn release(self) -> T {
        self.transport
    }

    /// Run one start..stop transaction, always issuing the stop
    fn transaction<B>(&mut self, control: u8, body: B) -> InterfaceResult<(), T::Error>
    where
        B: IntoIterator<Item = u8>,
    {
        let written = write_transaction(&mut self.transport, self.address, control, body);
        let stopped = self.transport.stop();
        written.and(stopped)
    }
}

fn write_transaction<T, B>(
    transport: &mut T,
    address: u8,
    control: u8,
    body: B,
) -> InterfaceResult<(), T::Error>
where
    T: I2cTransport,
    B: IntoIterator<Item = u8>,
{
    transport.start(address)?;
    transport.write_byte(control)?;
    for byte in body {
        transport.write_byte(byte)?;
    }
    Ok(())
}

impl<T: I2cTransport> DisplayInterface for Interface<T> {
    type Error = T::Error;

    fn send_commands(&mut self, commands: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.transaction(CONTROL_COMMAND, commands.iter().copied())
    }

    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.transaction(CONTROL_DATA, data.iter().copied())
    }

    fn send_fill(&mut self, value: u8, count: usize) -> InterfaceResult<(), Self::Error> {
        self.transaction(CONTROL_DATA, core::iter::repeat_n(value, count))
    }

    fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    fn set_speed_khz(&mut self, khz: u16) -> InterfaceResult<(), Self::Error> {
        self.transport.set_speed_khz(khz)
    }
}

/// Errors from [`HalTransport`]
///
/// Generic over the `embedded-hal` bus error.
#[derive(Debug)]
pub enum InterfaceError<BusErr> {
    /// Bus error reported by the HAL (including missing acknowledge)
    Bus(BusErr),
    /// Transaction is longer than [`TRANSACTION_CAPACITY`]
    TransactionTooLong,
    /// `write_byte` or `stop` without a preceding `start`
    NotStarted,
}

impl<BusErr: Debug> core::fmt::Display for InterfaceError<BusErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "I2C error: {e:?}"),
            Self::TransactionTooLong => {
                write!(f, "Transaction exceeds {TRANSACTION_CAPACITY} bytes")
            }
            Self::NotStarted => write!(f, "No transaction in progress"),
        }
    }
}

impl<BusErr: Debug> core::error::Error for InterfaceError<BusErr> {}

/// Largest transaction the HAL transport buffers: control byte plus one full
/// 128 px page
pub const TRANSACTION_CAPACITY: usize = 1 + 128;

/// [`I2cTransport`] over an `embedded-hal` v1.0 [`I2c`] bus
///
/// Bytes between `start` and `stop` are collected and written with a single
/// [`I2c::write`] on `stop`, so acknowledge failures surface there.
pub struct HalTransport<I2C> {
    /// I2C bus
    i2c: I2C,
    /// Address of the transaction in progress
    address: Option<u8>,
    /// Bytes of the transaction in progress
    pending: Vec<u8, TRANSACTION_CAPACITY>,
    /// Set when a byte did not fit; the transaction is abandoned on stop
    overflowed: bool,
}

impl<I2C: I2c> HalTransport<I2C> {
    /// Create a new transport owning the bus
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: None,
            pending: Vec::new(),
            overflowed: false,
        }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> I2cTransport for HalTransport<I2C> {
    type Error = InterfaceError<I2C::Error>;

    fn start(&mut self, address: u8) -> InterfaceResult<(), Self::Error> {
        self.address = Some(address);
        self.pending.clear();
        self.overflowed = false;
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> InterfaceResult<(), Self::Error> {
        if self.address.is_none() {
            return Err(InterfaceError::NotStarted);
        }
        self.pending.push(value).map_err(|_| {
            self.overflowed = true;
            InterfaceError::TransactionTooLong
        })
    }

    fn stop(&mut self) -> InterfaceResult<(), Self::Error> {
        let address = self.address.take().ok_or(InterfaceError::NotStarted)?;
        if core::mem::take(&mut self.overflowed) {
            self.pending.clear();
            return Err(InterfaceError::TransactionTooLong);
        }
        let result = self
            .i2c
            .write(address, &self.pending)
            .map_err(InterfaceError::Bus);
        self.pending.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBus, MockError};
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    #[test]
    fn test_commands_are_prefixed_with_control_byte() {
        let mut interface = Interface::new(MockBus::new(), 0x3C);
        interface.send_commands(&[0x81, 0x7F]).unwrap();

        let bus = interface.transport();
        assert_eq!(bus.transactions.len(), 1);
        assert_eq!(bus.transactions[0].address, 0x3C);
        assert_eq!(bus.transactions[0].bytes, [0x00, 0x81, 0x7F]);
    }

    #[test]
    fn test_fill_sends_data_control_byte_and_count_bytes() {
        let mut interface = Interface::new(MockBus::new(), 0x3D);
        interface.send_fill(0x00, 128).unwrap();

        let bytes = &interface.transport().transactions[0].bytes;
        assert_eq!(bytes.len(), 129);
        assert_eq!(bytes[0], 0x40);
        assert!(bytes[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_failed_write_still_stops() {
        let mut bus = MockBus::new();
        bus.fail_on_byte = Some(2);
        let mut interface = Interface::new(bus, 0x3C);

        let result = interface.send_commands(&[0xAE, 0xAF]);
        assert_eq!(result, Err(MockError::Nack));
        assert!(!interface.transport().in_transaction);
        assert_eq!(interface.transport().stops, 1);
    }

    #[test]
    fn test_set_address_applies_to_following_transactions() {
        let mut interface = Interface::new(MockBus::new(), 0x3C);
        interface.set_address(0x3D);
        interface.send_commands(&[0xAF]).unwrap();
        assert_eq!(interface.transport().transactions[0].address, 0x3D);
    }

    #[derive(Debug, Clone, Copy)]
    struct HalError(ErrorKind);

    impl embedded_hal::i2c::Error for HalError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    #[derive(Default)]
    struct MockI2c {
        writes: alloc::vec::Vec<(u8, alloc::vec::Vec<u8>)>,
        nack: bool,
    }

    impl ErrorType for MockI2c {
        type Error = HalError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.nack {
                return Err(HalError(ErrorKind::NoAcknowledge(
                    NoAcknowledgeSource::Address,
                )));
            }
            for operation in operations {
                if let Operation::Write(bytes) = operation {
                    self.writes.push((address, bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_hal_transport_writes_whole_transaction_on_stop() {
        let mut interface = Interface::new(HalTransport::new(MockI2c::default()), 0x3C);
        interface.send_data(&[1, 2, 3]).unwrap();

        let i2c = interface.release().release();
        assert_eq!(i2c.writes, [(0x3C, alloc::vec![0x40, 1, 2, 3])]);
    }

    #[test]
    fn test_hal_transport_reports_nack() {
        let i2c = MockI2c {
            nack: true,
            ..MockI2c::default()
        };
        let mut interface = Interface::new(HalTransport::new(i2c), 0x3C);
        let result = interface.send_commands(&[0xAF]);
        assert!(matches!(result, Err(InterfaceError::Bus(_))));
    }

    #[test]
    fn test_hal_transport_rejects_oversized_transaction() {
        let mut interface = Interface::new(HalTransport::new(MockI2c::default()), 0x3C);
        let result = interface.send_fill(0x00, TRANSACTION_CAPACITY);
        assert!(matches!(result, Err(InterfaceError::TransactionTooLong)));

        let i2c = interface.release().release();
        assert!(i2c.writes.is_empty());
    }

    #[test]
    fn test_hal_transport_full_page_fits() {
        let mut interface = Interface::new(HalTransport::new(MockI2c::default()), 0x3C);
        assert!(interface.send_fill(0x00, 128).is_ok());
    }

    #[test]
    fn test_hal_transport_stop_without_start() {
        let mut transport = HalTransport::new(MockI2c::default());
        assert!(matches!(transport.stop(), Err(InterfaceError::NotStarted)));
    }
}
