//! The terminal loop
//!
//! [`Terminal`] owns every component and runs them in the fixed order of the
//! cooperative main loop: take in one receive chunk, hand out one transmit
//! chunk, then process whatever complete lines are buffered.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::i2c::{ErrorType, I2c, Operation};
//! use usb_oled::{HalTransport, Interface, MemoryStorage, Terminal, TerminalConfig};
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
//! # fn usb_read(_buf: &mut [u8]) -> usize { 0 }
//! # fn usb_write(_buf: &[u8]) {}
//! let interface = Interface::new(HalTransport::new(MockI2c), 0x3C);
//! let config = TerminalConfig {
//!     banner: Some("USB OLED"),
//!     ..TerminalConfig::default()
//! };
//! let mut terminal = Terminal::new(interface, MemoryStorage::new(), config);
//! let _ = terminal.start();
//!
//! let mut rx = [0; 64];
//! let mut tx = [0; 64];
//! while !terminal.reboot_requested() {
//!     let received = usb_read(&mut rx);
//!     let sent = terminal.poll(&rx[..received], &mut tx);
//!     usb_write(&tx[..sent]);
//! }
//! ```

use log::{info, warn};

use crate::buffer::{
    INPUT_CAPACITY, InputBuffer, OUTPUT_CAPACITY, OUTPUT_HIGH_WATERMARK, OutputBuffer,
};
use crate::config::TerminalConfig;
use crate::display::Display;
use crate::error::Error;
use crate::framer::{Frame, LF, LineFramer};
use crate::interface::DisplayInterface;
use crate::protocol::{Context, Effects, Interpreter};
use crate::settings::{Settings, SettingsStorage, SettingsStore};

/// Loop ticks the activity indicator stays on after traffic
pub const ACTIVITY_TICKS: u8 = 20;

/// Activity indicator countdown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Activity {
    remaining: u8,
}

impl Activity {
    /// Restart the countdown
    pub fn pulse(&mut self) {
        self.remaining = ACTIVITY_TICKS;
    }

    /// Count one loop iteration down
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Whether the countdown is running
    pub fn is_on(&self) -> bool {
        self.remaining > 0
    }
}

/// USB serial to OLED terminal
pub struct Terminal<I, S>
where
    I: DisplayInterface,
{
    display: Display<I>,
    store: SettingsStore<S>,
    input: InputBuffer<INPUT_CAPACITY>,
    output: OutputBuffer<OUTPUT_CAPACITY>,
    framer: LineFramer,
    interpreter: Interpreter,
    activity: Activity,
    reboot_requested: bool,
    config: TerminalConfig,
}

impl<I, S> Terminal<I, S>
where
    I: DisplayInterface,
    S: SettingsStorage,
{
    /// Load the settings and set up the display driver
    ///
    /// The display is not touched until [`Terminal::start`].
    pub fn new(interface: I, storage: S, config: TerminalConfig) -> Self {
        let store = SettingsStore::load(storage);
        let display = Display::new(interface, store.settings().display_config());
        Self {
            display,
            store,
            input: InputBuffer::new(),
            output: OutputBuffer::new(OUTPUT_HIGH_WATERMARK),
            framer: LineFramer::new(),
            interpreter: Interpreter::new(config.revision),
            activity: Activity::default(),
            reboot_requested: false,
            config,
        }
    }

    /// Initialise the display from the settings
    pub fn start(&mut self) -> Result<(), Error<I>> {
        self.apply_settings()
    }

    /// Run the init sequence for the current settings, then restore contrast
    /// and inversion and draw the banner
    fn apply_settings(&mut self) -> Result<(), Error<I>> {
        let settings = *self.store.settings();
        self.display.reconfigure(settings.display_config())?;
        self.display.set_contrast(settings.brightness())?;
        self.display.invert(settings.inverted())?;
        self.interpreter.reset_line_state();

        if let Some(banner) = self.config.banner {
            let columns = usize::from(self.display.columns());
            for &byte in banner.as_bytes().iter().take(columns) {
                self.display.write_character(byte, true)?;
            }
            self.display.move_to_next_row(true)?;
        }
        Ok(())
    }

    /// Take in bytes from the host
    ///
    /// When the input buffer fills up, complete lines are processed to make
    /// room. A line longer than the buffer is cut: the rest of it is dropped
    /// and, once its LF arrives, the kept part is processed with a failed reply.
    pub fn receive(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.activity.pulse();
        }
        for &byte in data {
            if self.input.is_full() {
                self.process();
            }
            let was_corrupted = self.input.is_corrupted();
            if self.input.push(byte) {
                continue;
            }
            if byte == LF {
                let frame = self.framer.terminate(self.input.as_slice(), 0);
                self.execute(frame, true);
                self.input.clear();
                self.framer.reset();
            } else {
                if !was_corrupted {
                    warn!("input buffer full, dropping bytes until end of line");
                }
                self.framer.observe_dropped(byte);
            }
        }
    }

    /// Process every complete line in the input buffer
    ///
    /// Returns the number of lines processed.
    pub fn process(&mut self) -> usize {
        let mut start = 0;
        let mut lines = 0;
        while let Some(frame) = self.framer.next_line(self.input.as_slice(), start) {
            self.execute(frame, false);
            start = frame.next;
            lines += 1;
        }
        if start > 0 {
            self.input.compact(start);
            self.framer.consume(start);
        }
        lines
    }

    /// Move pending reply bytes into `out`; returns how many were written
    pub fn transmit(&mut self, out: &mut [u8]) -> usize {
        let count = self.output.drain(out);
        if count > 0 {
            self.activity.pulse();
        }
        count
    }

    /// Advance the activity countdown by one loop iteration
    pub fn tick(&mut self) {
        self.activity.tick();
    }

    /// One main loop iteration: receive, transmit, process, tick
    ///
    /// Returns the number of bytes written to `tx`.
    pub fn poll(&mut self, rx: &[u8], tx: &mut [u8]) -> usize {
        self.receive(rx);
        let sent = self.transmit(tx);
        self.process();
        self.tick();
        sent
    }

    /// Run one line and append its reply
    fn execute(&mut self, frame: Frame, truncated: bool) {
        let line = frame.content(self.input.as_slice());
        let mut ctx = Context {
            display: &mut self.display,
            store: &mut self.store,
            output: &mut self.output,
            effects: Effects::default(),
        };
        let mut ok = self.interpreter.process_line(line, &mut ctx) && !truncated;
        let effects = ctx.effects;

        if effects.reinit {
            if let Err(e) = self.apply_settings() {
                warn!("display re-initialisation failed: {e}");
                ok = false;
            }
        }
        if effects.reboot {
            info!("reboot requested");
            self.reboot_requested = true;
        }

        if !ok {
            self.output.push(b'!');
        }
        self.output.extend_from_slice(frame.terminator.bytes());
    }

    /// Whether a command asked for a device reset
    pub fn reboot_requested(&self) -> bool {
        self.reboot_requested
    }

    /// Whether the activity indicator should be lit
    ///
    /// Stays lit while the input buffer is dropping bytes.
    pub fn activity(&self) -> bool {
        self.activity.is_on() || self.input.is_corrupted()
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        self.store.settings()
    }

    /// Settings store
    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }

    /// Display driver
    pub fn display(&self) -> &Display<I> {
        &self.display
    }

    /// Mutable display driver
    pub fn display_mut(&mut self) -> &mut Display<I> {
        &mut self.display
    }

    /// Reply bytes not yet transmitted
    pub fn pending_output(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Number of buffered input bytes
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}
