//! Protocol interpreter
//!
//! Every line is either a command or content, decided by its first byte.
//!
//! ## Content lines
//!
//! Leading prefix controls act once each:
//!
//! - BEL (`0x07`) clears the screen
//! - BS (`0x08`) moves the cursor home
//! - VT (`0x0B`) toggles double height text for the rest of the line
//! - FF (`0x0C`) clears the rest of the row once the text is written and moves
//!   to the next row
//!
//! The remaining bytes are drawn at the cursor. Control bytes past the prefix
//! fail the line but do not stop drawing. A line with no bytes at all moves to
//! the next row (two rows if the previous line was double height).
//!
//! ## Command lines
//!
//! An HT (`0x09`) followed by a one byte verb and its argument characters.
//! The verb set depends on the [`Revision`]; each verb is listed once per
//! accepted argument count, so the grammar is a table rather than code.
//!
//! ```
//! use usb_oled::protocol::{Op, Revision};
//!
//! let spec = Revision::Current.lookup(b'@', 2).unwrap();
//! assert_eq!(spec.op, Op::SetAddress);
//!
//! // Speed is an index digit in the older grammar
//! assert_eq!(Revision::Legacy.lookup(b'^', 1).unwrap().op, Op::SetSpeedIndex);
//! assert!(Revision::Current.lookup(b'^', 1).is_err());
//! ```

use log::debug;

use crate::buffer::OutputBuffer;
use crate::config::DisplayHeight;
use crate::display::Display;
use crate::error::{CommandError, Error};
use crate::graph::Graph;
use crate::hex::{decode_into, encode_byte};
use crate::interface::DisplayInterface;
use crate::settings::{SERIAL_LEN, Settings, SettingsStorage, SettingsStore};

/// BEL: clear the screen
pub const BEL: u8 = 0x07;
/// BS: cursor home
pub const BS: u8 = 0x08;
/// HT: command escape
pub const HT: u8 = 0x09;
/// VT: toggle double height text
pub const VT: u8 = 0x0B;
/// FF: clear to end of row after the text
pub const FF: u8 = 0x0C;

const VERSION_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
const VERSION_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");

/// Command grammar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Revision {
    /// Speed as a single index digit, raw serial number, transient invert
    /// verbs; every setting change is saved immediately
    Legacy,
    /// Speed in kHz, hex serial number, settings dump, explicit save and the
    /// bar graph; only the serial number is saved without asking
    #[default]
    Current,
}

/// What a command does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Reply `A` (64 px) or `B` (32 px)
    GetHeight,
    /// Set height from `A` or `B`
    SetHeight,
    /// Reply `I` (inverted) or `N`
    GetInvert,
    /// Set inversion from `I` or `N`
    SetInvert,
    /// Reply `F` (flipped) or `N`
    GetFlip,
    /// Set flip from `F` or `N`; the display is initialised again
    SetFlip,
    /// Request a device reset
    Reboot,
    /// Reply brightness as 2 hex digits
    GetBrightness,
    /// Set brightness from 2 hex digits
    SetBrightness,
    /// Reply I2C address as 2 hex digits
    GetAddress,
    /// Set I2C address from 2 hex digits
    SetAddress,
    /// Reply speed index digit (`1`-`9`, `0` for 10)
    GetSpeedIndex,
    /// Set speed from an index digit
    SetSpeedIndex,
    /// Reply speed in kHz as 4 hex digits
    GetSpeed,
    /// Set speed in kHz from 4 hex digits
    SetSpeed,
    /// Reply serial number as 16 hex digits
    GetSerial,
    /// Set serial number from 16 hex digits, save and reboot
    SetSerial,
    /// Reply serial number as 8 characters
    GetSerialRaw,
    /// Set serial number from 8 characters, save and reboot
    SetSerialRaw,
    /// Restore default settings
    FactoryReset,
    /// Draw a glyph from 16 or 32 hex digits
    DrawGlyph,
    /// Move to the start of a row (2 hex digits)
    MoveRow,
    /// Move to row and column (4 hex digits, `00` keeps the axis)
    MoveTo,
    /// Reply `MAJOR.MINOR`
    Version,
    /// Reply all settings on one line
    Dump,
    /// Save settings
    Save,
    /// Invert the screen until the next initialisation
    InvertNow,
    /// Show the screen normally until the next initialisation
    NormalNow,
    /// Append a graph sample (2 hex digits)
    GraphPush,
    /// Draw the graph (2 hex digits: bits 0-4 width, bit 7 large)
    GraphDraw,
}

impl Op {
    /// Whether the op changes a persisted setting
    const fn persists(self) -> bool {
        matches!(
            self,
            Self::SetHeight
                | Self::SetInvert
                | Self::SetFlip
                | Self::SetBrightness
                | Self::SetAddress
                | Self::SetSpeedIndex
                | Self::SetSpeed
                | Self::FactoryReset
        )
    }
}

/// One overload of a verb
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Verb byte
    pub verb: u8,
    /// Number of argument characters after the verb
    pub args: usize,
    /// Operation
    pub op: Op,
}

const fn spec(verb: u8, args: usize, op: Op) -> CommandSpec {
    CommandSpec { verb, args, op }
}

const LEGACY_COMMANDS: &[CommandSpec] = &[
    spec(b'#', 0, Op::GetHeight),
    spec(b'#', 1, Op::SetHeight),
    spec(b'$', 0, Op::GetInvert),
    spec(b'$', 1, Op::SetInvert),
    spec(b'=', 0, Op::GetFlip),
    spec(b'=', 1, Op::SetFlip),
    spec(b'%', 0, Op::Reboot),
    spec(b'*', 0, Op::GetBrightness),
    spec(b'*', 2, Op::SetBrightness),
    spec(b'@', 0, Op::GetAddress),
    spec(b'@', 2, Op::SetAddress),
    spec(b'^', 0, Op::GetSpeedIndex),
    spec(b'^', 1, Op::SetSpeedIndex),
    spec(b'`', 0, Op::GetSerialRaw),
    spec(b'`', 8, Op::SetSerialRaw),
    spec(b'~', 0, Op::FactoryReset),
    spec(b'c', 16, Op::DrawGlyph),
    spec(b'c', 32, Op::DrawGlyph),
    spec(b'C', 16, Op::DrawGlyph),
    spec(b'C', 32, Op::DrawGlyph),
    spec(b'i', 0, Op::InvertNow),
    spec(b'I', 0, Op::NormalNow),
    spec(b'm', 2, Op::MoveRow),
    spec(b'm', 4, Op::MoveTo),
    spec(b'V', 0, Op::Version),
];

const CURRENT_COMMANDS: &[CommandSpec] = &[
    spec(b'#', 0, Op::GetHeight),
    spec(b'#', 1, Op::SetHeight),
    spec(b'$', 0, Op::GetInvert),
    spec(b'$', 1, Op::SetInvert),
    spec(b'=', 0, Op::GetFlip),
    spec(b'=', 1, Op::SetFlip),
    spec(b'%', 0, Op::Reboot),
    spec(b'*', 0, Op::GetBrightness),
    spec(b'*', 2, Op::SetBrightness),
    spec(b'@', 0, Op::GetAddress),
    spec(b'@', 2, Op::SetAddress),
    spec(b'^', 0, Op::GetSpeed),
    spec(b'^', 4, Op::SetSpeed),
    spec(b'`', 0, Op::GetSerial),
    spec(b'`', 16, Op::SetSerial),
    spec(b'~', 0, Op::FactoryReset),
    spec(b'c', 16, Op::DrawGlyph),
    spec(b'c', 32, Op::DrawGlyph),
    spec(b'C', 16, Op::DrawGlyph),
    spec(b'C', 32, Op::DrawGlyph),
    spec(b'm', 2, Op::MoveRow),
    spec(b'm', 4, Op::MoveTo),
    spec(b'V', 0, Op::Version),
    spec(b'?', 0, Op::Dump),
    spec(b's', 0, Op::Save),
    spec(b'g', 2, Op::GraphPush),
    spec(b'G', 2, Op::GraphDraw),
];

impl Revision {
    /// Command table of this revision
    pub const fn commands(self) -> &'static [CommandSpec] {
        match self {
            Self::Legacy => LEGACY_COMMANDS,
            Self::Current => CURRENT_COMMANDS,
        }
    }

    /// Find the overload of `verb` taking `args` argument characters
    pub fn lookup(self, verb: u8, args: usize) -> Result<&'static CommandSpec, CommandError> {
        let mut known = false;
        for spec in self.commands().iter().filter(|spec| spec.verb == verb) {
            if spec.args == args {
                return Ok(spec);
            }
            known = true;
        }
        Err(if known {
            CommandError::ArgumentCount {
                verb,
                provided: args,
            }
        } else {
            CommandError::UnknownVerb(verb)
        })
    }

    /// Whether setting changes are saved as soon as they are made
    pub const fn autosave(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

/// Side effects the caller carries out once the line is answered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Effects {
    /// Settings that the init sequence depends on changed
    pub reinit: bool,
    /// The device should reset
    pub reboot: bool,
}

/// Everything a line can act on
pub struct Context<'a, I, S, const N: usize>
where
    I: DisplayInterface,
{
    /// Display driver
    pub display: &'a mut Display<I>,
    /// Settings and their storage
    pub store: &'a mut SettingsStore<S>,
    /// Reply buffer
    pub output: &'a mut OutputBuffer<N>,
    /// Collected side effects
    pub effects: Effects,
}

/// Line interpreter
#[derive(Debug, Default)]
pub struct Interpreter {
    revision: Revision,
    /// The last content line used double height text
    last_large: bool,
    graph: Graph,
}

impl Interpreter {
    /// Create an interpreter for a command grammar
    pub const fn new(revision: Revision) -> Self {
        Self {
            revision,
            last_large: false,
            graph: Graph::new(),
        }
    }

    /// Active command grammar
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Whether the last content line used double height text
    pub fn last_large(&self) -> bool {
        self.last_large
    }

    /// Forget the double height state of the previous line
    pub fn reset_line_state(&mut self) {
        self.last_large = false;
    }

    /// Execute one line (terminator excluded)
    ///
    /// Returns `false` if any part of it failed. Effects of the parts that
    /// ran before a failure are kept.
    pub fn process_line<I, S, const N: usize>(
        &mut self,
        line: &[u8],
        ctx: &mut Context<'_, I, S, N>,
    ) -> bool
    where
        I: DisplayInterface,
        S: SettingsStorage,
    {
        match line.split_first() {
            Some((&HT, body)) => match self.process_command(body, ctx) {
                Ok(()) => true,
                Err(e) => {
                    debug!("command failed: {e}");
                    false
                }
            },
            _ => self.process_content(line, ctx.display),
        }
    }

    fn process_content<I>(&mut self, line: &[u8], display: &mut Display<I>) -> bool
    where
        I: DisplayInterface,
    {
        if line.is_empty() {
            let large = core::mem::take(&mut self.last_large);
            return display
                .move_to_next_row(large)
                .map_err(|e| debug!("advance failed: {e}"))
                .is_ok();
        }

        let mut ok = true;
        let mut large = false;
        let mut clear_to_end = false;

        let mut text = line;
        while let Some((&byte, rest)) = text.split_first() {
            match byte {
                BEL => ok &= display.clear_all().map_err(|e| debug!("clear failed: {e}")).is_ok(),
                BS => display.home(),
                VT => large = !large,
                FF => clear_to_end = true,
                _ => break,
            }
            text = rest;
        }

        for &byte in text {
            if byte < b' ' {
                debug!("control byte 0x{byte:02X} inside text");
                ok = false;
                continue;
            }
            if let Err(e) = display.write_character(byte, large) {
                debug!("write failed: {e}");
                ok = false;
            }
        }

        if clear_to_end {
            if let Err(e) = display.clear_remaining(large) {
                debug!("clear to end failed: {e}");
                ok = false;
            }
            self.last_large = false;
        } else {
            self.last_large = large;
        }
        ok
    }

    fn process_command<I, S, const N: usize>(
        &mut self,
        body: &[u8],
        ctx: &mut Context<'_, I, S, N>,
    ) -> Result<(), CommandError>
    where
        I: DisplayInterface,
        S: SettingsStorage,
    {
        let (&verb, args) = body.split_first().ok_or(CommandError::MissingVerb)?;
        let op = self.revision.lookup(verb, args.len())?.op;
        self.execute(op, args, ctx)?;
        if op.persists() && self.revision.autosave() {
            ctx.store.save()?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn execute<I, S, const N: usize>(
        &mut self,
        op: Op,
        args: &[u8],
        ctx: &mut Context<'_, I, S, N>,
    ) -> Result<(), CommandError>
    where
        I: DisplayInterface,
        S: SettingsStorage,
    {
        let settings = *ctx.store.settings();
        match op {
            Op::GetHeight => reply(ctx.output, &[match settings.height() {
                DisplayHeight::Px64 => b'A',
                DisplayHeight::Px32 => b'B',
            }])?,
            Op::SetHeight => {
                let height = match args[0] {
                    b'A' => DisplayHeight::Px64,
                    b'B' => DisplayHeight::Px32,
                    _ => return Err(CommandError::InvalidValue),
                };
                ctx.store.settings_mut().set_height(height);
                ctx.effects.reinit = true;
            }
            Op::GetInvert => reply(ctx.output, &[if settings.inverted() { b'I' } else { b'N' }])?,
            Op::SetInvert => {
                let inverted = flag(args[0], b'I')?;
                ctx.store.settings_mut().set_inverted(inverted);
                ctx.display.invert(inverted).map_err(display_failed)?;
            }
            Op::GetFlip => reply(ctx.output, &[if settings.flipped() { b'F' } else { b'N' }])?,
            Op::SetFlip => {
                let flipped = flag(args[0], b'F')?;
                ctx.store.settings_mut().set_flipped(flipped);
                ctx.effects.reinit = true;
            }
            Op::Reboot => ctx.effects.reboot = true,
            Op::GetBrightness => reply(ctx.output, &encode_byte(settings.brightness()))?,
            Op::SetBrightness => {
                let [brightness] = decode::<1>(args)?;
                ctx.store.settings_mut().set_brightness(brightness);
                ctx.display
                    .set_contrast(brightness)
                    .map_err(display_failed)?;
            }
            Op::GetAddress => reply(ctx.output, &encode_byte(settings.address()))?,
            Op::SetAddress => {
                let [address] = decode::<1>(args)?;
                if !(0x01..=0x7F).contains(&address) {
                    return Err(CommandError::InvalidValue);
                }
                ctx.store.settings_mut().set_address(address);
                ctx.effects.reinit = true;
            }
            Op::GetSpeedIndex => {
                let digit = match settings.speed_index() {
                    10 => b'0',
                    index => b'0' + index,
                };
                reply(ctx.output, &[digit])?;
            }
            Op::SetSpeedIndex => {
                let index = match args[0] {
                    b'0' => 10,
                    digit @ b'1'..=b'9' => digit - b'0',
                    _ => return Err(CommandError::InvalidValue),
                };
                ctx.store.settings_mut().set_speed_index(index);
                ctx.effects.reinit = true;
            }
            Op::GetSpeed => {
                let [high, low] = settings.speed_khz().to_be_bytes();
                let [a, b] = encode_byte(high);
                let [c, d] = encode_byte(low);
                reply(ctx.output, &[a, b, c, d])?;
            }
            Op::SetSpeed => {
                let khz = u16::from_be_bytes(decode::<2>(args)?);
                if !(1..=crate::config::MAX_SPEED_KHZ).contains(&khz) {
                    return Err(CommandError::InvalidValue);
                }
                ctx.store.settings_mut().set_speed_khz(khz);
                ctx.effects.reinit = true;
            }
            Op::GetSerial => {
                check_room(ctx.output)?;
                if let Some(serial) = settings.serial() {
                    for &byte in serial {
                        ctx.output.extend_from_slice(&encode_byte(byte));
                    }
                }
            }
            Op::GetSerialRaw => {
                check_room(ctx.output)?;
                if let Some(serial) = settings.serial() {
                    ctx.output.extend_from_slice(serial);
                }
            }
            Op::SetSerial => store_serial(decode::<SERIAL_LEN>(args)?, ctx)?,
            Op::SetSerialRaw => {
                let mut serial = [0; SERIAL_LEN];
                serial.copy_from_slice(args);
                store_serial(serial, ctx)?;
            }
            Op::FactoryReset => {
                ctx.store.settings_mut().restore_defaults();
                ctx.effects.reinit = true;
            }
            Op::DrawGlyph => {
                let mut glyph = [0; 16];
                let count = decode_into(args, &mut glyph)?;
                ctx.display
                    .draw_character(&glyph[..count])
                    .map_err(display_failed)?;
            }
            Op::MoveRow => {
                let [row] = decode::<1>(args)?;
                ctx.display.move_to(row, 1).map_err(display_failed)?;
            }
            Op::MoveTo => {
                let [row, column] = decode::<2>(args)?;
                ctx.display.move_to(row, column).map_err(display_failed)?;
            }
            Op::Version => {
                check_room(ctx.output)?;
                ctx.output.extend_from_slice(VERSION_MAJOR.as_bytes());
                ctx.output.push(b'.');
                ctx.output.extend_from_slice(VERSION_MINOR.as_bytes());
            }
            Op::Dump => {
                check_room(ctx.output)?;
                dump(ctx.output, &settings);
            }
            Op::Save => ctx.store.save()?,
            Op::InvertNow => ctx.display.invert(true).map_err(display_failed)?,
            Op::NormalNow => ctx.display.invert(false).map_err(display_failed)?,
            Op::GraphPush => {
                let [value] = decode::<1>(args)?;
                self.graph.push(value);
            }
            Op::GraphDraw => {
                let [options] = decode::<1>(args)?;
                let width = options & 0x1F;
                if !(1..=16).contains(&width) {
                    return Err(CommandError::InvalidValue);
                }
                self.graph
                    .draw(ctx.display, width, options & 0x80 != 0)
                    .map_err(display_failed)?;
            }
        }
        Ok(())
    }
}

/// Store a new serial number; it only takes effect after a reset
fn store_serial<I, S, const N: usize>(
    serial: [u8; SERIAL_LEN],
    ctx: &mut Context<'_, I, S, N>,
) -> Result<(), CommandError>
where
    I: DisplayInterface,
    S: SettingsStorage,
{
    if !serial.iter().all(|byte| (0x20..0x7F).contains(byte)) {
        return Err(CommandError::InvalidValue);
    }
    ctx.store.settings_mut().set_serial(serial);
    ctx.store.save()?;
    ctx.effects.reboot = true;
    Ok(())
}

/// Refuse to produce data once the reply buffer is above its watermark
fn check_room<const N: usize>(output: &OutputBuffer<N>) -> Result<(), CommandError> {
    if output.is_above_watermark() {
        return Err(CommandError::OutputFull);
    }
    Ok(())
}

fn reply<const N: usize>(output: &mut OutputBuffer<N>, bytes: &[u8]) -> Result<(), CommandError> {
    check_room(output)?;
    output.extend_from_slice(bytes);
    Ok(())
}

/// `@AA ^SSSS #H *BB $I =F`
fn dump<const N: usize>(output: &mut OutputBuffer<N>, settings: &Settings) {
    let [speed_high, speed_low] = settings.speed_khz().to_be_bytes();
    output.push(b'@');
    output.extend_from_slice(&encode_byte(settings.address()));
    output.extend_from_slice(b" ^");
    output.extend_from_slice(&encode_byte(speed_high));
    output.extend_from_slice(&encode_byte(speed_low));
    output.extend_from_slice(b" #");
    output.push(match settings.height() {
        DisplayHeight::Px64 => b'A',
        DisplayHeight::Px32 => b'B',
    });
    output.extend_from_slice(b" *");
    output.extend_from_slice(&encode_byte(settings.brightness()));
    output.extend_from_slice(b" $");
    output.push(if settings.inverted() { b'I' } else { b'N' });
    output.extend_from_slice(b" =");
    output.push(if settings.flipped() { b'F' } else { b'N' });
}

/// Decode exactly `M` bytes of hex arguments
fn decode<const M: usize>(args: &[u8]) -> Result<[u8; M], CommandError> {
    let mut bytes = [0; M];
    if decode_into(args, &mut bytes)? != M {
        return Err(CommandError::InvalidValue);
    }
    Ok(bytes)
}

/// `on` letter means true, `N` false
fn flag(value: u8, on: u8) -> Result<bool, CommandError> {
    match value {
        b'N' => Ok(false),
        value if value == on => Ok(true),
        _ => Err(CommandError::InvalidValue),
    }
}

fn display_failed<I: DisplayInterface>(error: Error<I>) -> CommandError {
    debug!("display: {error}");
    CommandError::Display
}
