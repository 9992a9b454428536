//! Core display operations
//!
//! [`Display`] owns the text cursor and the panel geometry. The screen is a
//! grid of 8x8 px character cells: 16 columns by 4 or 8 rows, one row per
//! SSD1306 page. Double height glyphs span the cursor row and the row below.

use log::{debug, info};

use crate::command::{
    ADDRESSING_MODE_PAGE, CHARGE_PUMP_ENABLE, ENTIRE_DISPLAY_ON_RESUME, SET_CHARGE_PUMP,
    SET_CLOCK_DIVIDE, SET_COM_PINS, SET_COM_SCAN_DECREMENT, SET_COM_SCAN_INCREMENT, SET_CONTRAST,
    SET_DISPLAY_OFF, SET_DISPLAY_OFFSET, SET_DISPLAY_ON, SET_DISPLAY_START_LINE,
    SET_INVERSE_DISPLAY, SET_LOWER_COLUMN, SET_MEMORY_ADDRESSING_MODE, SET_MULTIPLEX_RATIO,
    SET_NORMAL_DISPLAY, SET_PAGE_START, SET_PRECHARGE_PERIOD, SET_SEGMENT_REMAP_NORMAL,
    SET_SEGMENT_REMAP_REVERSED, SET_UPPER_COLUMN, SET_VCOMH_DESELECT,
};
use crate::config::{CELL_SIZE, Config, Dimensions, DisplayHeight};
use crate::error::Error;
use crate::font::{LARGE_GLYPH_LEN, SMALL_GLYPH_LEN, large_glyph, small_glyph};
use crate::interface::DisplayInterface;

type DisplayResult<I, T = ()> = core::result::Result<T, Error<I>>;

/// Text mode driver for an SSD1306 panel
///
/// Cursor coordinates are 0-based internally; [`Display::move_to`] takes the
/// 1-based coordinates of the wire protocol.
pub struct Display<I>
where
    I: DisplayInterface,
{
    /// Hardware interface
    interface: I,
    /// Display configuration
    config: Config,
    /// Cursor row (page)
    row: u8,
    /// Cursor column in cells; equals `columns()` once a row is written full
    column: u8,
}

impl<I> Display<I>
where
    I: DisplayInterface,
{
    /// Create a new Display instance
    ///
    /// Nothing is sent until [`Display::init`].
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            interface,
            config,
            row: 0,
            column: 0,
        }
    }

    /// Configure the bus and run the controller initialisation sequence
    ///
    /// Leaves the screen cleared, switched on and the cursor at home. Contrast
    /// and inversion are reset to the panel defaults.
    pub fn init(&mut self) -> DisplayResult<I> {
        self.interface.set_address(self.config.address);
        self.interface
            .set_speed_khz(self.config.speed_khz)
            .map_err(Error::Interface)?;

        let height = self.config.dimensions.height;
        self.command(&[SET_DISPLAY_OFF])?;
        self.command(&[SET_CLOCK_DIVIDE, 0x80])?;
        self.command(&[SET_MULTIPLEX_RATIO, height.pixels() - 1])?;
        self.command(&[SET_DISPLAY_OFFSET, 0x00])?;
        self.command(&[SET_DISPLAY_START_LINE])?;
        self.command(&[SET_CHARGE_PUMP, CHARGE_PUMP_ENABLE])?;
        self.send_orientation(self.config.flip)?;
        match height {
            DisplayHeight::Px32 => {
                self.command(&[SET_COM_PINS, 0x02])?;
                self.command(&[SET_CONTRAST, 0x8F])?;
            }
            DisplayHeight::Px64 => {
                self.command(&[SET_COM_PINS, 0x12])?;
                self.command(&[SET_CONTRAST, 0xCF])?;
            }
        }
        self.command(&[SET_PRECHARGE_PERIOD, 0xF1])?;
        self.command(&[SET_VCOMH_DESELECT, 0x40])?;
        self.command(&[ENTIRE_DISPLAY_ON_RESUME])?;
        self.command(&[SET_NORMAL_DISPLAY])?;
        self.command(&[SET_MEMORY_ADDRESSING_MODE, ADDRESSING_MODE_PAGE])?;
        self.clear_all()?;
        self.command(&[SET_DISPLAY_ON])?;

        info!(
            "display initialised: address 0x{:02X}, {} kHz, 128x{}",
            self.config.address,
            self.config.speed_khz,
            height.pixels()
        );
        Ok(())
    }

    /// Replace the configuration and initialise again
    pub fn reconfigure(&mut self, config: Config) -> DisplayResult<I> {
        self.config = config;
        self.row = 0;
        self.column = 0;
        self.init()
    }

    /// Move the cursor to a 1-based `(row, column)`
    ///
    /// `0` keeps the current value for that axis.
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfBounds` if a given coordinate is past the display;
    /// the cursor is left unchanged.
    pub fn move_to(&mut self, row: u8, column: u8) -> DisplayResult<I> {
        let new_row = if row == 0 { self.row } else { row - 1 };
        let new_column = if column == 0 { self.column } else { column - 1 };
        if (row != 0 && new_row >= self.rows()) || (column != 0 && new_column >= self.columns())
        {
            return Err(Error::OutOfBounds {
                row: new_row,
                column: new_column,
            });
        }
        self.row = new_row;
        self.column = new_column;
        Ok(())
    }

    /// Move the cursor to the top left cell
    pub fn home(&mut self) {
        self.row = 0;
        self.column = 0;
    }

    /// Move to the first column of the next row, or the one after when the
    /// current row holds double height text
    ///
    /// # Errors
    ///
    /// Returns `Error::PageFull` when there is no such row; the cursor is left
    /// unchanged.
    pub fn move_to_next_row(&mut self, is_large: bool) -> DisplayResult<I> {
        let next = self.row + if is_large { 2 } else { 1 };
        if next >= self.rows() {
            return Err(Error::PageFull);
        }
        self.row = next;
        self.column = 0;
        Ok(())
    }

    /// Render one character at the cursor and advance the column
    ///
    /// Values outside printable ASCII render as a blank cell.
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfBounds` if the cursor is past the last column, or
    /// on the last row for double height text.
    pub fn write_character(&mut self, value: u8, is_large: bool) -> DisplayResult<I> {
        if is_large {
            let (top, bottom) = large_glyph(value);
            self.write_cells(&top, Some(&bottom))
        } else {
            self.write_cells(&small_glyph(value), None)
        }
    }

    /// Render each byte of `text` with [`Display::write_character`]
    ///
    /// Stops at the first failure.
    pub fn write_text(&mut self, text: &[u8], is_large: bool) -> DisplayResult<I> {
        text.iter()
            .try_for_each(|&value| self.write_character(value, is_large))
    }

    /// Write a caller supplied glyph at the cursor and advance the column
    ///
    /// 8 bytes draw a single height cell, 16 bytes a double height cell (first
    /// 8 bytes on the cursor row, last 8 on the row below).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGlyphLength` for any other length and
    /// `Error::OutOfBounds` as for [`Display::write_character`].
    pub fn draw_character(&mut self, glyph: &[u8]) -> DisplayResult<I> {
        match glyph.len() {
            SMALL_GLYPH_LEN => self.write_cells(glyph, None),
            LARGE_GLYPH_LEN => {
                let (top, bottom) = glyph.split_at(SMALL_GLYPH_LEN);
                self.write_cells(top, Some(bottom))
            }
            provided => Err(Error::InvalidGlyphLength { provided }),
        }
    }

    /// Write raw page columns at the cursor and advance past them
    ///
    /// `top` goes to the cursor row, `bottom` (same length) to the row below.
    /// The length must be a whole number of cells.
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfBounds` if the cells do not fit on the row or the
    /// bottom half has no row to go to.
    pub fn write_cells(&mut self, top: &[u8], bottom: Option<&[u8]>) -> DisplayResult<I> {
        let cells = (top.len() / CELL_SIZE as usize) as u8;
        let fits_row = top.len() % CELL_SIZE as usize == 0
            && u16::from(self.column) + u16::from(cells) <= u16::from(self.columns());
        let fits_rows = bottom.is_none() || self.row + 1 < self.rows();
        if cells == 0 || !fits_row || !fits_rows {
            return Err(Error::OutOfBounds {
                row: self.row,
                column: self.column,
            });
        }

        self.set_address(self.row, self.column)?;
        self.data(top)?;
        if let Some(bottom) = bottom {
            self.set_address(self.row + 1, self.column)?;
            self.data(bottom)?;
        }
        self.column += cells;
        Ok(())
    }

    /// Zero the whole screen and move the cursor home
    pub fn clear_all(&mut self) -> DisplayResult<I> {
        for row in 0..self.rows() {
            self.clear_columns(row, 0)?;
        }
        self.home();
        Ok(())
    }

    /// Zero one row, leaving the cursor where it is
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfBounds` if `row` (0-based) is past the display.
    pub fn clear_row(&mut self, row: u8) -> DisplayResult<I> {
        if row >= self.rows() {
            return Err(Error::OutOfBounds { row, column: 0 });
        }
        self.clear_columns(row, 0)
    }

    /// Zero the cursor row from the cursor to its end (and the row below for
    /// double height text), then move to the start of the following row
    ///
    /// Without a following row the cursor stays on its row, past the last
    /// column, so further characters on this line fail.
    pub fn clear_remaining(&mut self, is_large: bool) -> DisplayResult<I> {
        if self.column < self.columns() {
            self.clear_columns(self.row, self.column)?;
            if is_large && self.row + 1 < self.rows() {
                self.clear_columns(self.row + 1, self.column)?;
            }
        }
        if self.move_to_next_row(is_large).is_err() {
            self.column = self.columns();
        }
        Ok(())
    }

    /// Set the contrast register
    pub fn set_contrast(&mut self, contrast: u8) -> DisplayResult<I> {
        self.command(&[SET_CONTRAST, contrast])
    }

    /// Show pixels inverted (`true`) or normal
    pub fn invert(&mut self, inverted: bool) -> DisplayResult<I> {
        let command = if inverted {
            SET_INVERSE_DISPLAY
        } else {
            SET_NORMAL_DISPLAY
        };
        self.command(&[command])
    }

    /// Rotate the picture by 180 degrees (`true`) or show it upright
    ///
    /// The segment remap only applies to RAM written afterwards, so the screen
    /// should be redrawn (or [`Display::reconfigure`]d) after a change.
    pub fn flip(&mut self, flip: bool) -> DisplayResult<I> {
        self.send_orientation(flip)?;
        self.config.flip = flip;
        Ok(())
    }

    /// Switch the panel on or off; display RAM is kept
    pub fn set_power(&mut self, on: bool) -> DisplayResult<I> {
        self.command(&[if on { SET_DISPLAY_ON } else { SET_DISPLAY_OFF }])
    }

    /// Cursor position as 0-based `(row, column)`
    pub fn cursor(&self) -> (u8, u8) {
        (self.row, self.column)
    }

    /// Number of text rows
    pub fn rows(&self) -> u8 {
        self.config.dimensions.rows()
    }

    /// Number of text columns
    pub fn columns(&self) -> u8 {
        self.config.dimensions.columns()
    }

    /// Get display dimensions
    pub fn dimensions(&self) -> &Dimensions {
        &self.config.dimensions
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Mutably borrow the interface
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give the interface back
    pub fn release(self) -> I {
        self.interface
    }

    fn send_orientation(&mut self, flip: bool) -> DisplayResult<I> {
        let (remap, scan) = if flip {
            (SET_SEGMENT_REMAP_NORMAL, SET_COM_SCAN_INCREMENT)
        } else {
            (SET_SEGMENT_REMAP_REVERSED, SET_COM_SCAN_DECREMENT)
        };
        self.command(&[remap])?;
        self.command(&[scan])
    }

    /// Point the RAM address at a cell
    fn set_address(&mut self, row: u8, column: u8) -> DisplayResult<I> {
        let x = column * CELL_SIZE;
        self.command(&[
            SET_PAGE_START | (row & 0x07),
            SET_LOWER_COLUMN | (x & 0x0F),
            SET_UPPER_COLUMN | (x >> 4),
        ])
    }

    fn clear_columns(&mut self, row: u8, column: u8) -> DisplayResult<I> {
        self.set_address(row, column)?;
        let count = usize::from(self.columns() - column) * usize::from(CELL_SIZE);
        self.interface
            .send_fill(0x00, count)
            .map_err(Error::Interface)
    }

    fn command(&mut self, commands: &[u8]) -> DisplayResult<I> {
        self.interface.send_commands(commands).map_err(|e| {
            debug!("command 0x{:02X} failed: {e:?}", commands.first().copied().unwrap_or(0));
            Error::Interface(e)
        })
    }

    fn data(&mut self, data: &[u8]) -> DisplayResult<I> {
        self.interface.send_data(data).map_err(Error::Interface)
    }
}
