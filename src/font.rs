//! Glyph rasterisation
//!
//! The SSD1306 stores pixels in 8 px tall pages where each byte is one pixel
//! column, least significant bit at the top. This module renders
//! `embedded-graphics` mono fonts into that layout:
//!
//! - single height cells are 8x8 px ([`FONT_5X8`], one page)
//! - double height cells are 8x16 px ([`FONT_8X13`], two pages, top page first)
//!
//! Only printable ASCII (`0x21..=0x7E`) produces pixels; everything else
//! renders as a blank cell.
//!
//! ## Example
//!
//! ```
//! use usb_oled::font::{large_glyph, small_glyph};
//!
//! assert!(small_glyph(b'A').iter().any(|&column| column != 0));
//! assert!(small_glyph(b' ').iter().all(|&column| column == 0));
//!
//! let (top, bottom) = large_glyph(b'|');
//! assert!(top.iter().any(|&c| c != 0) && bottom.iter().any(|&c| c != 0));
//! ```

use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_8X13};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use embedded_graphics_core::Pixel;
use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Point, Size};
use embedded_graphics_core::pixelcolor::BinaryColor;

use crate::config::CELL_SIZE;

/// Bytes in one single height glyph
pub const SMALL_GLYPH_LEN: usize = CELL_SIZE as usize;

/// Bytes in one double height glyph (top page followed by bottom page)
pub const LARGE_GLYPH_LEN: usize = 2 * CELL_SIZE as usize;

/// One 8 px wide character cell, up to 16 px tall
///
/// Each column is kept as a `u16` with bit `n` set for pixel row `n`, which
/// splits directly into the two SSD1306 pages.
struct Cell {
    columns: [u16; CELL_SIZE as usize],
    height: u32,
}

impl Cell {
    const fn new(height: u32) -> Self {
        Self {
            columns: [0; CELL_SIZE as usize],
            height,
        }
    }
}

impl OriginDimensions for Cell {
    fn size(&self) -> Size {
        Size::new(u32::from(CELL_SIZE), self.height)
    }
}

impl DrawTarget for Cell {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color.is_off() || point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as u32);
            if x < self.columns.len() && y < self.height {
                self.columns[x] |= 1 << y;
            }
        }
        Ok(())
    }
}

/// Whether `value` has a visible glyph
pub const fn is_drawable(value: u8) -> bool {
    value > b' ' && value < 0x7F
}

fn rasterize(value: u8, font: &MonoFont<'_>, height: u32) -> Cell {
    let mut cell = Cell::new(height);
    if !is_drawable(value) {
        return cell;
    }

    let text = [value];
    let Ok(text) = core::str::from_utf8(&text) else {
        return cell;
    };

    // Centre the font inside the cell
    let size = font.character_size;
    let offset = Point::new(
        (i32::from(CELL_SIZE) - size.width as i32).max(0) / 2,
        (height as i32 - size.height as i32).max(0) / 2,
    );
    let style = MonoTextStyle::new(font, BinaryColor::On);
    let Ok(_) = Text::with_baseline(text, offset, style, Baseline::Top).draw(&mut cell);
    cell
}

/// Render a single height (8x8) glyph
pub fn small_glyph(value: u8) -> [u8; SMALL_GLYPH_LEN] {
    let cell = rasterize(value, &FONT_5X8, u32::from(CELL_SIZE));
    let mut glyph = [0; SMALL_GLYPH_LEN];
    for (byte, column) in glyph.iter_mut().zip(cell.columns) {
        *byte = column as u8;
    }
    glyph
}

/// Render a double height (8x16) glyph as `(top page, bottom page)`
pub fn large_glyph(value: u8) -> ([u8; SMALL_GLYPH_LEN], [u8; SMALL_GLYPH_LEN]) {
    let cell = rasterize(value, &FONT_8X13, 2 * u32::from(CELL_SIZE));
    let mut top = [0; SMALL_GLYPH_LEN];
    let mut bottom = [0; SMALL_GLYPH_LEN];
    for (i, column) in cell.columns.iter().enumerate() {
        top[i] = (column & 0xFF) as u8;
        bottom[i] = (column >> 8) as u8;
    }
    (top, bottom)
}
