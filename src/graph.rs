//! Rolling bar graph
//!
//! Keeps the last 128 samples (one per pixel column) and draws the most recent
//! ones as bars growing up from the bottom of the cell.

use heapless::HistoryBuffer;

use crate::config::{CELL_SIZE, DISPLAY_WIDTH};
use crate::display::Display;
use crate::error::Error;
use crate::interface::DisplayInterface;

const HISTORY: usize = DISPLAY_WIDTH as usize;

/// Sample history for the bar graph
#[derive(Debug, Default)]
pub struct Graph {
    samples: HistoryBuffer<u8, HISTORY>,
}

impl Graph {
    /// Create an empty graph
    pub const fn new() -> Self {
        Self {
            samples: HistoryBuffer::new(),
        }
    }

    /// Append a sample, dropping the oldest once full
    pub fn push(&mut self, value: u8) {
        self.samples.write(value);
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was pushed yet
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Draw the newest `width * 8` samples at the cursor, newest on the right
    ///
    /// Small bars are 8 px tall, large ones span the cursor row and the row
    /// below. Columns without a sample stay blank. Cells are drawn left to
    /// right and drawing stops at the first cell that does not fit.
    pub fn draw<I>(&self, display: &mut Display<I>, width: u8, large: bool) -> Result<(), Error<I>>
    where
        I: DisplayInterface,
    {
        let columns = usize::from(width) * usize::from(CELL_SIZE);
        let columns = columns.min(HISTORY);

        // Right aligned: the newest sample sits in the last column
        let mut history = [None; HISTORY];
        let first = HISTORY - self.samples.len();
        for (slot, &value) in history[first..].iter_mut().zip(self.samples.oldest_ordered()) {
            *slot = Some(value);
        }

        for cell in history[HISTORY - columns..].chunks(usize::from(CELL_SIZE)) {
            let mut top = [0; CELL_SIZE as usize];
            let mut bottom = [0; CELL_SIZE as usize];
            for (i, sample) in cell.iter().enumerate() {
                let Some(value) = *sample else { continue };
                if large {
                    let bar = bar_mask_large(value);
                    top[i] = (bar & 0xFF) as u8;
                    bottom[i] = (bar >> 8) as u8;
                } else {
                    top[i] = bar_mask_small(value);
                }
            }
            display.write_cells(&top, large.then_some(&bottom[..]))?;
        }
        Ok(())
    }
}

/// Page byte for an 8 px bar, bit 7 being the bottom pixel
fn bar_mask_small(value: u8) -> u8 {
    let height = (value >> 5) + 1;
    0xFF << (8 - height)
}

/// Column bits for a 16 px bar, bit 15 being the bottom pixel
fn bar_mask_large(value: u8) -> u16 {
    let height = (value >> 4) + 1;
    0xFFFF << (16 - height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Builder;
    use crate::interface::Interface;
    use crate::mock::MockBus;

    fn test_display() -> Display<Interface<MockBus>> {
        let config = Builder::new().build().unwrap();
        let mut display = Display::new(Interface::new(MockBus::new(), 0x3C), config);
        display.init().unwrap();
        display
    }

    #[test]
    fn test_bar_heights() {
        assert_eq!(bar_mask_small(0x00), 0x80);
        assert_eq!(bar_mask_small(0x20), 0xC0);
        assert_eq!(bar_mask_small(0xFF), 0xFF);
        assert_eq!(bar_mask_large(0x00), 0x8000);
        assert_eq!(bar_mask_large(0x7F), 0xFF00);
        assert_eq!(bar_mask_large(0xFF), 0xFFFF);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut graph = Graph::new();
        for value in 0..200u8 {
            graph.push(value);
        }
        assert_eq!(graph.len(), 128);
    }

    #[test]
    fn test_empty_graph_draws_blank_cells() {
        let mut display = test_display();
        display.interface_mut().transport_mut().panel.ram[0].fill(0xFF);
        Graph::new().draw(&mut display, 2, false).unwrap();

        let panel = &display.interface().transport().panel;
        assert!(panel.cell_is_blank(0, 0));
        assert!(panel.cell_is_blank(0, 1));
        assert_eq!(display.cursor(), (0, 2));
    }

    #[test]
    fn test_newest_sample_is_rightmost() {
        let mut display = test_display();
        let mut graph = Graph::new();
        graph.push(0x00);
        graph.push(0xFF);
        graph.draw(&mut display, 1, false).unwrap();

        let cell = display.interface().transport().panel.cell(0, 0);
        assert_eq!(cell, [0, 0, 0, 0, 0, 0, 0x80, 0xFF]);
    }

    #[test]
    fn test_large_graph_uses_two_rows() {
        let mut display = test_display();
        let mut graph = Graph::new();
        graph.push(0xFF);
        graph.draw(&mut display, 1, true).unwrap();

        let panel = &display.interface().transport().panel;
        assert_eq!(panel.cell(0, 0)[7], 0xFF);
        assert_eq!(panel.cell(1, 0)[7], 0xFF);
        assert_eq!(panel.cell(1, 0)[6], 0x00);
    }

    #[test]
    fn test_draw_stops_at_right_edge() {
        let mut display = test_display();
        display.move_to(1, 16).unwrap();
        let result = Graph::new().draw(&mut display, 2, false);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
        assert_eq!(display.cursor(), (0, 16));
    }
}
