//! Test doubles: an I2C transcript transport and a fake SSD1306 panel

use alloc::vec::Vec;

use crate::command::{CONTROL_COMMAND, CONTROL_DATA};
use crate::interface::I2cTransport;

/// Error raised by [`MockBus`] when a byte is not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Nack,
}

/// One completed start..stop transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub address: u8,
    pub bytes: Vec<u8>,
}

/// Recording I2C transport that also drives a [`Panel`]
#[derive(Debug)]
pub struct MockBus {
    pub transactions: Vec<Transaction>,
    pub panel: Panel,
    pub stops: usize,
    pub in_transaction: bool,
    pub speed_khz: Option<u16>,
    /// Index within a transaction of the byte that is not acknowledged
    pub fail_on_byte: Option<usize>,
    /// Every transaction fails at the address byte
    pub offline: bool,
    current: Transaction,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            panel: Panel::new(),
            stops: 0,
            in_transaction: false,
            speed_khz: None,
            fail_on_byte: None,
            offline: false,
            current: Transaction {
                address: 0,
                bytes: Vec::new(),
            },
        }
    }

    /// Command transactions (without control byte) in the order sent
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.transactions
            .iter()
            .filter(|t| t.bytes.first() == Some(&CONTROL_COMMAND))
            .map(|t| t.bytes[1..].to_vec())
            .collect()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

impl I2cTransport for MockBus {
    type Error = MockError;

    fn start(&mut self, address: u8) -> Result<(), Self::Error> {
        self.in_transaction = true;
        self.current = Transaction {
            address,
            bytes: Vec::new(),
        };
        if self.offline {
            return Err(MockError::Nack);
        }
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        if self.fail_on_byte == Some(self.current.bytes.len()) {
            return Err(MockError::Nack);
        }
        self.current.bytes.push(value);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.in_transaction = false;
        self.stops += 1;
        let transaction = core::mem::replace(
            &mut self.current,
            Transaction {
                address: 0,
                bytes: Vec::new(),
            },
        );
        if !transaction.bytes.is_empty() {
            self.panel.apply(&transaction.bytes);
            self.transactions.push(transaction);
        }
        Ok(())
    }

    fn set_speed_khz(&mut self, khz: u16) -> Result<(), Self::Error> {
        self.speed_khz = Some(khz);
        Ok(())
    }
}

/// Fake SSD1306 in page addressing mode
#[derive(Debug)]
pub struct Panel {
    pub ram: [[u8; 128]; 8],
    pub page: usize,
    pub column: usize,
    pub contrast: Option<u8>,
    pub inverted: bool,
    pub on: bool,
    pub segment_remap: bool,
    pub com_decrement: bool,
    pub multiplex: Option<u8>,
}

impl Panel {
    pub fn new() -> Self {
        Self {
            ram: [[0xAA; 128]; 8],
            page: 0,
            column: 0,
            contrast: None,
            inverted: false,
            on: false,
            segment_remap: false,
            com_decrement: false,
            multiplex: None,
        }
    }

    fn apply(&mut self, bytes: &[u8]) {
        match bytes.split_first() {
            Some((&CONTROL_COMMAND, commands)) => self.apply_commands(commands),
            Some((&CONTROL_DATA, data)) => {
                for &byte in data {
                    self.ram[self.page][self.column] = byte;
                    self.column = (self.column + 1) % 128;
                }
            }
            _ => {}
        }
    }

    fn apply_commands(&mut self, commands: &[u8]) {
        let mut bytes = commands.iter().copied();
        while let Some(command) = bytes.next() {
            match command {
                0x00..=0x0F => self.column = (self.column & 0xF0) | (command & 0x0F) as usize,
                0x10..=0x1F => {
                    self.column = (self.column & 0x0F) | (((command & 0x0F) as usize) << 4);
                }
                0xB0..=0xB7 => self.page = (command & 0x07) as usize,
                0x81 => self.contrast = bytes.next(),
                0xA8 => self.multiplex = bytes.next(),
                0xA0 => self.segment_remap = false,
                0xA1 => self.segment_remap = true,
                0xC0 => self.com_decrement = false,
                0xC8 => self.com_decrement = true,
                0xA6 => self.inverted = false,
                0xA7 => self.inverted = true,
                0xAE => self.on = false,
                0xAF => self.on = true,
                0x20 | 0x8D | 0xD3 | 0xD5 | 0xD9 | 0xDA | 0xDB => {
                    bytes.next();
                }
                _ => {}
            }
        }
    }

    /// The 8 column bytes of the cell at a 0-based row/column
    pub fn cell(&self, row: usize, column: usize) -> [u8; 8] {
        let mut cell = [0; 8];
        cell.copy_from_slice(&self.ram[row][column * 8..column * 8 + 8]);
        cell
    }

    pub fn cell_is_blank(&self, row: usize, column: usize) -> bool {
        self.cell(row, column).iter().all(|&b| b == 0)
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.ram[row].iter().all(|&b| b == 0)
    }
}
