//! Persistent device settings
//!
//! [`Settings`] keeps the raw values as they are stored; the getters substitute
//! defaults for anything invalid, so a blank or half written record still
//! yields a working configuration.
//!
//! The record is 16 bytes:
//!
//! | Offset | Field                                       |
//! |--------|---------------------------------------------|
//! | 0      | magic `0xA5`                                |
//! | 1      | I2C address                                 |
//! | 2..4   | I2C speed in kHz, little endian             |
//! | 4      | display height in pixels                    |
//! | 5      | brightness                                  |
//! | 6      | flags: bit 0 invert, bit 1 flip             |
//! | 7      | reserved                                    |
//! | 8..16  | USB serial number (printable ASCII)         |
//!
//! A record without the magic byte (erased flash) loads as all defaults.

use core::fmt::Debug;

use log::{info, warn};

use crate::config::{
    Config, DEFAULT_ADDRESS, DEFAULT_SPEED_KHZ, Dimensions, DisplayHeight, MAX_SPEED_KHZ,
};
use crate::error::StorageError;

/// Size of the persisted record in bytes
pub const RECORD_SIZE: usize = 16;

/// First byte of a written record
pub const MAGIC: u8 = 0xA5;

/// Length of the USB serial number
pub const SERIAL_LEN: usize = 8;

/// Contrast used when nothing else was configured
pub const DEFAULT_BRIGHTNESS: u8 = 0xCF;

const FLAG_INVERT: u8 = 0x01;
const FLAG_FLIP: u8 = 0x02;

/// Device settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    address: u8,
    speed_khz: u16,
    height: u8,
    brightness: u8,
    invert: bool,
    flip: bool,
    serial: [u8; SERIAL_LEN],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            speed_khz: DEFAULT_SPEED_KHZ,
            height: DisplayHeight::Px64.pixels(),
            brightness: DEFAULT_BRIGHTNESS,
            invert: false,
            flip: false,
            serial: [0xFF; SERIAL_LEN],
        }
    }
}

impl Settings {
    /// 7-bit I2C address of the display
    pub fn address(&self) -> u8 {
        match self.address {
            0 | 0x80..=u8::MAX => DEFAULT_ADDRESS,
            address => address,
        }
    }

    /// Set the I2C address
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// I2C bus speed in kHz
    pub fn speed_khz(&self) -> u16 {
        if self.speed_khz == 0 || self.speed_khz > MAX_SPEED_KHZ {
            DEFAULT_SPEED_KHZ
        } else {
            self.speed_khz
        }
    }

    /// Set the I2C bus speed in kHz
    pub fn set_speed_khz(&mut self, khz: u16) {
        self.speed_khz = khz;
    }

    /// Bus speed as an index of 100 kHz steps (1..=10)
    pub fn speed_index(&self) -> u8 {
        ((self.speed_khz() + 50) / 100).clamp(1, 10) as u8
    }

    /// Set the bus speed from an index of 100 kHz steps
    pub fn set_speed_index(&mut self, index: u8) {
        self.speed_khz = u16::from(index) * 100;
    }

    /// Panel height
    pub fn height(&self) -> DisplayHeight {
        DisplayHeight::from_pixels(self.height).unwrap_or_default()
    }

    /// Set the panel height
    pub fn set_height(&mut self, height: DisplayHeight) {
        self.height = height.pixels();
    }

    /// Contrast register value
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Set the contrast register value
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Whether the display starts inverted
    pub fn inverted(&self) -> bool {
        self.invert
    }

    /// Set whether the display starts inverted
    pub fn set_inverted(&mut self, inverted: bool) {
        self.invert = inverted;
    }

    /// Whether the picture is rotated by 180 degrees
    pub fn flipped(&self) -> bool {
        self.flip
    }

    /// Set whether the picture is rotated by 180 degrees
    pub fn set_flipped(&mut self, flipped: bool) {
        self.flip = flipped;
    }

    /// USB serial number, if one was set
    pub fn serial(&self) -> Option<&[u8; SERIAL_LEN]> {
        self.serial
            .iter()
            .all(|byte| (0x20..0x7F).contains(byte))
            .then_some(&self.serial)
    }

    /// Set the USB serial number
    pub fn set_serial(&mut self, serial: [u8; SERIAL_LEN]) {
        self.serial = serial;
    }

    /// Return every setting except the serial number to its default
    pub fn restore_defaults(&mut self) {
        *self = Self {
            serial: self.serial,
            ..Self::default()
        };
    }

    /// Display configuration described by these settings
    pub fn display_config(&self) -> Config {
        Config {
            address: self.address(),
            speed_khz: self.speed_khz(),
            dimensions: Dimensions::new(self.height()),
            flip: self.flipped(),
        }
    }

    /// Encode as a persisted record
    pub fn to_record(&self) -> [u8; RECORD_SIZE] {
        let mut record = [0; RECORD_SIZE];
        record[0] = MAGIC;
        record[1] = self.address;
        record[2..4].copy_from_slice(&self.speed_khz.to_le_bytes());
        record[4] = self.height;
        record[5] = self.brightness;
        let mut flags = 0;
        if self.invert {
            flags |= FLAG_INVERT;
        }
        if self.flip {
            flags |= FLAG_FLIP;
        }
        record[6] = flags;
        record[8..].copy_from_slice(&self.serial);
        record
    }

    /// Decode a persisted record; anything without the magic byte is defaults
    pub fn from_record(record: &[u8; RECORD_SIZE]) -> Self {
        if record[0] != MAGIC {
            return Self::default();
        }
        let mut serial = [0; SERIAL_LEN];
        serial.copy_from_slice(&record[8..]);
        Self {
            address: record[1],
            speed_khz: u16::from_le_bytes([record[2], record[3]]),
            height: record[4],
            brightness: record[5],
            invert: record[6] & FLAG_INVERT != 0,
            flip: record[6] & FLAG_FLIP != 0,
            serial,
        }
    }
}

/// Non-volatile storage for the settings record
pub trait SettingsStorage {
    /// Error type for storage operations
    type Error: Debug;

    /// Read the record
    fn read(&mut self, record: &mut [u8; RECORD_SIZE]) -> Result<(), Self::Error>;

    /// Erase and program the record
    fn write(&mut self, record: &[u8; RECORD_SIZE]) -> Result<(), Self::Error>;
}

/// RAM backed [`SettingsStorage`]
///
/// Starts out erased (all `0xFF`). Useful on hosts and in tests.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    record: [u8; RECORD_SIZE],
    writes: usize,
    fail: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create erased storage
    pub const fn new() -> Self {
        Self {
            record: [0xFF; RECORD_SIZE],
            writes: 0,
            fail: false,
        }
    }

    /// Create storage holding `record`
    pub const fn with_record(record: [u8; RECORD_SIZE]) -> Self {
        Self {
            record,
            writes: 0,
            fail: false,
        }
    }

    /// Stored bytes
    pub fn record(&self) -> &[u8; RECORD_SIZE] {
        &self.record
    }

    /// Number of completed writes
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Make every following read and write fail
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl SettingsStorage for MemoryStorage {
    type Error = StorageError;

    fn read(&mut self, record: &mut [u8; RECORD_SIZE]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(StorageError::Read);
        }
        *record = self.record;
        Ok(())
    }

    fn write(&mut self, record: &[u8; RECORD_SIZE]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(StorageError::Write);
        }
        self.record = *record;
        self.writes += 1;
        Ok(())
    }
}

/// Settings together with the storage they persist to
#[derive(Debug)]
pub struct SettingsStore<S> {
    storage: S,
    settings: Settings,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Load settings from `storage`
    ///
    /// A failed read is logged and leaves the defaults in place.
    pub fn load(mut storage: S) -> Self {
        let mut record = [0xFF; RECORD_SIZE];
        let settings = match storage.read(&mut record) {
            Ok(()) => Settings::from_record(&record),
            Err(e) => {
                warn!("settings read failed, using defaults: {e:?}");
                Settings::default()
            }
        };
        Self { storage, settings }
    }

    /// Persist the current settings
    pub fn save(&mut self) -> Result<(), StorageError> {
        self.storage.write(&self.settings.to_record()).map_err(|e| {
            warn!("settings write failed: {e:?}");
            StorageError::Write
        })?;
        info!("settings saved");
        Ok(())
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the current settings; call [`SettingsStore::save`]
    /// to persist changes
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Borrow the storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutably borrow the storage
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erased_storage_loads_defaults() {
        let store = SettingsStore::load(MemoryStorage::new());
        let settings = store.settings();
        assert_eq!(settings.address(), 0x3C);
        assert_eq!(settings.speed_khz(), 100);
        assert_eq!(settings.speed_index(), 1);
        assert_eq!(settings.height(), DisplayHeight::Px64);
        assert_eq!(settings.brightness(), 0xCF);
        assert!(!settings.inverted());
        assert!(!settings.flipped());
        assert_eq!(settings.serial(), None);
    }

    #[test]
    fn test_invalid_fields_fall_back_to_defaults() {
        let mut record = [0; RECORD_SIZE];
        record[0] = MAGIC;
        record[1] = 0x90;
        record[2..4].copy_from_slice(&2000u16.to_le_bytes());
        record[4] = 48;
        record[8..].copy_from_slice(b"AB\x01DEFGH");

        let settings = Settings::from_record(&record);
        assert_eq!(settings.address(), 0x3C);
        assert_eq!(settings.speed_khz(), 100);
        assert_eq!(settings.height(), DisplayHeight::Px64);
        assert_eq!(settings.brightness(), 0);
        assert_eq!(settings.serial(), None);
    }

    #[test]
    fn test_save_and_reload() {
        let mut store = SettingsStore::load(MemoryStorage::new());
        {
            let settings = store.settings_mut();
            settings.set_address(0x3D);
            settings.set_speed_khz(400);
            settings.set_height(DisplayHeight::Px32);
            settings.set_brightness(0x10);
            settings.set_inverted(true);
            settings.set_flipped(true);
            settings.set_serial(*b"OLED0001");
        }
        store.save().unwrap();
        assert_eq!(store.storage().writes(), 1);

        let storage = store.storage().clone();
        let reloaded = SettingsStore::load(storage);
        assert_eq!(reloaded.settings(), store.settings());
        assert_eq!(reloaded.settings().serial(), Some(b"OLED0001"));
        assert_eq!(reloaded.settings().speed_index(), 4);
    }

    #[test]
    fn test_restore_defaults_keeps_serial() {
        let mut settings = Settings::default();
        settings.set_serial(*b"12345678");
        settings.set_brightness(1);
        settings.set_height(DisplayHeight::Px32);
        settings.restore_defaults();

        assert_eq!(settings.brightness(), DEFAULT_BRIGHTNESS);
        assert_eq!(settings.height(), DisplayHeight::Px64);
        assert_eq!(settings.serial(), Some(b"12345678"));
    }

    #[test]
    fn test_speed_index() {
        let mut settings = Settings::default();
        settings.set_speed_index(10);
        assert_eq!(settings.speed_khz(), 1000);
        assert_eq!(settings.speed_index(), 10);
        settings.set_speed_khz(250);
        assert_eq!(settings.speed_index(), 3);
    }

    #[test]
    fn test_storage_failures() {
        let mut storage = MemoryStorage::with_record(Settings::default().to_record());
        storage.set_failing(true);
        let mut store = SettingsStore::load(storage);
        assert_eq!(store.settings(), &Settings::default());
        assert_eq!(store.save(), Err(StorageError::Write));
    }

    #[test]
    fn test_display_config() {
        let mut settings = Settings::default();
        settings.set_height(DisplayHeight::Px32);
        settings.set_flipped(true);
        let config = settings.display_config();
        assert_eq!(config.dimensions.rows(), 4);
        assert!(config.flip);
        assert_eq!(config.address, 0x3C);
    }
}
