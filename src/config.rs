//! Display configuration types and builder

pub use crate::error::BuilderError;
use crate::protocol::Revision;

/// Panel width in pixels (fixed for SSD1306 128xN modules)
pub const DISPLAY_WIDTH: u8 = 128;

/// Width and height of one character cell in pixels
pub const CELL_SIZE: u8 = 8;

/// Default 7-bit I2C address of SSD1306 modules
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Default I2C bus speed in kHz
pub const DEFAULT_SPEED_KHZ: u16 = 100;

/// Highest supported I2C bus speed in kHz
pub const MAX_SPEED_KHZ: u16 = 1000;

/// Supported panel heights
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayHeight {
    /// 128x32 panel ("B" type)
    Px32,
    /// 128x64 panel ("A" type)
    #[default]
    Px64,
}

impl DisplayHeight {
    /// Height in pixels
    pub const fn pixels(self) -> u8 {
        match self {
            Self::Px32 => 32,
            Self::Px64 => 64,
        }
    }

    /// Parse a height in pixels
    pub const fn from_pixels(pixels: u8) -> Option<Self> {
        match pixels {
            32 => Some(Self::Px32),
            64 => Some(Self::Px64),
            _ => None,
        }
    }
}

/// Display dimensions in character cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Height of the panel
    pub height: DisplayHeight,
}

impl Dimensions {
    /// Dimensions of a 128 px wide panel with the given height
    pub const fn new(height: DisplayHeight) -> Self {
        Self { height }
    }

    /// Width in pixels
    pub const fn width(&self) -> u8 {
        DISPLAY_WIDTH
    }

    /// Number of 8 px text rows (SSD1306 pages)
    pub const fn rows(&self) -> u8 {
        self.height.pixels() / CELL_SIZE
    }

    /// Number of 8 px text columns
    pub const fn columns(&self) -> u8 {
        DISPLAY_WIDTH / CELL_SIZE
    }
}

/// Display configuration
///
/// Everything the init sequence depends on. Use [`Builder`] to create a Config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// 7-bit I2C address of the controller
    pub address: u8,
    /// Bus speed in kHz
    pub speed_khz: u16,
    /// Display dimensions
    pub dimensions: Dimensions,
    /// Rotate the picture by 180 degrees
    pub flip: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            speed_khz: DEFAULT_SPEED_KHZ,
            dimensions: Dimensions::new(DisplayHeight::Px64),
            flip: false,
        }
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```rust
/// use usb_oled::{Builder, DisplayHeight};
///
/// let config = match Builder::new().height(DisplayHeight::Px32).address(0x3D).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.dimensions.rows(), 4);
/// ```
#[must_use]
pub struct Builder {
    address: u8,
    speed_khz: u16,
    height: DisplayHeight,
    flip: bool,
}

impl Default for Builder {
    fn default() -> Self {
        let config = Config::default();
        Self {
            address: config.address,
            speed_khz: config.speed_khz,
            height: config.dimensions.height,
            flip: config.flip,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the 7-bit I2C address
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the bus speed in kHz
    pub fn speed_khz(mut self, khz: u16) -> Self {
        self.speed_khz = khz;
        self
    }

    /// Set panel height
    pub fn height(mut self, height: DisplayHeight) -> Self {
        self.height = height;
        self
    }

    /// Set whether the picture is rotated by 180 degrees
    pub fn flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidAddress` for address 0 or above 0x7F and
    /// `BuilderError::InvalidSpeed` for speeds outside 1..=1000 kHz.
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.address == 0 || self.address > 0x7F {
            return Err(BuilderError::InvalidAddress(self.address));
        }
        if self.speed_khz == 0 || self.speed_khz > MAX_SPEED_KHZ {
            return Err(BuilderError::InvalidSpeed(self.speed_khz));
        }
        Ok(Config {
            address: self.address,
            speed_khz: self.speed_khz,
            dimensions: Dimensions::new(self.height),
            flip: self.flip,
        })
    }
}

/// Terminal configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Command grammar to accept
    pub revision: Revision,
    /// Text written in large font after every display initialisation
    pub banner: Option<&'static str>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            revision: Revision::Current,
            banner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let config = Builder::new().build().unwrap();
        assert_eq!(config.address, 0x3C);
        assert_eq!(config.dimensions.rows(), 8);
        assert_eq!(config.dimensions.columns(), 16);
    }

    #[test]
    fn test_short_panel_has_four_rows() {
        let config = Builder::new().height(DisplayHeight::Px32).build().unwrap();
        assert_eq!(config.dimensions.rows(), 4);
        assert_eq!(config.dimensions.width(), 128);
    }

    #[test]
    fn test_invalid_address_rejected() {
        assert_eq!(
            Builder::new().address(0).build(),
            Err(BuilderError::InvalidAddress(0))
        );
        assert_eq!(
            Builder::new().address(0x80).build(),
            Err(BuilderError::InvalidAddress(0x80))
        );
    }

    #[test]
    fn test_invalid_speed_rejected() {
        assert_eq!(
            Builder::new().speed_khz(0).build(),
            Err(BuilderError::InvalidSpeed(0))
        );
        assert_eq!(
            Builder::new().speed_khz(1001).build(),
            Err(BuilderError::InvalidSpeed(1001))
        );
        assert!(Builder::new().speed_khz(1000).build().is_ok());
    }

    #[test]
    fn test_height_from_pixels() {
        assert_eq!(DisplayHeight::from_pixels(32), Some(DisplayHeight::Px32));
        assert_eq!(DisplayHeight::from_pixels(64), Some(DisplayHeight::Px64));
        assert_eq!(DisplayHeight::from_pixels(128), None);
    }
}
