//! Screen configuration
//!
//! Board-level settings for the status display: where the controller
//! sits on the bus, the panel geometry, and layout choices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit I2C address of SSD1306/SH1106 modules
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Default height of the status header in pixels (the rule sits on this row)
pub const DEFAULT_HEADER_HEIGHT: u8 = 24;

/// Default contrast value sent during init
pub const DEFAULT_CONTRAST: u8 = 0xCF;

/// Largest supported panel width in pixels
pub const MAX_WIDTH: usize = 128;

/// Largest supported panel height in pixels
pub const MAX_HEIGHT: usize = 64;

/// Framebuffer bytes for the largest supported panel
pub const MAX_BUFFER_LEN: usize = MAX_WIDTH * MAX_HEIGHT / 8;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address does not fit in 7 bits
    InvalidAddress,
    /// Header leaves no room for the body
    HeaderTooTall,
}

/// Physical panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "128x64"))]
    W128H64,
    #[cfg_attr(feature = "serde", serde(rename = "128x32"))]
    W128H32,
    #[cfg_attr(feature = "serde", serde(rename = "96x16"))]
    W96H16,
    #[cfg_attr(feature = "serde", serde(rename = "64x48"))]
    W64H48,
    #[cfg_attr(feature = "serde", serde(rename = "64x32"))]
    W64H32,
}

impl Geometry {
    /// Width in pixels
    pub const fn width(self) -> u16 {
        match self {
            Geometry::W128H64 | Geometry::W128H32 => 128,
            Geometry::W96H16 => 96,
            Geometry::W64H48 | Geometry::W64H32 => 64,
        }
    }

    /// Height in pixels
    pub const fn height(self) -> u16 {
        match self {
            Geometry::W128H64 => 64,
            Geometry::W64H48 => 48,
            Geometry::W128H32 | Geometry::W64H32 => 32,
            Geometry::W96H16 => 16,
        }
    }

    /// Number of 8-pixel pages
    pub const fn pages(self) -> u16 {
        self.height() / 8
    }

    /// Framebuffer length in bytes
    pub const fn buffer_len(self) -> usize {
        self.width() as usize * self.pages() as usize
    }

    /// Look up the geometry for a width/height pair
    pub fn from_dimensions(width: u16, height: u16) -> Option<Self> {
        [
            Geometry::W128H64,
            Geometry::W128H32,
            Geometry::W96H16,
            Geometry::W64H48,
            Geometry::W64H32,
        ]
        .into_iter()
        .find(|g| g.width() == width && g.height() == height)
    }
}

/// Glyph table used for all text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FontSize {
    /// 5x8 glyphs
    Small,
    /// 6x10 glyphs
    #[default]
    Medium,
}

/// Status display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScreenConfig {
    /// 7-bit I2C address of the controller
    pub address: u8,
    /// Panel geometry
    pub geometry: Geometry,
    /// Rotate the image 180° (module mounted upside down)
    pub flip_vertically: bool,
    /// Glyph table
    pub font: FontSize,
    /// Header height in pixels
    pub header_height: u8,
    /// Contrast sent during init
    pub contrast: u8,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenConfig {
    /// Defaults for a 0.96" 128x64 module, mounted flipped as on the tracker boards
    pub const fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            geometry: Geometry::W128H64,
            flip_vertically: true,
            font: FontSize::Medium,
            header_height: DEFAULT_HEADER_HEIGHT,
            contrast: DEFAULT_CONTRAST,
        }
    }

    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub const fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub const fn with_flip(mut self, flip_vertically: bool) -> Self {
        self.flip_vertically = flip_vertically;
        self
    }

    pub const fn with_font(mut self, font: FontSize) -> Self {
        self.font = font;
        self
    }

    pub const fn with_header_height(mut self, header_height: u8) -> Self {
        self.header_height = header_height;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::InvalidAddress);
        }
        if u16::from(self.header_height) + 1 >= self.geometry.height() {
            return Err(ConfigError::HeaderTooTall);
        }
        Ok(())
    }
}
