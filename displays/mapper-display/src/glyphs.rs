//! Bitmaps drawn on the status screen
//!
//! Row-major, MSB first, rows padded to whole bytes (the
//! `embedded-graphics` `ImageRaw` layout).

/// Satellite icon next to the fix quality readout
pub const SATELLITE_WIDTH: u32 = 8;
pub const SATELLITE: [u8; 8] = [
    0b1100_0000,
    0b1110_0000,
    0b0111_0100,
    0b0011_1000,
    0b0001_1100,
    0b0010_1110,
    0b0000_0111,
    0b0000_0011,
];

/// Boot logo: a mast with radio waves
pub const LOGO_WIDTH: u32 = 16;
pub const LOGO_HEIGHT: u32 = 16;
#[rustfmt::skip]
pub const LOGO: [u8; 32] = [
    0x00, 0x00,
    0x20, 0x04,
    0x48, 0x12,
    0x52, 0x4A,
    0x54, 0x2A,
    0x51, 0x8A,
    0x53, 0xCA,
    0x49, 0x92,
    0x21, 0x84,
    0x01, 0x80,
    0x02, 0x40,
    0x02, 0x40,
    0x04, 0x20,
    0x04, 0x20,
    0x08, 0x10,
    0x1F, 0xF8,
];
