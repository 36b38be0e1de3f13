//! SSD1306 / SH1106 command layer
//!
//! Both controllers share the fundamental command set. They differ in
//! RAM addressing: the SSD1306 is driven in horizontal addressing mode
//! over a column/page window, the SH1106 only supports page addressing
//! and maps its 128 visible columns at RAM column 2 of 132.

use heapless::Vec;
use mapper_hal::I2cBus;

use crate::classifier::ControllerVariant;
use crate::config::{Geometry, MAX_WIDTH};
use crate::framebuffer::Framebuffer;

/// Control byte: a command stream follows
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte: display data follows
const CONTROL_DATA: u8 = 0x40;

/// Controller commands
#[allow(dead_code)]
pub mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const RESUME_RAM: u8 = 0xA4;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA0;
    pub const SET_COM_SCAN_INC: u8 = 0xC0;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    // SSD1306 only
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_WINDOW: u8 = 0x21;
    pub const SET_PAGE_WINDOW: u8 = 0x22;
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
}

/// Longest command stream sent in one transaction
const MAX_COMMANDS: usize = 32;

/// Send a stream of commands in one transaction
pub fn commands<B: I2cBus>(bus: &mut B, address: u8, cmds: &[u8]) -> Result<(), B::Error> {
    let mut frame: Vec<u8, { MAX_COMMANDS + 1 }> = Vec::new();
    let _ = frame.push(CONTROL_COMMAND);
    for chunk in cmds.chunks(MAX_COMMANDS) {
        frame.truncate(1);
        let _ = frame.extend_from_slice(chunk);
        bus.write(address, &frame)?;
    }
    Ok(())
}

/// Orientation and wiring settings applied during init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitParams {
    pub geometry: Geometry,
    pub flip_vertically: bool,
    pub contrast: u8,
}

/// Build the init sequence for a controller
pub fn init_sequence(variant: ControllerVariant, params: &InitParams) -> Vec<u8, MAX_COMMANDS> {
    let height = params.geometry.height();
    let com_pins = if height == 64 || height == 48 { 0x12 } else { 0x02 };
    // Default mounting is rotated; "flipped" restores the native scan
    let (seg_remap, com_scan) = if params.flip_vertically {
        (cmd::SET_SEG_REMAP, cmd::SET_COM_SCAN_INC)
    } else {
        (cmd::SET_SEG_REMAP | 0x01, cmd::SET_COM_SCAN_DEC)
    };

    let mut seq: Vec<u8, MAX_COMMANDS> = Vec::new();
    let _ = seq.extend_from_slice(&[
        cmd::DISPLAY_OFF,
        cmd::SET_CLOCK_DIV,
        0x80,
        cmd::SET_MUX_RATIO,
        (height - 1) as u8,
        cmd::SET_DISPLAY_OFFSET,
        0x00,
        cmd::SET_START_LINE,
        cmd::SET_CHARGE_PUMP,
        0x14,
    ]);
    if variant == ControllerVariant::Ssd1306 {
        // Horizontal addressing: one window write covers the frame
        let _ = seq.extend_from_slice(&[cmd::SET_MEMORY_MODE, 0x00]);
    }
    let _ = seq.extend_from_slice(&[
        seg_remap,
        com_scan,
        cmd::SET_COM_PINS,
        com_pins,
        cmd::SET_CONTRAST,
        params.contrast,
        cmd::SET_PRECHARGE,
        0xF1,
        cmd::SET_VCOM_DETECT,
        0x40,
        cmd::RESUME_RAM,
        cmd::SET_NORMAL,
    ]);
    if variant == ControllerVariant::Ssd1306 {
        let _ = seq.push(cmd::DEACTIVATE_SCROLL);
    }
    let _ = seq.push(cmd::DISPLAY_ON);
    seq
}

/// Initialize the controller
pub fn init<B: I2cBus>(
    bus: &mut B,
    address: u8,
    variant: ControllerVariant,
    params: &InitParams,
) -> Result<(), B::Error> {
    commands(bus, address, &init_sequence(variant, params))
}

/// Push the whole framebuffer to display RAM
pub fn flush<B: I2cBus>(
    bus: &mut B,
    address: u8,
    variant: ControllerVariant,
    framebuffer: &Framebuffer,
) -> Result<(), B::Error> {
    let width = framebuffer.width();
    let pages = framebuffer.geometry().pages();

    if variant == ControllerVariant::Ssd1306 {
        // 64-wide panels sit in the middle of the 128 column driver
        let start = ((MAX_WIDTH as u16 - width) / 2) as u8;
        commands(
            bus,
            address,
            &[
                cmd::SET_COLUMN_WINDOW,
                start,
                start + (width - 1) as u8,
                cmd::SET_PAGE_WINDOW,
                0,
                (pages - 1) as u8,
            ],
        )?;
    }

    let offset = variant.column_offset();
    let mut data = [0u8; MAX_WIDTH + 1];
    data[0] = CONTROL_DATA;

    for page in 0..pages {
        if variant == ControllerVariant::Sh1106 {
            commands(
                bus,
                address,
                &[
                    cmd::SET_PAGE_ADDR | page as u8,
                    cmd::SET_LOW_COLUMN | (offset & 0x0F),
                    cmd::SET_HIGH_COLUMN | (offset >> 4),
                ],
            )?;
        }

        let bytes = framebuffer.page(page);
        data[1..=bytes.len()].copy_from_slice(bytes);
        bus.write(address, &data[..=bytes.len()])?;
    }

    Ok(())
}

/// Turn the panel on/off (RAM content is kept)
pub fn set_display_on<B: I2cBus>(bus: &mut B, address: u8, on: bool) -> Result<(), B::Error> {
    let c = if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF };
    commands(bus, address, &[c])
}

/// Set display contrast (0-255)
pub fn set_contrast<B: I2cBus>(bus: &mut B, address: u8, contrast: u8) -> Result<(), B::Error> {
    commands(bus, address, &[cmd::SET_CONTRAST, contrast])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimBus;

    fn params() -> InitParams {
        InitParams {
            geometry: Geometry::W128H64,
            flip_vertically: false,
            contrast: 0xCF,
        }
    }

    #[test]
    fn test_init_sequence_differs_by_variant() {
        let ssd = init_sequence(ControllerVariant::Ssd1306, &params());
        let sh = init_sequence(ControllerVariant::Sh1106, &params());
        assert!(ssd.windows(2).any(|w| w == [cmd::SET_MEMORY_MODE, 0x00]));
        assert!(!sh.contains(&cmd::SET_MEMORY_MODE));
        assert_eq!(ssd.first(), Some(&cmd::DISPLAY_OFF));
        assert_eq!(sh.last(), Some(&cmd::DISPLAY_ON));
    }

    #[test]
    fn test_init_mux_and_orientation() {
        let mut p = params();
        p.geometry = Geometry::W128H32;
        p.flip_vertically = true;
        let seq = init_sequence(ControllerVariant::Ssd1306, &p);
        assert!(seq.windows(2).any(|w| w == [cmd::SET_MUX_RATIO, 31]));
        assert!(seq.windows(2).any(|w| w == [cmd::SET_COM_PINS, 0x02]));
        assert!(seq.contains(&cmd::SET_COM_SCAN_INC));
    }

    #[test]
    fn test_init_is_one_command_stream() {
        let mut bus = SimBus::ssd1306();
        init(&mut bus, 0x3C, ControllerVariant::Ssd1306, &params()).unwrap();
        let writes = bus.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][0], CONTROL_COMMAND);
    }

    #[test]
    fn test_sh1106_flush_uses_page_addressing() {
        let mut bus = SimBus::sh1106();
        let mut fb = Framebuffer::new(Geometry::W128H64);
        fb.set_pixel(0, 8, true);
        flush(&mut bus, 0x3C, ControllerVariant::Sh1106, &fb).unwrap();

        let writes = bus.writes();
        // Address + data for each of the 8 pages
        assert_eq!(writes.len(), 16);
        assert_eq!(writes[0], [0x00, 0xB0, 0x02, 0x10]);
        assert_eq!(writes[2], [0x00, 0xB1, 0x02, 0x10]);
        assert_eq!(writes[3].len(), 129);
        assert_eq!(writes[3][0], CONTROL_DATA);
        assert_eq!(writes[3][1], 0x01);
    }

    #[test]
    fn test_ssd1306_flush_uses_window() {
        let mut bus = SimBus::ssd1306();
        let fb = Framebuffer::new(Geometry::W64H48);
        flush(&mut bus, 0x3C, ControllerVariant::Ssd1306, &fb).unwrap();

        let writes = bus.writes();
        assert_eq!(writes[0], [0x00, 0x21, 32, 95, 0x22, 0, 5]);
        assert_eq!(writes.len(), 1 + 6);
        assert!(writes[1..].iter().all(|w| w.len() == 65));
    }

    #[test]
    fn test_flush_propagates_bus_error() {
        let mut bus = SimBus::ssd1306();
        bus.fail_at = Some(1);
        let fb = Framebuffer::new(Geometry::W128H64);
        assert!(flush(&mut bus, 0x3C, ControllerVariant::Ssd1306, &fb).is_err());
    }
}
