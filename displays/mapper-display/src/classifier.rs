//! Controller detection
//!
//! SSD1306 and SH1106 modules look the same on the bus: same address,
//! same command set for everything the status screen needs, and no
//! identification register. They differ in one observable way: the
//! SH1106 lets the host read display RAM back over I2C, the SSD1306
//! does not. The probe writes two sentinel bytes to column zero and
//! tries to read them back.
//!
//! The result is a heuristic. Any failed bus transaction makes the probe
//! inconclusive ([`ControllerVariant::Unknown`]), which is never cached,
//! so the next call probes again.

use mapper_hal::I2cBus;

/// Detected controller type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerVariant {
    /// Not probed yet, or the probe was inconclusive
    #[default]
    Unknown,
    /// SSD1306: no display RAM read-back over I2C
    Ssd1306,
    /// SH1106: supports read-back, 132-column RAM with a 2-column offset
    Sh1106,
}

impl ControllerVariant {
    /// Whether the probe reached a definite answer
    pub const fn is_known(self) -> bool {
        !matches!(self, ControllerVariant::Unknown)
    }

    /// Whether display RAM can be read back over the bus
    pub const fn supports_read_back(self) -> bool {
        matches!(self, ControllerVariant::Sh1106)
    }

    /// First RAM column of the visible area
    pub const fn column_offset(self) -> u8 {
        match self {
            ControllerVariant::Sh1106 => 2,
            _ => 0,
        }
    }
}

/// Bytes written to display RAM during the probe
pub const PROBE_SENTINEL: [u8; 2] = [0x5A, 0xC3];

/// Probe transactions
mod seq {
    use super::PROBE_SENTINEL;

    /// Command mode: column low 0, column high 0, page 0
    pub const ADDRESS_ORIGIN: [u8; 4] = [0x00, 0x00, 0x10, 0xB0];
    /// Data mode write of the sentinel
    pub const WRITE_SENTINEL: [u8; 3] = [0x40, PROBE_SENTINEL[0], PROBE_SENTINEL[1]];
    /// Command mode: back to column 0
    pub const READDRESS: [u8; 3] = [0x00, 0x00, 0x10];
    /// Data mode marker before the read
    pub const DATA_MODE: [u8; 1] = [0x40];
    /// Read length; the first byte is a dummy read
    pub const READ_LEN: usize = 3;
}

/// Run the probe once, without caching
pub fn probe<B: I2cBus>(bus: &mut B, address: u8) -> ControllerVariant {
    match read_back_matches(bus, address) {
        Ok(true) => ControllerVariant::Sh1106,
        Ok(false) => ControllerVariant::Ssd1306,
        Err(_) => ControllerVariant::Unknown,
    }
}

fn read_back_matches<B: I2cBus>(bus: &mut B, address: u8) -> Result<bool, B::Error> {
    bus.write(address, &seq::ADDRESS_ORIGIN)?;
    bus.write(address, &seq::WRITE_SENTINEL)?;
    bus.write(address, &seq::READDRESS)?;
    bus.write(address, &seq::DATA_MODE)?;

    let mut buf = [0u8; seq::READ_LEN];
    bus.read(address, &mut buf)?;

    Ok(buf[1..] == PROBE_SENTINEL)
}

/// Probe with a process-lifetime cache of the first definite answer
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    cached: ControllerVariant,
}

impl Classifier {
    pub const fn new() -> Self {
        Self {
            cached: ControllerVariant::Unknown,
        }
    }

    /// Cached result (`Unknown` until a probe succeeds)
    pub fn variant(&self) -> ControllerVariant {
        self.cached
    }

    /// Return the cached variant, or probe the bus for it
    pub fn classify<B: I2cBus>(&mut self, bus: &mut B, address: u8) -> ControllerVariant {
        if self.cached.is_known() {
            return self.cached;
        }

        let variant = probe(bus, address);
        if variant.is_known() {
            debug!("display controller at {=u8:#x}: {}", address, variant);
            self.cached = variant;
        } else {
            debug!("display probe at {=u8:#x} inconclusive", address);
        }
        variant
    }
}
