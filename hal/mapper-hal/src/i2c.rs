//! I2C bus abstraction
//!
//! The OLED controllers only need plain master transfers. The probe
//! relies on `read` being a separate transaction from the preceding
//! writes, so implementations must not merge them.

/// Blocking I2C master, 7-bit addressing
pub trait I2cBus {
    type Error;

    /// One write transaction
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// One read transaction filling `buf`
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read with a repeated start
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::write_read(self, address, write_data, read_buf)
    }
}

/// Error from I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cBusError {
    /// Bus error
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received (no device at the address, or data rejected)
    Nack,
    /// Overrun
    Overrun,
    /// Other error
    Other,
}

/// Adapter from an `embedded-hal` 1.0 blocking I2C peripheral
#[cfg(feature = "embedded-hal")]
pub struct EmbeddedI2c<T> {
    inner: T,
}

#[cfg(feature = "embedded-hal")]
impl<T> EmbeddedI2c<T> {
    /// Wrap an `embedded_hal::i2c::I2c` implementation
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Give the wrapped peripheral back
    pub fn release(self) -> T {
        self.inner
    }
}

#[cfg(feature = "embedded-hal")]
impl I2cBusError {
    /// Map an `embedded-hal` error onto the bus error kinds
    pub fn from_embedded<E: embedded_hal::i2c::Error>(e: &E) -> Self {
        use embedded_hal::i2c::ErrorKind;

        match e.kind() {
            ErrorKind::Bus => I2cBusError::Bus,
            ErrorKind::ArbitrationLoss => I2cBusError::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => I2cBusError::Nack,
            ErrorKind::Overrun => I2cBusError::Overrun,
            _ => I2cBusError::Other,
        }
    }
}

#[cfg(feature = "embedded-hal")]
impl<T: embedded_hal::i2c::I2c> I2cBus for EmbeddedI2c<T> {
    type Error = I2cBusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write(&mut self.inner, address, data)
            .map_err(|e| I2cBusError::from_embedded(&e))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::read(&mut self.inner, address, buf)
            .map_err(|e| I2cBusError::from_embedded(&e))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write_read(&mut self.inner, address, write_data, read_buf)
            .map_err(|e| I2cBusError::from_embedded(&e))
    }
}
