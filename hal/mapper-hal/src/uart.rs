//! Diagnostic serial output
//!
//! Screen dumps go out over the debug console, usually the same UART or
//! USB CDC port the firmware logs to.

/// Serial transmitter
pub trait UartTx {
    type Error;

    /// Write all of `data`, blocking until it is queued
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until everything written has left the port
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: UartTx + ?Sized> UartTx for &mut T {
    type Error = T::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write_blocking(self, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }
}

/// Adapter from any `embedded-io` writer (USB CDC, UART, ...)
#[cfg(feature = "embedded-io")]
pub struct EmbeddedSerial<T> {
    inner: T,
}

#[cfg(feature = "embedded-io")]
impl<T> EmbeddedSerial<T> {
    /// Wrap an `embedded_io::Write` implementation
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Give the wrapped writer back
    pub fn release(self) -> T {
        self.inner
    }
}

#[cfg(feature = "embedded-io")]
impl<T: embedded_io::Write> UartTx for EmbeddedSerial<T> {
    type Error = T::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        embedded_io::Write::flush(&mut self.inner)
    }
}

#[cfg(all(test, feature = "embedded-io"))]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_writes_through() {
        let mut storage = [0u8; 8];
        let mut serial = EmbeddedSerial::new(&mut storage[..]);
        serial.write_blocking(b"B64 ").unwrap();
        serial.flush().unwrap();
        assert_eq!(&storage[..4], b"B64 ");
    }

    #[test]
    fn test_adapter_reports_full_sink() {
        let mut storage = [0u8; 2];
        let mut serial = EmbeddedSerial::new(&mut storage[..]);
        assert!(serial.write_blocking(b"W128 ").is_err());
    }
}
