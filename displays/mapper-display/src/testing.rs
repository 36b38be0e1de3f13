//! Simulated bus and serial sink shared by the unit tests

use std::string::String;
use std::vec::Vec;

use mapper_hal::{I2cBus, I2cBusError, UartTx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

/// OLED controller on a simulated I2C bus
pub struct SimBus {
    pub ops: Vec<BusOp>,
    /// Index of the transaction that fails (counted from creation)
    pub fail_at: Option<usize>,
    present: bool,
    read_back: bool,
    last_data: Vec<u8>,
}

impl SimBus {
    fn new(present: bool, read_back: bool) -> Self {
        Self {
            ops: Vec::new(),
            fail_at: None,
            present,
            read_back,
            last_data: Vec::new(),
        }
    }

    pub fn ssd1306() -> Self {
        Self::new(true, false)
    }

    pub fn sh1106() -> Self {
        Self::new(true, true)
    }

    /// Nothing answers on the bus
    pub fn absent() -> Self {
        Self::new(false, false)
    }

    /// Payloads of all writes, in order
    pub fn writes(&self) -> Vec<&[u8]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Write(_, data) => Some(data.as_slice()),
                BusOp::Read(..) => None,
            })
            .collect()
    }

    fn transaction(&mut self, op: BusOp) -> Result<(), I2cBusError> {
        let index = self.ops.len();
        self.ops.push(op);
        if !self.present || self.fail_at == Some(index) {
            return Err(I2cBusError::Nack);
        }
        Ok(())
    }
}

impl I2cBus for SimBus {
    type Error = I2cBusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.transaction(BusOp::Write(address, data.to_vec()))?;
        if data.len() > 1 && data[0] == 0x40 {
            self.last_data = data[1..].to_vec();
        }
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transaction(BusOp::Read(address, buf.len()))?;
        buf.fill(0);
        if self.read_back {
            // First byte is the controller's dummy read
            buf[0] = 0xFF;
            for (dst, src) in buf[1..].iter_mut().zip(self.last_data.iter()) {
                *dst = *src;
            }
        }
        Ok(())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.write(address, write_data)?;
        self.read(address, read_buf)
    }
}

/// Serial sink collecting everything written
#[derive(Default)]
pub struct SimUart {
    pub data: Vec<u8>,
    pub fail: bool,
}

impl SimUart {
    pub fn text(&self) -> String {
        String::from_utf8(self.data.clone()).unwrap()
    }
}

impl UartTx for SimUart {
    type Error = ();

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
