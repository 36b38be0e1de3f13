//! Mapper Hardware Abstraction Layer
//!
//! Bus traits consumed by the status display subsystem. Board support
//! code implements these for its I2C peripheral (the OLED) and for the
//! UART used as a diagnostic side channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mapper-display (log, probe, render)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mapper-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │  board code   │
//! │   adapters    │       │  (ESP32 etc.) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`uart::UartTx`] - Diagnostic serial output
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting support
//! - `embedded-hal` - [`i2c::EmbeddedI2c`] adapter for `embedded_hal::i2c::I2c`
//! - `embedded-io` - [`uart::EmbeddedSerial`] adapter for `embedded_io::Write`

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use i2c::{I2cBus, I2cBusError};
pub use uart::UartTx;
