//! Status and log display for the mapper tracker
//!
//! Drives a small monochrome OLED (SSD1306 or SH1106, told apart at
//! runtime) over I2C. The crate provides:
//!
//! - `LogBuffer`: a fixed-size ring of recent console text
//! - `Classifier`: read-back probe that tells the two controllers apart
//! - `Display`: framebuffer plus primitives on top of `embedded-graphics`
//! - `renderer`: header cycle, log view and menu view
//! - `capture`: ASCII and RLE framebuffer dumps over serial
//! - `Screen`: the subsystem context tying these together
//!
//! # Example
//!
//! ```ignore
//! let mut screen: Screen<_> = Screen::new(i2c, ScreenConfig::new());
//! screen.print("Booting\n");
//! screen.setup();
//! screen.render(&status, &menu, now_ms);
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod capture;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod display;
pub mod framebuffer;
pub mod glyphs;
pub mod logbuf;
pub mod renderer;
pub mod screen;

#[cfg(test)]
mod testing;

pub use capture::DecodeError;
pub use classifier::{Classifier, ControllerVariant};
pub use config::{ConfigError, FontSize, Geometry, ScreenConfig};
pub use display::{Display, DisplayError, TextAlign};
pub use framebuffer::Framebuffer;
pub use logbuf::LogBuffer;
pub use renderer::{MenuState, StatusSnapshot, TimeOfDay};
pub use screen::Screen;
