//! Framebuffer capture over the diagnostic serial stream
//!
//! Two text formats, both framed by marker lines so a host can pick
//! them out of ordinary console output:
//!
//! - ASCII: one line per pixel row, `#` lit and `.` unlit.
//! - RLE: runs in row-major order as `W<len>` (lit) / `B<len>` (unlit)
//!   tokens, each followed by a space, on a single line.
//!
//! The decoders here are the inverse of the encoders and are what the
//! host-side receiver uses.

use core::fmt::{self, Write};

use mapper_hal::UartTx;

use crate::config::{Geometry, MAX_WIDTH};
use crate::framebuffer::Framebuffer;

pub const ASCII_BEGIN: &str = "\n--- SCREEN DUMP BEGIN ---\n";
pub const ASCII_END: &str = "\n--- SCREEN DUMP END ---\n";
pub const RLE_BEGIN: &str = "\n--- RLE DUMP BEGIN ---\n";
pub const RLE_END: &str = "--- RLE DUMP END ---\n";

/// Marker lines as they appear once split into lines
pub const ASCII_BEGIN_MARKER: &str = "--- SCREEN DUMP BEGIN ---";
pub const ASCII_END_MARKER: &str = "--- SCREEN DUMP END ---";
pub const RLE_BEGIN_MARKER: &str = "--- RLE DUMP BEGIN ---";
pub const RLE_END_MARKER: &str = "--- RLE DUMP END ---";

const LIT: u8 = b'#';
const UNLIT: u8 = b'.';
const WHITE: char = 'W';
const BLACK: char = 'B';

/// Dump decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Token is not `B<digits>` or `W<digits>`
    InvalidToken,
    /// Run of length zero
    EmptyRun,
    /// Pixel total does not match the geometry
    LengthMismatch { expected: usize, actual: usize },
    /// ASCII row of the wrong width or with a stray character
    InvalidRow,
}

/// A run of same-colored pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub lit: bool,
    pub len: usize,
}

/// Runs of a framebuffer in row-major order
pub fn runs(framebuffer: &Framebuffer) -> impl Iterator<Item = Run> + '_ {
    let mut pixels = framebuffer.pixels().peekable();
    core::iter::from_fn(move || {
        let lit = pixels.next()?;
        let mut len = 1;
        while pixels.next_if_eq(&lit).is_some() {
            len += 1;
        }
        Some(Run { lit, len })
    })
}

/// Write the ASCII dump
pub fn write_ascii<T: UartTx>(framebuffer: &Framebuffer, tx: &mut T) -> Result<(), T::Error> {
    tx.write_blocking(ASCII_BEGIN.as_bytes())?;

    let width = framebuffer.width() as usize;
    let mut row = [0u8; MAX_WIDTH + 1];
    for y in 0..framebuffer.height() {
        for (x, cell) in row[..width].iter_mut().enumerate() {
            *cell = if framebuffer.pixel(x as u16, y) { LIT } else { UNLIT };
        }
        row[width] = b'\n';
        tx.write_blocking(&row[..=width])?;
    }

    tx.write_blocking(ASCII_END.as_bytes())?;
    tx.flush()
}

/// Write the RLE dump
pub fn write_rle<T: UartTx>(framebuffer: &Framebuffer, tx: &mut T) -> Result<(), T::Error> {
    let mut out = SerialWriter::new(tx);
    let result = (|| -> fmt::Result {
        out.write_str(RLE_BEGIN)?;
        for run in runs(framebuffer) {
            let color = if run.lit { WHITE } else { BLACK };
            write!(out, "{}{} ", color, run.len)?;
        }
        out.write_str("\n")?;
        out.write_str(RLE_END)
    })();

    if result.is_err() {
        if let Some(e) = out.error.take() {
            return Err(e);
        }
    }
    out.tx.flush()
}

/// `core::fmt::Write` over a serial transmitter, keeping the bus error
struct SerialWriter<'a, T: UartTx> {
    tx: &'a mut T,
    error: Option<T::Error>,
}

impl<'a, T: UartTx> SerialWriter<'a, T> {
    fn new(tx: &'a mut T) -> Self {
        Self { tx, error: None }
    }
}

impl<T: UartTx> Write for SerialWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write_blocking(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

/// Parse RLE tokens from a dump line
pub fn parse_rle(text: &str) -> impl Iterator<Item = Result<Run, DecodeError>> + '_ {
    text.split_whitespace().map(|token| {
        let mut chars = token.chars();
        let lit = match chars.next() {
            Some(WHITE) => true,
            Some(BLACK) => false,
            _ => return Err(DecodeError::InvalidToken),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidToken);
        }
        let len: usize = digits.parse().map_err(|_| DecodeError::InvalidToken)?;
        if len == 0 {
            return Err(DecodeError::EmptyRun);
        }
        Ok(Run { lit, len })
    })
}

/// Rebuild a framebuffer from an RLE dump line
pub fn decode_rle(text: &str, geometry: Geometry) -> Result<Framebuffer, DecodeError> {
    let width = geometry.width() as usize;
    let expected = geometry.buffer_len() * 8;
    let mut framebuffer = Framebuffer::new(geometry);
    let mut index = 0usize;

    for run in parse_rle(text) {
        let run = run?;
        if run.lit {
            for i in index..index.saturating_add(run.len).min(expected) {
                framebuffer.set_pixel((i % width) as u16, (i / width) as u16, true);
            }
        }
        index = index.saturating_add(run.len);
    }

    if index != expected {
        return Err(DecodeError::LengthMismatch {
            expected,
            actual: index,
        });
    }
    Ok(framebuffer)
}

/// Rebuild a framebuffer from the rows of an ASCII dump
pub fn decode_ascii<'a, I>(rows: I, geometry: Geometry) -> Result<Framebuffer, DecodeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let width = geometry.width() as usize;
    let mut framebuffer = Framebuffer::new(geometry);
    let mut height = 0usize;

    for (y, row) in rows.into_iter().enumerate() {
        let row = row.trim_end_matches(['\r', '\n']);
        if row.len() != width {
            return Err(DecodeError::InvalidRow);
        }
        for (x, cell) in row.bytes().enumerate() {
            match cell {
                LIT => framebuffer.set_pixel(x as u16, y as u16, true),
                UNLIT => {}
                _ => return Err(DecodeError::InvalidRow),
            }
        }
        height = y + 1;
    }

    if height != geometry.height() as usize {
        return Err(DecodeError::LengthMismatch {
            expected: geometry.height() as usize,
            actual: height,
        });
    }
    Ok(framebuffer)
}
