//! Packed 1-bit framebuffer
//!
//! Layout matches the controllers' display RAM: one byte holds eight
//! vertical pixels, pages of 8 rows follow each other. Pixel (x, y) lives
//! in byte `x + (y / 8) * width`, bit `y % 8`.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use heapless::Vec;

use crate::config::{Geometry, MAX_BUFFER_LEN};

/// Pixel store for one panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    geometry: Geometry,
    buffer: Vec<u8, MAX_BUFFER_LEN>,
}

impl Framebuffer {
    /// Create a blank framebuffer for `geometry`
    pub fn new(geometry: Geometry) -> Self {
        let mut buffer = Vec::new();
        // Every supported geometry fits in MAX_BUFFER_LEN
        let _ = buffer.resize(geometry.buffer_len(), 0);
        Self { geometry, buffer }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u16 {
        self.geometry.width()
    }

    pub fn height(&self) -> u16 {
        self.geometry.height()
    }

    /// Raw packed bytes, in controller RAM order
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytes of one 8-row page
    pub fn page(&self, page: u16) -> &[u8] {
        let width = self.width() as usize;
        let start = page as usize * width;
        self.buffer.get(start..start + width).unwrap_or(&[])
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Set one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u16, y: u16, on: bool) {
        if let Some((index, mask)) = self.locate(x, y) {
            if on {
                self.buffer[index] |= mask;
            } else {
                self.buffer[index] &= !mask;
            }
        }
    }

    /// Whether a pixel is lit; out-of-range coordinates read as unlit
    pub fn pixel(&self, x: u16, y: u16) -> bool {
        self.locate(x, y)
            .map(|(index, mask)| self.buffer[index] & mask != 0)
            .unwrap_or(false)
    }

    /// 1 for lit, 0 for unlit or out of range
    pub fn get_pixel(&self, x: u16, y: u16) -> u8 {
        u8::from(self.pixel(x, y))
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = bool> + '_ {
        let width = self.width();
        (0..self.height()).flat_map(move |y| (0..width).map(move |x| self.pixel(x, y)))
    }

    fn locate(&self, x: u16, y: u16) -> Option<(usize, u8)> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let index = x as usize + (y as usize / 8) * self.width() as usize;
        Some((index, 1 << (y % 8)))
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_byte_layout() {
        let mut fb = Framebuffer::new(Geometry::W128H64);
        fb.set_pixel(3, 0, true);
        fb.set_pixel(3, 9, true);
        assert_eq!(fb.as_bytes()[3], 0b0000_0001);
        assert_eq!(fb.as_bytes()[3 + 128], 0b0000_0010);
        assert_eq!(fb.page(1)[3], 0b0000_0010);
    }

    #[test]
    fn test_get_pixel() {
        let mut fb = Framebuffer::new(Geometry::W64H32);
        assert_eq!(fb.get_pixel(10, 10), 0);
        fb.set_pixel(10, 10, true);
        assert_eq!(fb.get_pixel(10, 10), 1);
        fb.set_pixel(10, 10, false);
        assert_eq!(fb.get_pixel(10, 10), 0);
    }

    #[test]
    fn test_out_of_range_is_unlit() {
        let mut fb = Framebuffer::new(Geometry::W64H32);
        fb.set_pixel(64, 0, true);
        fb.set_pixel(0, 32, true);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(fb.get_pixel(64, 0), 0);
        assert_eq!(fb.get_pixel(u16::MAX, u16::MAX), 0);
    }

    #[test]
    fn test_draw_target_clips() {
        let mut fb = Framebuffer::new(Geometry::W96H16);
        Line::new(Point::new(-5, 3), Point::new(200, 3))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut fb)
            .unwrap();
        assert!((0..96).all(|x| fb.pixel(x, 3)));
        assert_eq!(fb.pixels().filter(|&p| p).count(), 96);
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new(Geometry::W128H32);
        fb.set_pixel(1, 1, true);
        fb.clear();
        assert_eq!(fb.get_pixel(1, 1), 0);
        assert_eq!(fb.as_bytes().len(), 512);
    }
}
