//! Display session
//!
//! Owns the framebuffer for the detected controller and exposes the
//! drawing primitives the renderer uses. Both controller variants sit
//! behind this one type; their differences (init sequence and RAM
//! addressing) are handled in [`crate::controller`].

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use mapper_hal::I2cBus;

use crate::classifier::ControllerVariant;
use crate::config::{FontSize, ScreenConfig};
use crate::controller::{self, InitParams};
use crate::framebuffer::Framebuffer;

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Controller type not detected yet
    NotInitialized,
    /// Configuration is not usable
    InvalidConfig,
}

/// Horizontal text alignment around the anchor x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<TextAlign> for Alignment {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => Alignment::Left,
            TextAlign::Center => Alignment::Center,
            TextAlign::Right => Alignment::Right,
        }
    }
}

/// Glyph table for a configured font size
pub fn glyph_table(size: FontSize) -> &'static MonoFont<'static> {
    match size {
        FontSize::Small => &FONT_5X8,
        FontSize::Medium => &FONT_6X10,
    }
}

/// An attached, detected display
pub struct Display {
    variant: ControllerVariant,
    address: u8,
    flip_vertically: bool,
    contrast: u8,
    font: &'static MonoFont<'static>,
    framebuffer: Framebuffer,
}

impl Display {
    /// Build the session for a detected controller
    pub fn new(variant: ControllerVariant, config: &ScreenConfig) -> Result<Self, DisplayError> {
        if !variant.is_known() {
            return Err(DisplayError::NotInitialized);
        }
        config.validate().map_err(|_| DisplayError::InvalidConfig)?;

        Ok(Self {
            variant,
            address: config.address,
            flip_vertically: config.flip_vertically,
            contrast: config.contrast,
            font: glyph_table(config.font),
            framebuffer: Framebuffer::new(config.geometry),
        })
    }

    /// Send the controller init sequence (panel ends up on)
    pub fn init<B: I2cBus>(&mut self, bus: &mut B) -> Result<(), DisplayError> {
        let params = InitParams {
            geometry: self.framebuffer.geometry(),
            flip_vertically: self.flip_vertically,
            contrast: self.contrast,
        };
        controller::init(bus, self.address, self.variant, &params)
            .map_err(|_| DisplayError::Communication)
    }

    pub fn variant(&self) -> ControllerVariant {
        self.variant
    }

    pub fn width(&self) -> u16 {
        self.framebuffer.width()
    }

    pub fn height(&self) -> u16 {
        self.framebuffer.height()
    }

    /// Read access to the pixel data
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn font(&self) -> &'static MonoFont<'static> {
        self.font
    }

    /// Height of one text row in pixels
    pub fn row_height(&self) -> u16 {
        self.font.character_size.height as u16
    }

    /// Horizontal advance per glyph in pixels
    pub fn glyph_advance(&self) -> u16 {
        (self.font.character_size.width + self.font.character_spacing) as u16
    }

    /// Glyphs that fit across the panel
    pub fn columns(&self) -> usize {
        (self.width() / self.glyph_advance().max(1)) as usize
    }

    /// 1 if the pixel is lit, 0 if unlit or out of range
    pub fn get_pixel(&self, x: u16, y: u16) -> u8 {
        self.framebuffer.get_pixel(x, y)
    }

    /// Blank the framebuffer
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Draw text with its top edge at `y`, aligned around `x`
    pub fn draw_string(&mut self, x: i32, y: i32, text: &str, align: TextAlign) {
        let character_style = MonoTextStyle::new(self.font, BinaryColor::On);
        let text_style = TextStyleBuilder::new()
            .alignment(align.into())
            .baseline(Baseline::Top)
            .build();
        let _ = Text::with_text_style(text, Point::new(x, y), character_style, text_style)
            .draw(&mut self.framebuffer);
    }

    pub fn draw_hline(&mut self, x: i32, y: i32, length: u32) {
        if length == 0 {
            return;
        }
        self.draw_line(Point::new(x, y), Point::new(x + length as i32 - 1, y));
    }

    pub fn draw_vline(&mut self, x: i32, y: i32, length: u32) {
        if length == 0 {
            return;
        }
        self.draw_line(Point::new(x, y), Point::new(x, y + length as i32 - 1));
    }

    /// Rectangle outline
    pub fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let _ = Rectangle::new(Point::new(x, y), Size::new(width, height))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.framebuffer);
    }

    /// Fill a rectangle lit or unlit
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, on: bool) {
        let color = if on { BinaryColor::On } else { BinaryColor::Off };
        let _ = self
            .framebuffer
            .fill_solid(&Rectangle::new(Point::new(x, y), Size::new(width, height)), color);
    }

    /// Blit a packed bitmap (`ImageRaw` layout) with its top-left corner at (x, y)
    pub fn draw_bitmap(&mut self, x: i32, y: i32, width: u32, data: &[u8]) {
        let raw = ImageRaw::<BinaryColor>::new(data, width);
        let _ = Image::new(&raw, Point::new(x, y)).draw(&mut self.framebuffer);
    }

    /// Push the framebuffer to the panel
    pub fn flush<B: I2cBus>(&mut self, bus: &mut B) -> Result<(), DisplayError> {
        controller::flush(bus, self.address, self.variant, &self.framebuffer)
            .map_err(|_| DisplayError::Communication)
    }

    pub fn power_on<B: I2cBus>(&mut self, bus: &mut B) -> Result<(), DisplayError> {
        controller::set_display_on(bus, self.address, true)
            .map_err(|_| DisplayError::Communication)
    }

    pub fn power_off<B: I2cBus>(&mut self, bus: &mut B) -> Result<(), DisplayError> {
        controller::set_display_on(bus, self.address, false)
            .map_err(|_| DisplayError::Communication)
    }

    /// Change contrast now; also used if the panel is initialized again
    pub fn set_contrast<B: I2cBus>(
        &mut self,
        bus: &mut B,
        contrast: u8,
    ) -> Result<(), DisplayError> {
        self.contrast = contrast;
        controller::set_contrast(bus, self.address, contrast)
            .map_err(|_| DisplayError::Communication)
    }

    fn draw_line(&mut self, start: Point, end: Point) {
        let _ = Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Geometry;
    use crate::glyphs;
    use crate::testing::SimBus;

    fn display() -> Display {
        Display::new(ControllerVariant::Ssd1306, &ScreenConfig::default()).unwrap()
    }

    fn lit_columns(d: &Display, y0: u16, y1: u16) -> (u16, u16) {
        let lit: std::vec::Vec<u16> = (0..d.width())
            .filter(|&x| (y0..y1).any(|y| d.get_pixel(x, y) == 1))
            .collect();
        (*lit.first().unwrap(), *lit.last().unwrap())
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!(matches!(
            Display::new(ControllerVariant::Unknown, &ScreenConfig::default()),
            Err(DisplayError::NotInitialized)
        ));
        let config = ScreenConfig::default().with_geometry(Geometry::W96H16);
        assert!(matches!(
            Display::new(ControllerVariant::Sh1106, &config),
            Err(DisplayError::InvalidConfig)
        ));
    }

    #[test]
    fn test_font_metrics() {
        let d = display();
        assert_eq!(d.row_height(), 10);
        assert_eq!(d.glyph_advance(), 6);
        assert_eq!(d.columns(), 21);

        let small = ScreenConfig::default().with_font(FontSize::Small);
        let d = Display::new(ControllerVariant::Sh1106, &small).unwrap();
        assert_eq!(d.row_height(), 8);
        assert_eq!(d.columns(), 25);
    }

    #[test]
    fn test_draw_string_alignment() {
        let mut d = display();
        d.draw_string(0, 0, "MMMM", TextAlign::Left);
        let (first, last) = lit_columns(&d, 0, 10);
        assert!(first < 2);
        assert!(last < 24);

        d.clear();
        d.draw_string(128, 0, "MMMM", TextAlign::Right);
        let (first, last) = lit_columns(&d, 0, 10);
        assert!(first >= 104);
        assert!(last <= 127);

        d.clear();
        d.draw_string(64, 0, "MMMM", TextAlign::Center);
        let (first, last) = lit_columns(&d, 0, 10);
        assert!(first >= 52 && last <= 76);
    }

    #[test]
    fn test_lines_and_rect() {
        let mut d = display();
        d.draw_hline(0, 24, 128);
        assert!((0..128).all(|x| d.get_pixel(x, 24) == 1));
        d.draw_vline(5, 30, 10);
        assert_eq!(d.get_pixel(5, 30), 1);
        assert_eq!(d.get_pixel(5, 39), 1);
        assert_eq!(d.get_pixel(5, 40), 0);

        d.clear();
        d.draw_rect(0, 40, 128, 12);
        assert_eq!(d.get_pixel(0, 45), 1);
        assert_eq!(d.get_pixel(127, 45), 1);
        assert_eq!(d.get_pixel(64, 45), 0);
        d.fill_rect(0, 40, 128, 12, false);
        assert_eq!(d.get_pixel(0, 45), 0);
    }

    #[test]
    fn test_draw_bitmap() {
        let mut d = display();
        d.draw_bitmap(120, 0, glyphs::SATELLITE_WIDTH, &glyphs::SATELLITE);
        assert_eq!(d.get_pixel(120, 0), 1);
        assert_eq!(d.get_pixel(127, 7), 1);
        assert_eq!(d.get_pixel(127, 0), 0);
    }

    #[test]
    fn test_flush_error_is_reported() {
        let mut d = display();
        let mut bus = SimBus::absent();
        assert_eq!(d.flush(&mut bus), Err(DisplayError::Communication));
        assert_eq!(d.power_off(&mut bus), Err(DisplayError::Communication));
    }
}
