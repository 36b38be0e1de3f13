//! Screen subsystem context
//!
//! `Screen` owns the bus, the log buffer and the optional display
//! session. Text is always retained in the log, so messages printed
//! before a panel is detected still show up once one is.
//!
//! Every display-side operation silently does nothing while there is no
//! session. Bus errors during drawing are logged and dropped; the next
//! frame is a full redraw anyway.

use mapper_hal::{I2cBus, UartTx};

use crate::capture;
use crate::classifier::{Classifier, ControllerVariant};
use crate::config::ScreenConfig;
use crate::display::{Display, TextAlign};
use crate::glyphs;
use crate::logbuf::{LogBuffer, DEFAULT_CAPACITY, DEFAULT_LINES};
use crate::renderer::{self, MenuState, StatusSnapshot};

/// OLED status display with a scrolling log
pub struct Screen<B: I2cBus, const C: usize = DEFAULT_CAPACITY, const L: usize = DEFAULT_LINES> {
    bus: B,
    config: ScreenConfig,
    log: LogBuffer<C, L>,
    classifier: Classifier,
    display: Option<Display>,
}

impl<B: I2cBus, const C: usize, const L: usize> Screen<B, C, L> {
    pub fn new(bus: B, config: ScreenConfig) -> Self {
        Self {
            bus,
            config,
            log: LogBuffer::new(),
            classifier: Classifier::new(),
            display: None,
        }
    }

    /// Detect the controller and bring the panel up
    ///
    /// Returns the detected variant. Safe to call again while no session
    /// exists; once a session is up this is a no-op.
    pub fn setup(&mut self) -> ControllerVariant {
        if let Some(display) = &self.display {
            return display.variant();
        }

        let variant = self.classifier.classify(&mut self.bus, self.config.address);
        if !variant.is_known() {
            warn!("no display found at {=u8:#x}", self.config.address);
            return variant;
        }

        let mut display = match Display::new(variant, &self.config) {
            Ok(display) => display,
            Err(e) => {
                warn!("display config rejected: {}", e);
                return variant;
            }
        };

        if let Err(e) = display.init(&mut self.bus) {
            warn!("display init failed: {}", e);
            return variant;
        }

        info!(
            "display ready: {} {=u16}x{=u16}",
            variant,
            display.width(),
            display.height()
        );
        self.display = Some(display);
        variant
    }

    /// Append one byte to the log
    pub fn print_char(&mut self, byte: u8) {
        self.log.push(byte);
    }

    /// Append text to the log
    pub fn print(&mut self, text: &str) {
        trace!("screen: {=str}", text);
        self.log.push_str(text);
    }

    /// Blank the framebuffer (panel unchanged until `update`)
    pub fn clear(&mut self) {
        if let Some(display) = &mut self.display {
            display.clear();
        }
    }

    /// Push the framebuffer to the panel
    pub fn update(&mut self) {
        if let Some(display) = &mut self.display {
            if let Err(e) = display.flush(&mut self.bus) {
                warn!("display flush failed: {}", e);
            }
        }
    }

    pub fn on(&mut self) {
        if let Some(display) = &mut self.display {
            if let Err(e) = display.power_on(&mut self.bus) {
                warn!("display on failed: {}", e);
            }
        }
    }

    pub fn off(&mut self) {
        if let Some(display) = &mut self.display {
            if let Err(e) = display.power_off(&mut self.bus) {
                warn!("display off failed: {}", e);
            }
        }
    }

    /// Change panel contrast; kept for later re-initialization
    pub fn set_contrast(&mut self, contrast: u8) {
        self.config.contrast = contrast;
        if let Some(display) = &mut self.display {
            if let Err(e) = display.set_contrast(&mut self.bus, contrast) {
                warn!("display contrast failed: {}", e);
            }
        }
    }

    /// Splash: logo centered below the header band, then flush
    pub fn show_logo(&mut self) {
        let header_height = i32::from(self.config.header_height);
        let Some(display) = &mut self.display else {
            return;
        };

        let width = i32::from(display.width());
        let height = i32::from(display.height());
        let logo_w = glyphs::LOGO_WIDTH as i32;
        let logo_h = glyphs::LOGO_HEIGHT as i32;

        let body_top = header_height + 1;
        let x = (width - logo_w) / 2;
        let y = if height - body_top >= logo_h {
            body_top + (height - body_top - logo_h) / 2
        } else {
            (height - logo_h).max(0) / 2
        };

        display.clear();
        display.draw_bitmap(x, y, glyphs::LOGO_WIDTH, &glyphs::LOGO);
        self.update();
    }

    /// Draw text into the framebuffer
    pub fn draw_string(&mut self, x: i32, y: i32, text: &str, align: TextAlign) {
        if let Some(display) = &mut self.display {
            display.draw_string(x, y, text, align);
        }
    }

    /// Compose a full frame from the log and status, then flush
    pub fn render(&mut self, status: &StatusSnapshot<'_>, menu: &MenuState<'_>, now_ms: u64) {
        let Some(display) = &mut self.display else {
            return;
        };
        renderer::render_frame(
            display,
            &self.log,
            status,
            menu,
            now_ms,
            self.config.header_height,
        );
        self.update();
    }

    /// 1 when the pixel is lit; 0 out of bounds or without a session
    pub fn get_pixel(&self, x: u16, y: u16) -> u8 {
        self.display.as_ref().map_or(0, |d| d.get_pixel(x, y))
    }

    /// Write the framebuffer as `#`/`.` rows to the diagnostic serial
    pub fn dump_ascii<T: UartTx>(&self, tx: &mut T) {
        if let Some(display) = &self.display {
            if capture::write_ascii(display.framebuffer(), tx).is_err() {
                warn!("screen dump interrupted");
            }
        }
    }

    /// Write the framebuffer as run-length tokens to the diagnostic serial
    pub fn dump_rle<T: UartTx>(&self, tx: &mut T) {
        if let Some(display) = &self.display {
            if capture::write_rle(display.framebuffer(), tx).is_err() {
                warn!("RLE dump interrupted");
            }
        }
    }

    /// Power the panel off and drop the session
    ///
    /// The detected variant stays cached, so a later `setup` skips the probe.
    pub fn shutdown(&mut self) {
        if let Some(mut display) = self.display.take() {
            if let Err(e) = display.power_off(&mut self.bus) {
                warn!("display off failed: {}", e);
            }
        }
    }

    /// Session variant, or the cached probe result without one
    pub fn variant(&self) -> ControllerVariant {
        self.display
            .as_ref()
            .map_or(self.classifier.variant(), Display::variant)
    }

    pub fn is_ready(&self) -> bool {
        self.display.is_some()
    }

    pub fn width(&self) -> u16 {
        self.display.as_ref().map_or(0, Display::width)
    }

    pub fn height(&self) -> u16 {
        self.display.as_ref().map_or(0, Display::height)
    }

    pub fn log(&self) -> &LogBuffer<C, L> {
        &self.log
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{RLE_BEGIN_MARKER, RLE_END_MARKER};
    use crate::config::Geometry;
    use crate::renderer::TimeOfDay;
    use crate::testing::{BusOp, SimBus, SimUart};

    /// Probe traffic is five transactions
    const PROBE_OPS: usize = 5;

    fn status() -> StatusSnapshot<'static> {
        StatusSnapshot {
            battery_percent: 64,
            battery_millivolts: 3810,
            satellites: 6,
            hdop: 1.1,
            time: Some(TimeOfDay {
                hour: 8,
                minute: 30,
                second: 0,
            }),
            tx_interval_s: 60,
            min_distance_m: 50.0,
            data_rate: "SF9",
            ..StatusSnapshot::default()
        }
    }

    fn lit(screen: &Screen<SimBus>) -> usize {
        let mut count = 0;
        for y in 0..screen.height() {
            for x in 0..screen.width() {
                count += usize::from(screen.get_pixel(x, y));
            }
        }
        count
    }

    #[test]
    fn test_without_session_everything_is_a_no_op() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::absent(), ScreenConfig::new());
        assert_eq!(screen.setup(), ControllerVariant::Unknown);
        assert!(!screen.is_ready());
        let probe_ops = screen.bus.ops.len();

        screen.clear();
        screen.update();
        screen.on();
        screen.off();
        screen.show_logo();
        screen.draw_string(0, 0, "x", TextAlign::Left);
        screen.render(&status(), &MenuState::default(), 0);
        screen.shutdown();

        let mut uart = SimUart::default();
        screen.dump_ascii(&mut uart);
        screen.dump_rle(&mut uart);

        assert_eq!(screen.bus.ops.len(), probe_ops);
        assert!(uart.data.is_empty());
        assert_eq!(screen.get_pixel(0, 0), 0);
        assert_eq!(screen.width(), 0);
        assert_eq!(screen.height(), 0);
    }

    #[test]
    fn test_print_is_kept_without_display() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::absent(), ScreenConfig::new());
        screen.print("boot\n");
        screen.print_char(b'o');
        screen.print_char(b'k');

        assert_eq!(screen.log().line_count(), 1);
        let lines: std::vec::Vec<_> = screen.log().lines().collect();
        assert!(lines[0].eq_bytes(b"boot"));
        assert!(lines[1].eq_bytes(b"ok"));
    }

    #[test]
    fn test_setup_detects_and_initializes() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::sh1106(), ScreenConfig::new());
        assert_eq!(screen.setup(), ControllerVariant::Sh1106);
        assert!(screen.is_ready());
        assert_eq!(screen.width(), 128);
        assert_eq!(screen.height(), 64);

        // Init goes out after the probe
        assert!(screen.bus.ops.len() > PROBE_OPS);
        assert!(screen.bus.ops[PROBE_OPS..]
            .iter()
            .all(|op| matches!(op, BusOp::Write(0x3C, _))));

        // Second setup is a no-op
        let ops = screen.bus.ops.len();
        assert_eq!(screen.setup(), ControllerVariant::Sh1106);
        assert_eq!(screen.bus.ops.len(), ops);
    }

    #[test]
    fn test_setup_retries_after_failed_probe() {
        let mut bus = SimBus::ssd1306();
        bus.fail_at = Some(0);
        let mut screen: Screen<SimBus> = Screen::new(bus, ScreenConfig::new());

        assert_eq!(screen.setup(), ControllerVariant::Unknown);
        assert!(!screen.is_ready());
        assert_eq!(screen.variant(), ControllerVariant::Unknown);

        assert_eq!(screen.setup(), ControllerVariant::Ssd1306);
        assert!(screen.is_ready());
    }

    #[test]
    fn test_setup_retries_init_without_reprobing() {
        let mut bus = SimBus::ssd1306();
        bus.fail_at = Some(PROBE_OPS);
        let mut screen: Screen<SimBus> = Screen::new(bus, ScreenConfig::new());

        assert_eq!(screen.setup(), ControllerVariant::Ssd1306);
        assert!(!screen.is_ready());
        assert_eq!(screen.variant(), ControllerVariant::Ssd1306);

        let ops = screen.bus.ops.len();
        screen.setup();
        assert!(screen.is_ready());
        // No read means no probe
        assert!(!screen.bus.ops[ops..]
            .iter()
            .any(|op| matches!(op, BusOp::Read(..))));
    }

    #[test]
    fn test_invalid_config_leaves_no_session() {
        let config = ScreenConfig::new()
            .with_geometry(Geometry::W96H16)
            .with_header_height(24);
        let mut screen: Screen<SimBus> = Screen::new(SimBus::ssd1306(), config);
        assert_eq!(screen.setup(), ControllerVariant::Ssd1306);
        assert!(!screen.is_ready());
    }

    #[test]
    fn test_render_and_dump() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::ssd1306(), ScreenConfig::new());
        screen.setup();
        screen.print("Joined\n");
        let ops = screen.bus.ops.len();

        screen.render(&status(), &MenuState::default(), 0);
        assert!(lit(&screen) > 0);
        assert!(screen.bus.ops.len() > ops);

        let mut uart = SimUart::default();
        screen.dump_rle(&mut uart);
        let text = uart.text();
        let body = text
            .lines()
            .skip_while(|l| *l != RLE_BEGIN_MARKER)
            .nth(1)
            .unwrap();
        assert!(text.contains(RLE_END_MARKER));

        let decoded = capture::decode_rle(body, Geometry::W128H64).unwrap();
        for y in 0..64 {
            for x in 0..128 {
                assert_eq!(decoded.get_pixel(x, y), screen.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_show_logo_centers_in_body() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::ssd1306(), ScreenConfig::new());
        screen.setup();
        screen.show_logo();

        // Body is rows 25..64, logo 16 tall at x 56..72, y 36..52
        assert!(lit(&screen) > 0);
        for y in 0..64 {
            for x in 0..128 {
                if screen.get_pixel(x, y) == 1 {
                    assert!((56..72).contains(&x) && (36..52).contains(&y));
                }
            }
        }
    }

    #[test]
    fn test_set_contrast_reaches_panel_and_survives_reinit() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::ssd1306(), ScreenConfig::new());
        screen.set_contrast(0x40);
        assert_eq!(screen.config().contrast, 0x40);
        assert!(screen.bus.ops.is_empty());

        screen.setup();
        screen.set_contrast(0x7F);
        assert_eq!(screen.bus.writes().last().unwrap(), &[0x00, 0x81, 0x7F]);

        screen.shutdown();
        let before = screen.bus.writes().len();
        screen.setup();
        let init = screen.bus.writes()[before..].concat();
        assert!(init.windows(2).any(|w| w == [0x81, 0x7F]));
    }

    #[test]
    fn test_shutdown_drops_session_keeps_variant() {
        let mut screen: Screen<SimBus> = Screen::new(SimBus::sh1106(), ScreenConfig::new());
        screen.setup();
        screen.shutdown();

        assert!(!screen.is_ready());
        assert_eq!(screen.variant(), ControllerVariant::Sh1106);
        assert_eq!(screen.bus.writes().last().unwrap(), &[0x00, 0xAE]);
    }
}
