//! Frame composition
//!
//! Every frame has a two-row status header over a horizontal rule, and a
//! body that is either the scrolling log or the menu overlay:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │87% 3.95V         1.3 7  (sat)│  power / position, fix quality
//! │60s 25m D N           SF7/16dB│  tx interval, distance, flags, rate
//! ├──────────────────────────────┤
//! │Joined                        │
//! │Sent 12 bytes                 │  log view, newest line at the bottom
//! │                              │
//! └──────────────────────────────┘
//! ```
//!
//! The renderer keeps no state of its own; everything comes from the log
//! buffer and the per-frame snapshot.

use core::fmt::Write;

use heapless::{Deque, String};

use crate::display::{Display, TextAlign};
use crate::glyphs;
use crate::logbuf::LogBuffer;

/// Full header cycle
pub const HEADER_CYCLE_MS: u64 = 6000;
/// Time spent on power status at the start of each cycle
pub const HEADER_PHASE_MS: u64 = 3000;
/// Satellites needed before fix quality is shown
pub const MIN_FIX_SATELLITES: u8 = 3;

/// Markers around a highlighted menu entry
pub const EMPHASIS_OPEN: &str = ">>> ";
pub const EMPHASIS_CLOSE: &str = " <<<";

/// Top of the first and second header rows
const HEADER_FIRST_ROW: i32 = 2;
const HEADER_SECOND_ROW: i32 = 12;

/// Most log rows ever on screen
pub const MAX_LOG_ROWS: usize = 8;
/// Most glyphs in one log row
pub const MAX_LOG_COLS: usize = 32;

/// One rendered log row
pub type LogRow = String<MAX_LOG_COLS>;

/// Header and menu text
pub type Label = String<40>;

/// Wall-clock time from the GPS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Telemetry for one frame
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot<'a> {
    /// Battery charge, 0-100
    pub battery_percent: u8,
    /// Battery voltage in millivolts
    pub battery_millivolts: u16,
    /// Satellites in view
    pub satellites: u8,
    /// Horizontal dilution of precision
    pub hdop: f32,
    /// Time of day, if the GPS has one
    pub time: Option<TimeOfDay>,
    /// Current transmit interval in seconds
    pub tx_interval_s: u32,
    /// Minimum distance between transmissions in metres
    pub min_distance_m: f32,
    /// Data rate label, e.g. "SF7"
    pub data_rate: &'a str,
    /// Transmit power in dBm, shown next to the data rate when set
    pub tx_power_dbm: Option<i8>,
    pub in_deadzone: bool,
    pub stay_on: bool,
    pub never_rest: bool,
}

/// Menu overlay for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuState<'a> {
    pub prev: &'a str,
    pub current: &'a str,
    pub next: &'a str,
    /// Current entry is selected for action
    pub highlighted: bool,
    /// Show the menu instead of the log
    pub in_menu: bool,
}

/// Which status the first header row shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderPhase {
    /// Battery percentage and voltage
    Power,
    /// Time of day, or the no-fix banner
    Position,
}

impl HeaderPhase {
    /// Phase at a point in the 6 s cycle
    pub fn at(now_ms: u64) -> Self {
        if now_ms % HEADER_CYCLE_MS < HEADER_PHASE_MS {
            HeaderPhase::Power
        } else {
            HeaderPhase::Position
        }
    }
}

/// Body content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BodyMode {
    LogView,
    MenuView,
}

impl BodyMode {
    pub fn select(menu: &MenuState<'_>) -> Self {
        if menu.in_menu {
            BodyMode::MenuView
        } else {
            BodyMode::LogView
        }
    }
}

/// Compose a full frame into the framebuffer (no flush)
pub fn render_frame<const C: usize, const L: usize>(
    display: &mut Display,
    log: &LogBuffer<C, L>,
    status: &StatusSnapshot<'_>,
    menu: &MenuState<'_>,
    now_ms: u64,
    header_height: u8,
) {
    display.clear();

    match BodyMode::select(menu) {
        BodyMode::LogView => {
            draw_log(display, log, header_height);
            // Rows shifted up may reach into the header band
            display.fill_rect(0, 0, u32::from(display.width()), u32::from(header_height), false);
            draw_header(display, status, now_ms, header_height);
        }
        BodyMode::MenuView => {
            draw_header(display, status, now_ms, header_height);
            draw_menu(display, menu, header_height);
        }
    }
}

/// Status header and separating rule
pub fn draw_header(
    display: &mut Display,
    status: &StatusSnapshot<'_>,
    now_ms: u64,
    header_height: u8,
) {
    let width = i32::from(display.width());

    let first = match HeaderPhase::at(now_ms) {
        HeaderPhase::Power => power_text(status),
        HeaderPhase::Position => position_text(status),
    };
    display.draw_string(0, HEADER_FIRST_ROW, &first, TextAlign::Left);

    if status.satellites >= MIN_FIX_SATELLITES {
        let icon_x = width - glyphs::SATELLITE_WIDTH as i32;
        display.draw_string(icon_x - 4, HEADER_FIRST_ROW, &fix_text(status), TextAlign::Right);
        display.draw_bitmap(icon_x, HEADER_FIRST_ROW, glyphs::SATELLITE_WIDTH, &glyphs::SATELLITE);
    }

    display.draw_string(0, HEADER_SECOND_ROW, &settings_text(status), TextAlign::Left);
    display.draw_string(width, HEADER_SECOND_ROW, &rate_text(status), TextAlign::Right);

    display.draw_hline(0, i32::from(header_height), width as u32);
}

/// Previous/current/next entries, current one boxed
pub fn draw_menu(display: &mut Display, menu: &MenuState<'_>, header_height: u8) {
    let width = i32::from(display.width());
    let row_height = i32::from(display.row_height());
    let body_top = i32::from(header_height) + 1;
    let available = i32::from(display.height()) - body_top;
    let top = body_top + ((available - 3 * row_height) / 2).max(0);
    let current_y = top + row_height;

    if menu.highlighted {
        display.clear();
    } else {
        display.draw_string(width / 2, top, menu.prev, TextAlign::Center);
        display.draw_string(width / 2, current_y + row_height, menu.next, TextAlign::Center);
    }

    display.draw_rect(0, current_y - 1, width as u32, (row_height + 1) as u32);

    if menu.highlighted {
        let mut label = Label::new();
        let _ = write!(label, "{}{}{}", EMPHASIS_OPEN, menu.current, EMPHASIS_CLOSE);
        display.draw_string(width / 2, current_y, &label, TextAlign::Center);
    } else {
        display.draw_string(width / 2, current_y, menu.current, TextAlign::Center);
    }
}

/// Log rows below the header, newest at the bottom
pub fn draw_log<const C: usize, const L: usize>(
    display: &mut Display,
    log: &LogBuffer<C, L>,
    header_height: u8,
) {
    let row_height = display.row_height().max(1);
    let body_top = u16::from(header_height) + 1;
    let available = display.height().saturating_sub(body_top);
    let max_rows = (available.div_ceil(row_height) as usize).clamp(1, MAX_LOG_ROWS);

    let rows = layout_log(log, display.columns(), max_rows);
    let shift = if log.is_line_index_full() {
        log_shift(row_height, display.height())
    } else {
        0
    };

    for (i, row) in rows.iter().enumerate() {
        let y = i32::from(body_top) + i as i32 * i32::from(row_height) - i32::from(shift);
        display.draw_string(0, y, row, TextAlign::Left);
    }
}

/// Upward shift that keeps the newest row whole when the row height
/// does not divide the panel height
pub fn log_shift(row_height: u16, display_height: u16) -> u16 {
    if row_height == 0 {
        return 0;
    }
    (row_height - display_height % row_height) % row_height
}

/// Split the log into display rows of at most `columns` glyphs, keeping
/// the newest `max_rows`
pub fn layout_log<const C: usize, const L: usize>(
    log: &LogBuffer<C, L>,
    columns: usize,
    max_rows: usize,
) -> Deque<LogRow, MAX_LOG_ROWS> {
    let columns = columns.clamp(1, MAX_LOG_COLS);
    let max_rows = max_rows.clamp(1, MAX_LOG_ROWS);
    let mut rows: Deque<LogRow, MAX_LOG_ROWS> = Deque::new();

    let mut push_row = |row: LogRow| {
        if rows.len() >= max_rows {
            rows.pop_front();
        }
        let _ = rows.push_back(row);
    };

    for line in log.lines() {
        let mut row = LogRow::new();
        let mut pushed = false;
        for byte in line.bytes() {
            if row.len() == columns {
                push_row(core::mem::take(&mut row));
                pushed = true;
            }
            let _ = row.push(printable(byte));
        }
        if !row.is_empty() || !pushed {
            push_row(row);
        }
    }

    rows
}

fn printable(byte: u8) -> char {
    if (0x20..0x7F).contains(&byte) {
        byte as char
    } else {
        '?'
    }
}

/// "87% 3.95V"
pub fn power_text(status: &StatusSnapshot<'_>) -> Label {
    let mut text = Label::new();
    let volts = f32::from(status.battery_millivolts) / 1000.0;
    let _ = write!(text, "{}% {:.2}V", status.battery_percent, volts);
    text
}

/// "12:05:09", or "NO GPS 2" without a usable fix
pub fn position_text(status: &StatusSnapshot<'_>) -> Label {
    let mut text = Label::new();
    match status.time {
        Some(t) if status.satellites >= MIN_FIX_SATELLITES => {
            let _ = write!(text, "{:02}:{:02}:{:02}", t.hour, t.minute, t.second);
        }
        _ => {
            let _ = write!(text, "NO GPS {}", status.satellites);
        }
    }
    text
}

/// "1.3 7"
pub fn fix_text(status: &StatusSnapshot<'_>) -> Label {
    let mut text = Label::new();
    let _ = write!(text, "{:.1} {}", status.hdop, status.satellites);
    text
}

/// "60s 25m D N"
pub fn settings_text(status: &StatusSnapshot<'_>) -> Label {
    let flag = |set: bool, c: char| if set { c } else { ' ' };
    let mut text = Label::new();
    let _ = write!(
        text,
        "{}s {:.0}m {}{}{}",
        status.tx_interval_s,
        status.min_distance_m,
        flag(status.in_deadzone, 'D'),
        flag(status.stay_on, 'S'),
        flag(status.never_rest, 'N'),
    );
    text
}

/// "SF7" or "SF7/16dB"
pub fn rate_text(status: &StatusSnapshot<'_>) -> Label {
    let mut text = Label::new();
    match status.tx_power_dbm {
        Some(power) => {
            let _ = write!(text, "{}/{}dB", status.data_rate, power);
        }
        None => {
            let _ = text.push_str(status.data_rate);
        }
    }
    text
}
