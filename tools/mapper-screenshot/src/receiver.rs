//! Picks framebuffer dumps out of console output, one line at a time

use mapper_display::capture::{
    ASCII_BEGIN_MARKER, ASCII_END_MARKER, RLE_BEGIN_MARKER, RLE_END_MARKER,
};
use mapper_display::config::MAX_HEIGHT;

/// A complete dump lifted from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// `#`/`.` rows, top to bottom
    Ascii(Vec<String>),
    /// The single token line
    Rle(String),
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    AsciiRows(Vec<String>),
    RleData,
    RleEnd(String),
}

impl State {
    /// State entered by a begin marker, if `line` is one
    fn begin(line: &str) -> Option<Self> {
        if line.contains(RLE_BEGIN_MARKER) {
            Some(State::RleData)
        } else if line.contains(ASCII_BEGIN_MARKER) {
            Some(State::AsciiRows(Vec::new()))
        } else {
            None
        }
    }
}

/// Line-driven dump detector
///
/// A begin marker always starts a new dump, so a dump whose end marker
/// was lost cannot swallow the ones after it.
#[derive(Debug, Default)]
pub struct Receiver {
    state: State,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one console line; returns a capture when one completes
    pub fn feed(&mut self, line: &str) -> Option<Capture> {
        let line = line.trim();

        match std::mem::take(&mut self.state) {
            State::Idle => {
                self.state = State::begin(line).unwrap_or_default();
                None
            }
            State::AsciiRows(mut rows) => {
                if line.contains(ASCII_END_MARKER) {
                    return Some(Capture::Ascii(rows));
                }
                if let Some(next) = State::begin(line) {
                    eprintln!("warning: screen dump cut short after {} rows", rows.len());
                    self.state = next;
                    return None;
                }
                if !line.is_empty() {
                    if rows.len() == MAX_HEIGHT {
                        // End marker lost; no panel is taller than this
                        eprintln!("warning: screen dump end marker missing");
                        return Some(Capture::Ascii(rows));
                    }
                    rows.push(line.to_string());
                }
                self.state = State::AsciiRows(rows);
                None
            }
            State::RleData => {
                if let Some(next) = State::begin(line) {
                    eprintln!("warning: RLE dump without data");
                    self.state = next;
                    return None;
                }
                self.state = if line.is_empty() {
                    State::RleData
                } else {
                    State::RleEnd(line.to_string())
                };
                None
            }
            State::RleEnd(data) => {
                if !line.contains(RLE_END_MARKER) {
                    eprintln!("warning: expected RLE end marker, got {line:?}");
                    self.state = State::begin(line).unwrap_or_default();
                }
                Some(Capture::Rle(data))
            }
        }
    }

    /// The input went quiet: finish whatever has been gathered
    pub fn timeout(&mut self) -> Option<Capture> {
        match std::mem::take(&mut self.state) {
            State::AsciiRows(rows) if !rows.is_empty() => Some(Capture::Ascii(rows)),
            State::RleEnd(data) => Some(Capture::Rle(data)),
            _ => None,
        }
    }

    /// True while inside a dump
    pub fn is_capturing(&self) -> bool {
        !matches!(self.state, State::Idle)
    }
}
