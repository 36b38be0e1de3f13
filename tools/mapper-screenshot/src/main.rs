//! Host-side receiver for mapper framebuffer dumps
//!
//! Reads console output from the tracker's serial port, picks out
//! `SCREEN DUMP` / `RLE DUMP` blocks and saves each one as a PNG.
//! A regular file given as the port is replayed instead, which is handy
//! for console logs captured earlier.

mod output;
mod receiver;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mapper_display::capture::{decode_ascii, decode_rle};
use mapper_display::{Framebuffer, Geometry, ScreenConfig};
use serde::Deserialize;

use receiver::{Capture, Receiver};

#[derive(Parser)]
#[command(name = "mapper-screenshot")]
#[command(about = "Save framebuffer dumps from the serial console as PNGs", long_about = None)]
#[command(version)]
struct Cli {
    /// Serial port (e.g. COM3, /dev/ttyUSB0), or a file of captured output
    #[arg(short, long)]
    port: PathBuf,
    /// Baud rate
    #[arg(short, long, default_value_t = 115_200)]
    baud: u32,
    /// Base name for output files
    #[arg(short, long, default_value = "screenshot.png")]
    output: PathBuf,
    /// TOML file with a `[screen]` table; sets the geometry for RLE dumps
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Exit after the first screenshot
    #[arg(long)]
    once: bool,
}

/// A dump in progress is closed after this much silence
const READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
struct ToolConfig {
    #[serde(default)]
    screen: ScreenConfig,
}

fn load_config(path: &Path) -> Result<ScreenConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_config(text: &str) -> Result<ScreenConfig> {
    let config: ToolConfig = toml::from_str(text)?;
    config
        .screen
        .validate()
        .map_err(|e| anyhow!("screen config rejected: {e:?}"))?;
    Ok(config.screen)
}

/// Turn a finished capture into a framebuffer
fn decode(capture: &Capture, geometry: Geometry) -> Result<Framebuffer> {
    match capture {
        Capture::Rle(data) => {
            decode_rle(data, geometry).map_err(|e| anyhow!("bad RLE dump: {e:?}"))
        }
        Capture::Ascii(rows) => {
            let width = rows.first().map_or(0, |r| r.len());
            let geometry = u16::try_from(width)
                .ok()
                .zip(u16::try_from(rows.len()).ok())
                .and_then(|(w, h)| Geometry::from_dimensions(w, h))
                .ok_or_else(|| anyhow!("unsupported dump size {}x{}", width, rows.len()))?;
            decode_ascii(rows.iter().map(String::as_str), geometry)
                .map_err(|e| anyhow!("bad screen dump: {e:?}"))
        }
    }
}

/// Serial port, or a plain file to replay
fn open_input(path: &Path, baud: u32) -> Result<Box<dyn Read>> {
    if std::fs::metadata(path).is_ok_and(|m| m.is_file()) {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        return Ok(Box::new(file));
    }

    let port = serialport::new(path.to_string_lossy(), baud)
        .timeout(READ_TIMEOUT)
        .open()
        .with_context(|| format!("Failed to open serial port {}", path.display()))?;
    Ok(Box::new(port))
}

/// Decode and save one capture; returns whether a file was written
fn handle(capture: &Capture, geometry: Geometry, output: &Path) -> Result<bool> {
    match decode(capture, geometry) {
        Ok(framebuffer) => {
            let path = output::save(&framebuffer, output, &output::timestamp())?;
            println!("--- Screenshot saved to '{}' ---", path.display());
            Ok(true)
        }
        Err(e) => {
            eprintln!("--- Skipping dump: {e} ---");
            Ok(false)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScreenConfig::new(),
    };

    let input = open_input(&cli.port, cli.baud)?;
    println!("--- Listening on {} at {} bps ---", cli.port.display(), cli.baud);

    let mut reader = BufReader::new(input);
    let mut receiver = Receiver::new();
    let mut raw = Vec::new();

    loop {
        let capture = match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&raw).into_owned();
                raw.clear();
                receiver.feed(&line)
            }
            // A partial line stays in `raw` until the rest arrives
            Err(e) if e.kind() == io::ErrorKind::TimedOut => receiver.timeout(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", cli.port.display()))
            }
        };

        if let Some(capture) = capture {
            if handle(&capture, config.geometry, &cli.output)? && cli.once {
                return Ok(());
            }
        }
    }

    if let Some(capture) = receiver.timeout() {
        handle(&capture, config.geometry, &cli.output)?;
    }
    Ok(())
}
