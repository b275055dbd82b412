// Runtime settings: built-in defaults overlaid by `config.txt`.
// File format is one `<NAME> <number>` pair per line; anything else is skipped.

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "config.txt";

/// Substring matched against window titles when the bot is enabled.
pub const FIND_WINDOW_STR: &str = "Quake";

/// Pause after any hotkey action so one physical press toggles once.
pub const OPTION_DELAY: Duration = Duration::from_micros(300_000);

/// Autoaim gives up on a lock after this long without a detection.
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(333);

/// Largest smoothing depth the ring buffer accepts.
pub const MAX_SMOOTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sleep between control cycles.
    pub scan_delay: Duration,
    /// Minimum gap between two pointer moves.
    pub mouse_update: Duration,
    /// Multiplier applied to the raw aim offset.
    pub mouse_scaler: f32,
    /// Smoothing ring depth, 0 disables the filter.
    pub mouse_smooth: usize,
    /// Preview window scale (0 = no preview, else 1, 2 or 4).
    pub preview_scale: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_delay: Duration::from_micros(8_000),
            mouse_update: Duration::from_micros(16_000),
            mouse_scaler: 8.0,
            mouse_smooth: 1,
            preview_scale: 0,
        }
    }
}

impl Config {
    /// Load `path` on top of the defaults. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(Error::Config { path: path.display().to_string(), source }),
        }
    }

    /// Apply every recognized line of `text` to the defaults.
    pub fn parse(text: &str) -> Self {
        let mut cfg = Self::default();
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(raw)) = (parts.next(), parts.next()) else { continue };
            let Ok(val) = raw.parse::<f32>() else { continue };
            if cfg.apply(name, val) {
                info!(setting = name, value = val, "setting loaded");
            }
        }
        cfg.mouse_smooth = cfg.mouse_smooth.min(MAX_SMOOTH);
        cfg
    }

    fn apply(&mut self, name: &str, val: f32) -> bool {
        match name {
            "SCAN_DELAY_US" => self.scan_delay = Duration::from_micros(val as u64),
            "MOUSE_UPDATE_US" => self.mouse_update = Duration::from_micros(val as u64),
            "MOUSE_SCALE" => self.mouse_scaler = val,
            "MOUSE_SMOOTH" => self.mouse_smooth = val as usize,
            "PREVIEW_SCALE" => {
                self.preview_scale = match val as u8 {
                    s @ (1 | 2 | 4) => s,
                    _ => 0,
                }
            }
            _ => return false,
        }
        true
    }
}
