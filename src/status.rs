// Terminal status output: a full help panel or a single minimal line.

use crate::rng::Rng32;
use crate::session::Session;
use std::io::{self, Write};

const CLEAR: &str = "\x1b[2J\x1b[H";
const RESET: &str = "\x1b[0m";
const TEXT: &str = "\x1b[38;5;123m";
const NOTE: &str = "\x1b[38;5;76m";
const ON: &str = "\x1b[1m\x1b[32mON\x1b[0m";
const OFF: &str = "\x1b[1m\x1b[31mOFF\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    Full,
    /// One line, drawn in this 256-color index.
    Minimal(u8),
}

impl StatusMode {
    /// CLI value → mode. `1` and `8` trade places so "1" reads as grey.
    pub fn from_arg(arg: Option<u8>) -> Self {
        match arg {
            None | Some(0) => StatusMode::Full,
            Some(1) => StatusMode::Minimal(8),
            Some(8) => StatusMode::Minimal(1),
            Some(n) => StatusMode::Minimal(n),
        }
    }
}

pub struct StatusView<W: Write> {
    out: W,
    mode: StatusMode,
    rng: Rng32,
    base_color: u32,
}

fn on_off(flag: bool) -> &'static str {
    if flag { ON } else { OFF }
}

impl<W: Write> StatusView<W> {
    pub fn new(out: W, mode: StatusMode, rng: Rng32) -> Self {
        Self { out, mode, rng, base_color: 0 }
    }

    /// One line in the next color of the cycling palette.
    fn rainbow(&mut self, text: &str) -> io::Result<()> {
        if self.base_color == 0 {
            self.base_color = self.rng.range(55, 180);
        }
        write!(self.out, "\x1b[38;5;{}m{text}{TEXT}", self.base_color)?;
        self.base_color += 1;
        if self.base_color >= 230 {
            self.base_color = self.rng.range(55, 180);
        }
        Ok(())
    }

    /// Redraw the whole panel for the current session.
    pub fn reprint(&mut self, s: &Session) -> io::Result<()> {
        write!(self.out, "{CLEAR}")?;
        match self.mode {
            StatusMode::Full => self.full(s)?,
            StatusMode::Minimal(color) => self.minimal(s, color)?,
        }
        self.out.flush()
    }

    fn full(&mut self, s: &Session) -> io::Result<()> {
        writeln!(self.out, "\x1b[1m\x1b[0;31m>>> Crimson Lock <<<{RESET}")?;
        self.rainbow("L-CTRL + L-ALT = Toggle BOT ON/OFF\n")?;
        self.rainbow("MOUSE1/MOUSE3 = Target enemy.\n")?;
        self.rainbow("[ = Toggle Auto-Aim.\n")?;
        self.rainbow("] = Toggle crosshair.\n")?;
        self.rainbow("\\ = Hold pressed to print scans per second.\n")?;
        self.rainbow("\nDisable the game crosshair.\n")?;
        writeln!(self.out, "{NOTE}")?;
        writeln!(self.out, "- Make sure anti-aliasing is OFF in VIDEO settings.")?;
        writeln!(self.out, "- Turn off mouse acceleration.")?;
        writeln!(self.out, "- This targets \x1b[1m\x1b[0;31mred{NOTE} things.")?;
        writeln!(self.out, "{TEXT}")?;
        if let Some(w) = s.target {
            writeln!(self.out, "Target Win: 0x{:X}\n", w.id)?;
            self.rainbow(&format!("BOT: {}\n", on_off(s.enabled)))?;
            self.rainbow(&format!("AUTOAIM: {}\n", on_off(s.autoaim)))?;
            self.rainbow(&format!("CROSSHAIR: {}\n", on_off(s.crosshair)))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn minimal(&mut self, s: &Session, color: u8) -> io::Result<()> {
        if s.target.is_some() {
            let c = format!("\x1b[38;5;{color}m");
            write!(
                self.out,
                " {c}BOT: {} | {c}AUTOAIM: {} | {c}CROSSHAIR: {} ",
                on_off(s.enabled),
                on_off(s.autoaim),
                on_off(s.crosshair)
            )
        } else {
            write!(
                self.out,
                "{TEXT}Press {NOTE}L-CTRL{TEXT} + {NOTE}L-ALT{TEXT} to enable bot.{RESET}"
            )
        }
    }

    /// Enabling failed: no window to aim into.
    pub fn window_failure(&mut self) -> io::Result<()> {
        match self.mode {
            StatusMode::Full => writeln!(self.out, "Failed to detect window.")?,
            StatusMode::Minimal(_) => write!(self.out, "{CLEAR}Failed to detect window.")?,
        }
        self.out.flush()
    }

    /// Diagnostic line for the last second's scan count.
    pub fn scans_per_second(&mut self, sps: u32) -> io::Result<()> {
        match self.mode {
            StatusMode::Full => writeln!(self.out, "\x1b[36mSPS: {sps}{RESET}")?,
            StatusMode::Minimal(_) => write!(self.out, "{CLEAR}\x1b[36mSPS: {sps}{RESET}")?,
        }
        self.out.flush()
    }
}
