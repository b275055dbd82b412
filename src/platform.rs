// Seams to the desktop: everything the control loop needs from the outside
// world. `x11.rs` implements these for a live X server; tests use a fake.

use crate::mouse::Buttons;
use crate::types::{PixelBuffer, Region, WindowId};

/// Window picked as the aim target, with its size at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWindow {
    pub id: WindowId,
    pub width: u32,
    pub height: u32,
}

impl TargetWindow {
    /// Reference point in window-local coordinates.
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

/// Grabs a square region of a window. `None` when the region is unavailable
/// (window gone, off-screen); the caller just skips that cycle.
pub trait FrameSource {
    fn capture(&mut self, window: WindowId, region: Region) -> Option<PixelBuffer>;
}

/// Relative pointer motion. Best effort, no acknowledgement.
pub trait PointerActuator {
    fn move_relative(&mut self, dx: i32, dy: i32);
}

/// Finds the window to aim into.
pub trait WindowResolver {
    fn resolve(&mut self, needle: &str) -> Option<TargetWindow>;
}

/// Draws the scan-window outline on the target window.
pub trait Overlay {
    fn draw_frame(&mut self, window: WindowId, x: i32, y: i32, size: u32, color: u32);
}

/// Logical keys the loop listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ControlL,
    AltL,
    BracketLeft,
    BracketRight,
    Backslash,
}

impl Key {
    pub const ALL: [Key; 5] = [Key::ControlL, Key::AltL, Key::BracketLeft, Key::BracketRight, Key::Backslash];

    /// X11 keysym for this key.
    pub fn keysym(self) -> u32 {
        match self {
            Key::ControlL => 0xffe3,
            Key::AltL => 0xffe9,
            Key::BracketLeft => 0x005b,
            Key::BracketRight => 0x005d,
            Key::Backslash => 0x005c,
        }
    }
}

/// Polled keyboard state.
pub trait KeyQuery {
    fn is_down(&self, key: Key) -> bool;
}

/// Everything a control cycle reads from the input devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inputs {
    /// L-CTRL and L-ALT together: bot on/off.
    pub toggle_bot: bool,
    /// `[`: autoaim on/off.
    pub toggle_autoaim: bool,
    /// `]`: crosshair on/off.
    pub toggle_crosshair: bool,
    /// `\`: force targeting and report scans per second.
    pub diagnostic: bool,
    /// Primary pointer button.
    pub primary: bool,
    /// Auxiliary pointer button (middle).
    pub aux: bool,
}

impl Inputs {
    /// Read every hotkey and the latest button snapshot once.
    pub fn poll(keys: &impl KeyQuery, buttons: Buttons) -> Self {
        Self {
            toggle_bot: keys.is_down(Key::ControlL) && keys.is_down(Key::AltL),
            toggle_autoaim: keys.is_down(Key::BracketLeft),
            toggle_crosshair: keys.is_down(Key::BracketRight),
            diagnostic: keys.is_down(Key::Backslash),
            primary: buttons.primary(),
            aux: buttons.aux(),
        }
    }

    /// Primary or auxiliary button is down.
    pub fn trigger_held(&self) -> bool {
        self.primary || self.aux
    }
}
