// Adaptive scan-window sizing.
// The window shrinks toward the target's height while tracking and snaps
// back to the wide search size once tracking is lost.

use crate::types::Region;

pub const INITIAL_HALF: i32 = 100;
pub const MIN_HALF: i32 = 6;

/// Half-width of the square capture region; always within `[MIN_HALF, INITIAL_HALF]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    half: i32,
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self { half: INITIAL_HALF }
    }
}

impl ScanWindow {
    pub fn half_size(&self) -> i32 { self.half }
    pub fn size(&self) -> i32 { self.half * 2 }

    /// Capture region centered on `(cx, cy)`.
    pub fn region(&self, cx: i32, cy: i32) -> Region {
        Region { x: cx - self.half, y: cy - self.half, size: self.size() as u32 }
    }

    /// Feed the vertical extent of a found box.
    pub fn update(&mut self, ady: i32) {
        if ady > MIN_HALF && ady < INITIAL_HALF {
            self.half = (self.half + ady) / 2;
        } else if ady <= MIN_HALF {
            self.half = MIN_HALF;
        }
        // ady >= INITIAL_HALF: too large to trust, keep the current size.
    }

    /// Back to the wide search window.
    pub fn reset(&mut self) {
        self.half = INITIAL_HALF;
    }
}
