// Displacement smoothing: a fixed ring of recent scaled offsets averaged with
// each new sample. Slots are seeded with the scaler (not zero) so the first
// move after re-acquisition does not jump.

use crate::config::MAX_SMOOTH;

#[derive(Debug, Clone)]
pub struct SmoothingBuffer {
    xs: Vec<f32>,
    ys: Vec<f32>,
    head: usize,
    scaler: f32,
}

impl SmoothingBuffer {
    /// `depth` is clamped to `MAX_SMOOTH`; 0 means the filter is bypassed.
    pub fn new(depth: usize, scaler: f32) -> Self {
        let depth = depth.min(MAX_SMOOTH);
        Self { xs: vec![scaler; depth], ys: vec![scaler; depth], head: 0, scaler }
    }

    pub fn depth(&self) -> usize { self.xs.len() }

    /// Reseed every slot. Length never changes.
    pub fn reset(&mut self) {
        self.xs.fill(self.scaler);
        self.ys.fill(self.scaler);
        self.head = 0;
    }

    /// Turn a raw aim offset into the displacement to apply.
    pub fn apply(&mut self, mx: i32, my: i32) -> (i32, i32) {
        let sx = (mx as f32 * self.scaler).round();
        let sy = (my as f32 * self.scaler).round();

        let depth = self.depth();
        if depth == 0 {
            // Unfiltered path adds the scaled offset on top of the offset.
            // `as` saturates, so a huge scaler pins the move instead of wrapping.
            return (mx.saturating_add(sx as i32), my.saturating_add(sy as i32));
        }

        let n = (depth + 1) as f32;
        let tx = (self.xs.iter().sum::<f32>() + sx) / n;
        let ty = (self.ys.iter().sum::<f32>() + sy) / n;
        self.xs[self.head] = tx;
        self.ys[self.head] = ty;
        self.head = (self.head + 1) % depth;
        (tx as i32, ty as i32)
    }
}
