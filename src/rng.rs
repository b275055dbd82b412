// Tiny xorshift RNG (no external crate); only drives status-panel colors.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct Rng32 { state: u32 }

impl Rng32 {
    pub fn from_seed(seed: u32) -> Self { Self { state: seed | 1 } }

    /// Seed from the wall clock.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0x2545_F491);
        Self::from_seed(nanos)
    }

    #[inline] pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform integer in `[min, max)`.
    #[inline] pub fn range(&mut self, min: u32, max: u32) -> u32 {
        min + self.next_u32() % (max - min)
    }
}
