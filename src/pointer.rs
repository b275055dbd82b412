// Rate gate for pointer moves, checked against the monotonic clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct MoveGate {
    interval: Duration,
    last: Option<Instant>,
}

impl MoveGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True (and records `now`) when more than `interval` has passed since
    /// the last accepted move.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        let open = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        };
        if open {
            self.last = Some(now);
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_passes() {
        let mut g = MoveGate::new(Duration::from_millis(16));
        assert!(g.try_pass(Instant::now()));
    }

    #[test]
    fn gate_requires_strictly_more_than_interval() {
        let t0 = Instant::now();
        let mut g = MoveGate::new(Duration::from_millis(16));
        assert!(g.try_pass(t0));
        assert!(!g.try_pass(t0 + Duration::from_millis(16)));
        assert!(g.try_pass(t0 + Duration::from_micros(16_001)));
    }

    #[test]
    fn accepted_moves_are_never_closer_than_interval() {
        let interval = Duration::from_micros(16_000);
        let t0 = Instant::now();
        let mut g = MoveGate::new(interval);
        let mut accepted = Vec::new();
        // Bursty request times: several per millisecond, then gaps.
        let mut t = 0u64;
        for i in 0..5_000u64 {
            t += if i % 50 == 0 { 7_000 } else { 150 + (i * 37) % 400 };
            let now = t0 + Duration::from_micros(t);
            if g.try_pass(now) {
                accepted.push(now);
            }
        }
        assert!(accepted.len() > 10);
        for w in accepted.windows(2) {
            assert!(w[1] - w[0] > interval);
        }
    }
}
