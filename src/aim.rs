// One control cycle: timeouts, hotkeys, capture, detect, resize, smooth, move.

use crate::config::{Config, FIND_WINDOW_STR};
use crate::platform::{FrameSource, Inputs, Overlay, PointerActuator, WindowResolver};
use crate::pointer::MoveGate;
use crate::session::Session;
use crate::types::{BoundingBox, PixelBuffer};
use crate::vision::{ColorPredicate, Detection, detect};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const CROSSHAIR_IDLE: u32 = 0x00_FF_00;
const CROSSHAIR_LOCKED: u32 = 0xFF_00_00;

/// Raw offset from the reference point to the box center, in buffer pixels.
/// `half` is the half-size the buffer was captured with.
pub fn aim_offset(bbox: &BoundingBox, half: i32) -> (i32, i32) {
    let (a, b) = (bbox.top_left, bbox.bottom_right);
    let dx = (a.x - b.x).abs() / 2;
    let dy = bbox.vertical_extent() / 2;
    ((a.x - half) + dx, (a.y - half) + dy)
}

/// A captured scan window and what was found in it.
pub struct ScanFrame {
    pub buffer: PixelBuffer,
    pub detection: Detection,
    pub half: i32,
}

/// What happened during one cycle, for the status output and preview.
#[derive(Default)]
pub struct CycleReport {
    /// A hotkey changed state: redraw the panel and pause for the debounce delay.
    pub changed: bool,
    /// Enabling failed because no window could be resolved.
    pub window_missing: bool,
    /// Scans per second, reported when the diagnostic key is held at a second boundary.
    pub sps: Option<u32>,
    /// Displacement sent to the pointer this cycle, if any.
    pub moved: Option<(i32, i32)>,
    pub frame: Option<ScanFrame>,
}

struct SpsCounter {
    scans: u32,
    since: Instant,
}

/// Owns the session and the per-run counters; the loop calls `tick` once per scan.
pub struct Controller {
    pub session: Session,
    predicate: ColorPredicate,
    gate: MoveGate,
    sps: SpsCounter,
}

impl Controller {
    pub fn new(cfg: &Config, now: Instant) -> Self {
        Self {
            session: Session::new(cfg),
            predicate: ColorPredicate::RED,
            gate: MoveGate::new(cfg.mouse_update),
            sps: SpsCounter { scans: 0, since: now },
        }
    }

    /// Run one cycle:
    /// 1. timeouts and idle reset
    /// 2. bot toggle (resolves the window on enable)
    /// 3. SPS bookkeeping
    /// 4. autoaim / crosshair toggles
    /// 5. reseed when no trigger is held
    /// 6. capture, detect, resize, smooth, move
    /// 7. outline the scan window
    pub fn tick<D>(&mut self, desk: &mut D, inputs: &Inputs, now: Instant) -> CycleReport
    where
        D: FrameSource + PointerActuator + WindowResolver + Overlay,
    {
        let mut report = CycleReport::default();
        self.session.housekeeping(inputs, now);

        if inputs.toggle_bot && self.session.accepts_hotkey(now) {
            if self.session.enabled {
                self.session.disable(now);
            } else if let Some(window) = desk.resolve(FIND_WINDOW_STR) {
                self.session.enable(window, now);
            } else {
                report.window_missing = true;
                self.session.debounce(now);
            }
            report.changed = true;
        }

        if !self.session.enabled {
            return report;
        }

        if now.saturating_duration_since(self.sps.since) >= Duration::from_secs(1) {
            if inputs.diagnostic {
                report.sps = Some(self.sps.scans);
            }
            self.sps = SpsCounter { scans: 0, since: now };
        }

        if inputs.toggle_autoaim && self.session.accepts_hotkey(now) {
            self.session.toggle_autoaim(now);
            report.changed = true;
        }
        if inputs.toggle_crosshair && self.session.accepts_hotkey(now) {
            self.session.toggle_crosshair(now);
            report.changed = true;
        }

        if !inputs.trigger_held() {
            self.session.smooth.reset();
        }
        if self.session.should_target(inputs) {
            report.frame = self.target(desk, now, &mut report.moved);
        }

        if self.session.crosshair {
            self.draw_crosshair(desk);
        }
        report
    }

    fn target<D>(&mut self, desk: &mut D, now: Instant, moved: &mut Option<(i32, i32)>) -> Option<ScanFrame>
    where
        D: FrameSource + PointerActuator,
    {
        let window = self.session.target?.id;
        let half = self.session.scan.half_size();
        let (cx, cy) = self.session.center;
        let Some(buffer) = desk.capture(window, self.session.scan.region(cx, cy)) else {
            trace!(half, "capture unavailable, skipping cycle");
            return None;
        };
        self.sps.scans += 1;

        let detection = detect(&buffer, &self.predicate);
        match detection {
            Detection::NoTarget => self.session.lose_track(),
            Detection::Partial { top_left } => {
                warn!(x = top_left.x, y = top_left.y, "reverse scan missed a forward match");
            }
            Detection::Found(bbox) => {
                let (mx, my) = aim_offset(&bbox, half);
                let (dx, dy) = self.session.smooth.apply(mx, my);
                self.session.lock(&bbox, now);
                if (dx != 0 || dy != 0) && self.gate.try_pass(now) {
                    desk.move_relative(dx, dy);
                    *moved = Some((dx, dy));
                    debug!(dx, dy, half = self.session.scan.half_size(), "pointer moved");
                }
            }
        }
        Some(ScanFrame { buffer, detection, half })
    }

    fn draw_crosshair<D: Overlay>(&self, desk: &mut D) {
        let Some(window) = self.session.target else { return };
        let half = self.session.scan.half_size();
        let (cx, cy) = self.session.center;
        let color = if self.session.locked_on { CROSSHAIR_LOCKED } else { CROSSHAIR_IDLE };
        desk.draw_frame(window.id, cx - half - 1, cy - half - 1, (half * 2 + 2) as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TargetWindow;
    use crate::types::{Point, Region, WindowId};
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    const WIN: TargetWindow = TargetWindow { id: 9, width: 1000, height: 800 };

    /// In-memory desktop: scripted frames, recorded side effects.
    #[derive(Default)]
    struct FakeDesk {
        window: Option<TargetWindow>,
        frames: VecDeque<Option<PixelBuffer>>,
        captures: Vec<Region>,
        moves: Vec<(i32, i32)>,
        frames_drawn: Vec<(i32, i32, u32, u32)>,
        resolves: usize,
    }

    impl FrameSource for FakeDesk {
        fn capture(&mut self, _window: WindowId, region: Region) -> Option<PixelBuffer> {
            self.captures.push(region);
            self.frames.pop_front().flatten()
        }
    }

    impl PointerActuator for FakeDesk {
        fn move_relative(&mut self, dx: i32, dy: i32) {
            self.moves.push((dx, dy));
        }
    }

    impl WindowResolver for FakeDesk {
        fn resolve(&mut self, _needle: &str) -> Option<TargetWindow> {
            self.resolves += 1;
            self.window
        }
    }

    impl Overlay for FakeDesk {
        fn draw_frame(&mut self, _window: WindowId, x: i32, y: i32, size: u32, color: u32) {
            self.frames_drawn.push((x, y, size, color));
        }
    }

    fn frame(size: u32, square: Option<(u32, u32, u32, u32)>) -> Option<PixelBuffer> {
        let mut img = RgbImage::from_pixel(size, size, Rgb([30, 30, 30]));
        if let Some((x0, y0, x1, y1)) = square {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    img.put_pixel(x, y, Rgb([255, 0, 0]));
                }
            }
        }
        Some(PixelBuffer::from_image(img))
    }

    fn enabled(cfg: &Config, desk: &mut FakeDesk, t0: Instant) -> Controller {
        desk.window = Some(WIN);
        let mut c = Controller::new(cfg, t0);
        let on = Inputs { toggle_bot: true, ..Inputs::default() };
        assert!(c.tick(desk, &on, t0).changed);
        assert!(c.session.enabled);
        c
    }

    fn trigger() -> Inputs {
        Inputs { primary: true, ..Inputs::default() }
    }

    #[test]
    fn offset_is_zero_for_centered_box() {
        let b = BoundingBox { top_left: Point::new(90, 90), bottom_right: Point::new(110, 110) };
        assert_eq!(aim_offset(&b, 100), (0, 0));
        let b = BoundingBox { top_left: Point::new(120, 40), bottom_right: Point::new(130, 60) };
        assert_eq!(aim_offset(&b, 100), (25, -50));
    }

    #[test]
    fn centered_target_settles_without_moving() {
        let cfg = Config { mouse_smooth: 1, mouse_scaler: 8.0, ..Config::default() };
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);

        // Box centered in the wide window: raw offset is (0, 0); the seeded
        // slot decays 8 -> 4 -> 2 -> 1 -> 0.
        let mut outputs = Vec::new();
        let mut t = t0 + Duration::from_millis(400);
        for _ in 0..6 {
            let half = c.session.scan.half_size() as u32;
            let (lo, hi) = (half - 10, half + 10);
            desk.frames.push_back(frame(half * 2, Some((lo, lo, hi, hi))));
            let r = c.tick(&mut desk, &trigger(), t);
            let found = matches!(r.frame.as_ref().map(|f| f.detection), Some(Detection::Found(_)));
            assert!(found);
            outputs.push(r.moved);
            t += Duration::from_millis(20);
        }
        assert_eq!(desk.captures[0], Region { x: 400, y: 300, size: 200 });
        assert_eq!(outputs[0], Some((4, 4)));
        assert_eq!(*outputs.last().unwrap(), None, "settled on target");
        assert!(c.session.locked_on);
    }

    #[test]
    fn no_target_resets_window_and_lock() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);

        desk.frames.push_back(frame(200, Some((95, 95, 97, 97))));
        c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(10));
        assert_eq!(c.session.scan.half_size(), 6);
        assert!(c.session.locked_on);

        desk.frames.push_back(frame(12, None));
        let r = c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(20));
        assert_eq!(r.frame.map(|f| f.detection), Some(Detection::NoTarget));
        assert_eq!(c.session.scan.half_size(), 100);
        assert!(!c.session.locked_on);
    }

    #[test]
    fn failed_capture_skips_cycle() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        desk.frames.push_back(frame(200, Some((95, 95, 97, 97))));
        c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(10));

        desk.frames.push_back(None);
        let r = c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(20));
        assert!(r.frame.is_none());
        assert_eq!(c.session.scan.half_size(), 6);
        assert!(c.session.locked_on);
    }

    #[test]
    fn pointer_moves_are_rate_limited() {
        let cfg = Config { mouse_update: Duration::from_millis(16), ..Config::default() };
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        let mut times = Vec::new();
        for i in 0..40u64 {
            let now = t0 + Duration::from_millis(400 + i * 3);
            let half = c.session.scan.half_size() as u32;
            // Target off to the right so every cycle wants a move.
            let x = half * 2 - 3;
            desk.frames.push_back(frame(half * 2, Some((x, half, x + 1, half + 1))));
            if c.tick(&mut desk, &trigger(), now).moved.is_some() {
                times.push(now);
            }
        }
        assert!(times.len() >= 5);
        for w in times.windows(2) {
            assert!(w[1] - w[0] > cfg.mouse_update);
        }
        assert_eq!(times.len(), desk.moves.len());
    }

    #[test]
    fn autoaim_timeout_resets_but_stays_enabled() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        let aim = Inputs { toggle_autoaim: true, ..Inputs::default() };
        let t1 = t0 + Duration::from_millis(400);
        c.tick(&mut desk, &aim, t1);
        assert!(c.session.autoaim);

        // Lock onto a small target with the trigger held so the filter runs.
        desk.frames.push_back(frame(200, Some((150, 150, 152, 152))));
        let t2 = t1 + Duration::from_millis(10);
        assert!(c.tick(&mut desk, &trigger(), t2).moved.is_some());
        assert_eq!(c.session.scan.half_size(), 6);

        // Only empty frames from here on. The filter keeps its history
        // until the lock times out.
        let mut t = t2;
        for _ in 0..5 {
            t += Duration::from_millis(20);
            desk.frames.push_back(frame(200, None));
            c.tick(&mut desk, &trigger(), t);
        }
        assert!(!c.session.locked_on);
        assert_ne!(c.session.smooth.clone().apply(0, 0), (4, 4));

        desk.frames.push_back(frame(200, None));
        c.tick(&mut desk, &trigger(), t2 + Duration::from_millis(340));
        assert_eq!(c.session.scan.half_size(), 100);
        assert!(c.session.enabled && c.session.autoaim);
        // Reseeded filter gives the seed response on a centered box.
        assert_eq!(c.session.smooth.clone().apply(0, 0), (4, 4));
    }

    #[test]
    fn repeated_toggle_inside_debounce_is_ignored() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        let on = Inputs { toggle_bot: true, ..Inputs::default() };

        let r = c.tick(&mut desk, &on, t0 + Duration::from_millis(100));
        assert!(!r.changed);
        assert!(c.session.enabled);

        let r = c.tick(&mut desk, &on, t0 + Duration::from_millis(300));
        assert!(r.changed);
        assert!(!c.session.enabled);
        assert_eq!(desk.resolves, 1);
    }

    #[test]
    fn missing_window_keeps_bot_disabled() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = Controller::new(&cfg, t0);
        let on = Inputs { toggle_bot: true, ..Inputs::default() };
        let r = c.tick(&mut desk, &on, t0);
        assert!(r.window_missing && r.changed);
        assert!(!c.session.enabled);
        assert!(desk.captures.is_empty());
    }

    #[test]
    fn no_targeting_without_trigger_or_autoaim() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        let r = c.tick(&mut desk, &Inputs::default(), t0 + Duration::from_millis(400));
        assert!(r.frame.is_none());
        assert!(desk.captures.is_empty());
    }

    #[test]
    fn crosshair_tracks_window_and_lock_color() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        assert_eq!(desk.frames_drawn.last(), Some(&(399, 299, 202, CROSSHAIR_IDLE)));

        desk.frames.push_back(frame(200, Some((95, 95, 97, 97))));
        c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(400));
        assert_eq!(desk.frames_drawn.last(), Some(&(493, 393, 14, CROSSHAIR_LOCKED)));

        let hide = Inputs { toggle_crosshair: true, primary: true, ..Inputs::default() };
        let drawn = desk.frames_drawn.len();
        c.tick(&mut desk, &hide, t0 + Duration::from_millis(800));
        assert!(!c.session.crosshair);
        assert_eq!(desk.frames_drawn.len(), drawn);
    }

    #[test]
    fn sps_reported_only_with_diagnostic_key() {
        let cfg = Config::default();
        let t0 = Instant::now();
        let mut desk = FakeDesk::default();
        let mut c = enabled(&cfg, &mut desk, t0);
        for i in 0..3 {
            desk.frames.push_back(frame(200, None));
            c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(400 + i * 10));
        }
        let diag = Inputs { diagnostic: true, ..Inputs::default() };
        desk.frames.push_back(frame(200, None));
        let r = c.tick(&mut desk, &diag, t0 + Duration::from_millis(1000));
        assert_eq!(r.sps, Some(3));

        desk.frames.push_back(frame(200, None));
        let r = c.tick(&mut desk, &trigger(), t0 + Duration::from_millis(2000));
        assert_eq!(r.sps, None);
    }
}
