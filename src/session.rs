// Session state machine: bot on/off, autoaim, crosshair, lock-on.
// The control loop is the only writer; nothing here is shared across threads.

use crate::config::{Config, LOCK_TIMEOUT, OPTION_DELAY};
use crate::platform::{Inputs, TargetWindow};
use crate::scan::ScanWindow;
use crate::smooth::SmoothingBuffer;
use crate::types::BoundingBox;
use std::time::Instant;
use tracing::{debug, info};

/// Everything the control loop toggles or tracks between cycles.
#[derive(Debug, Clone)]
pub struct Session {
    pub enabled: bool,
    pub autoaim: bool,
    pub crosshair: bool,
    pub locked_on: bool,
    /// Last window resolved, shown on the status panel.
    pub target: Option<TargetWindow>,
    /// Reference point inside `target`, set on enable.
    pub center: (i32, i32),
    pub scan: ScanWindow,
    pub smooth: SmoothingBuffer,
    autoaim_start: Option<Instant>,
    debounce_until: Option<Instant>,
}

impl Session {
    /// Disabled, crosshair shown, wide scan window, filter seeded from `cfg`.
    pub fn new(cfg: &Config) -> Self {
        Self {
            enabled: false,
            autoaim: false,
            crosshair: true,
            locked_on: false,
            target: None,
            center: (0, 0),
            scan: ScanWindow::default(),
            smooth: SmoothingBuffer::new(cfg.mouse_smooth, cfg.mouse_scaler),
            autoaim_start: None,
            debounce_until: None,
        }
    }

    /// Restore the wide scan window and reseed the filter.
    pub fn reset_tracking(&mut self) {
        self.scan.reset();
        self.smooth.reset();
    }

    /// Per-cycle timeouts, run before hotkeys are read.
    pub fn housekeeping(&mut self, inputs: &Inputs, now: Instant) {
        if self.autoaim && self.lock_timed_out(now) {
            // Lost lock: keep searching, from the wide window.
            self.reset_tracking();
        } else if self.enabled && !self.autoaim && !inputs.trigger_held() {
            self.reset_tracking();
            self.locked_on = false;
        }
    }

    fn lock_timed_out(&self, now: Instant) -> bool {
        match self.autoaim_start {
            None => true,
            Some(start) => now.saturating_duration_since(start) > LOCK_TIMEOUT,
        }
    }

    /// Hotkeys are ignored until the debounce delay after the last toggle.
    pub fn accepts_hotkey(&self, now: Instant) -> bool {
        self.debounce_until.is_none_or(|until| now >= until)
    }

    /// Start the debounce window without changing state (failed enable).
    pub fn debounce(&mut self, now: Instant) {
        self.debounce_until = Some(now + OPTION_DELAY);
    }

    /// Turn the bot on for `window`. The reference point becomes the window
    /// center and tracking starts from the wide window.
    pub fn enable(&mut self, window: TargetWindow, now: Instant) {
        self.target = Some(window);
        self.center = window.center();
        self.enabled = true;
        self.reset_tracking();
        self.debounce(now);
        info!(window = window.id, cx = self.center.0, cy = self.center.1, "bot enabled");
    }

    /// Turn the bot off. Autoaim and crosshair keep their settings.
    pub fn disable(&mut self, now: Instant) {
        self.enabled = false;
        self.locked_on = false;
        self.debounce(now);
        info!("bot disabled");
    }

    /// Flip autoaim. The lock clock only starts on the next lock.
    pub fn toggle_autoaim(&mut self, now: Instant) {
        self.autoaim = !self.autoaim;
        self.debounce(now);
        info!(autoaim = self.autoaim, "autoaim toggled");
    }

    /// Flip the scan-window outline.
    pub fn toggle_crosshair(&mut self, now: Instant) {
        self.crosshair = !self.crosshair;
        self.debounce(now);
        debug!(crosshair = self.crosshair, "crosshair toggled");
    }

    /// Whether detection runs this cycle.
    pub fn should_target(&self, inputs: &Inputs) -> bool {
        self.enabled && (inputs.trigger_held() || self.autoaim || inputs.diagnostic)
    }

    /// First scan pass found nothing.
    pub fn lose_track(&mut self) {
        self.scan.reset();
        self.locked_on = false;
    }

    /// Both corners found: lock on, resize the window, refresh the autoaim clock.
    pub fn lock(&mut self, bbox: &BoundingBox, now: Instant) {
        self.locked_on = true;
        self.scan.update(bbox.vertical_extent());
        if self.autoaim {
            self.autoaim_start = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use std::time::Duration;

    const WIN: TargetWindow = TargetWindow { id: 42, width: 1000, height: 800 };

    fn small_box() -> BoundingBox {
        BoundingBox { top_left: Point::new(10, 10), bottom_right: Point::new(12, 12) }
    }

    fn held() -> Inputs {
        Inputs { primary: true, ..Inputs::default() }
    }

    #[test]
    fn enable_sets_center_and_debounces() {
        let t0 = Instant::now();
        let mut s = Session::new(&Config::default());
        assert!(s.accepts_hotkey(t0));
        s.enable(WIN, t0);
        assert!(s.enabled);
        assert_eq!(s.center, (500, 400));
        assert!(!s.accepts_hotkey(t0 + Duration::from_millis(299)));
        assert!(s.accepts_hotkey(t0 + OPTION_DELAY));
    }

    #[test]
    fn lock_shrinks_window_and_sets_flag() {
        let t0 = Instant::now();
        let mut s = Session::new(&Config::default());
        s.enable(WIN, t0);
        s.lock(&small_box(), t0);
        assert!(s.locked_on);
        assert_eq!(s.scan.half_size(), 6);
        s.lose_track();
        assert!(!s.locked_on);
        assert_eq!(s.scan.half_size(), 100);
    }

    #[test]
    fn idle_reset_clears_lock_when_no_trigger() {
        let t0 = Instant::now();
        let mut s = Session::new(&Config::default());
        s.enable(WIN, t0);
        s.lock(&small_box(), t0);
        s.housekeeping(&held(), t0);
        assert!(s.locked_on, "trigger held keeps the lock");
        s.housekeeping(&Inputs::default(), t0);
        assert!(!s.locked_on);
        assert_eq!(s.scan.half_size(), 100);
    }

    #[test]
    fn autoaim_lock_times_out_but_stays_enabled() {
        let t0 = Instant::now();
        let mut s = Session::new(&Config::default());
        s.enable(WIN, t0);
        s.toggle_autoaim(t0);
        s.lock(&small_box(), t0);

        s.housekeeping(&held(), t0 + Duration::from_millis(300));
        assert_eq!(s.scan.half_size(), 6, "still inside the timeout");

        s.housekeeping(&held(), t0 + Duration::from_millis(334));
        assert_eq!(s.scan.half_size(), 100);
        assert!(s.enabled && s.autoaim);
    }

    #[test]
    fn detection_refreshes_autoaim_clock() {
        let t0 = Instant::now();
        let mut s = Session::new(&Config::default());
        s.enable(WIN, t0);
        s.toggle_autoaim(t0);
        s.lock(&small_box(), t0);
        s.lock(&small_box(), t0 + Duration::from_millis(300));
        s.housekeeping(&held(), t0 + Duration::from_millis(500));
        assert_eq!(s.scan.half_size(), 6);
    }

    #[test]
    fn targeting_gate() {
        let mut s = Session::new(&Config::default());
        let diag = Inputs { diagnostic: true, ..Inputs::default() };
        assert!(!s.should_target(&held()));
        s.enable(WIN, Instant::now());
        assert!(s.should_target(&held()));
        assert!(s.should_target(&diag));
        assert!(!s.should_target(&Inputs::default()));
        s.autoaim = true;
        assert!(s.should_target(&Inputs::default()));
    }
}
