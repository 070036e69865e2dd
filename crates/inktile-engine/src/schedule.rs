//! Repaint scheduling and input throttling.

use std::time::{Duration, Instant};

/// Minimum interval between real redraws and between throttled input
/// handler invocations (~60 Hz).
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Interval between empty-tile eviction passes.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed-interval rate limiter for high-frequency input handlers.
///
/// Bounds handler invocation frequency independently of the raw input
/// event rate. The first call always fires.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Returns true when at least `interval` has elapsed since the last
    /// firing; records `now` as the new firing time when it does.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(MIN_FRAME_INTERVAL)
    }
}

type RepaintHook = Box<dyn FnMut()>;

/// Coalescing repaint scheduler.
///
/// A newly requested repaint supersedes a pending one rather than
/// queuing a second; the notification hook fires only on the
/// idle-to-pending edge. The actual paint additionally throttles to
/// [`MIN_FRAME_INTERVAL`] between real redraws, decoupling input
/// sampling rate from paint rate.
#[derive(Default)]
pub struct RepaintScheduler {
    pending: bool,
    throttle: Throttle,
    hook: Option<RepaintHook>,
}

impl RepaintScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the host notification hook.
    pub fn set_hook(&mut self, hook: impl FnMut() + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Request a repaint. Idempotent while one is already pending.
    pub fn request(&mut self) {
        if self.pending {
            return;
        }
        self.pending = true;
        if let Some(hook) = self.hook.as_mut() {
            hook();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request if the frame throttle allows a redraw
    /// now. A throttled-out request stays pending for the next frame.
    pub fn should_paint(&mut self, now: Instant) -> bool {
        if !self.pending || !self.throttle.ready(now) {
            return false;
        }
        self.pending = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_call_fires() {
        let mut throttle = Throttle::new(Duration::from_millis(16));
        assert!(throttle.ready(Instant::now()));
    }

    #[test]
    fn test_throttle_blocks_within_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(16));
        let t0 = Instant::now();
        assert!(throttle.ready(t0));
        assert!(!throttle.ready(t0 + Duration::from_millis(5)));
        assert!(!throttle.ready(t0 + Duration::from_millis(15)));
        assert!(throttle.ready(t0 + Duration::from_millis(16)));
    }

    #[test]
    fn test_throttle_reset() {
        let mut throttle = Throttle::new(Duration::from_millis(16));
        let t0 = Instant::now();
        assert!(throttle.ready(t0));
        throttle.reset();
        assert!(throttle.ready(t0 + Duration::from_millis(1)));
    }

    #[test]
    fn test_requests_coalesce() {
        let mut scheduler = RepaintScheduler::new();
        let t0 = Instant::now();

        scheduler.request();
        scheduler.request();
        scheduler.request();

        assert!(scheduler.is_pending());
        assert!(scheduler.should_paint(t0));
        // All three requests were satisfied by one paint.
        assert!(!scheduler.is_pending());
        assert!(!scheduler.should_paint(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn test_throttled_request_stays_pending() {
        let mut scheduler = RepaintScheduler::new();
        let t0 = Instant::now();

        scheduler.request();
        assert!(scheduler.should_paint(t0));

        scheduler.request();
        // Within the frame interval: not painted, still pending.
        assert!(!scheduler.should_paint(t0 + Duration::from_millis(5)));
        assert!(scheduler.is_pending());
        // Next frame: painted.
        assert!(scheduler.should_paint(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn test_hook_fires_on_edge_only() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut scheduler = RepaintScheduler::new();
        let count = Rc::new(Cell::new(0u32));
        let hook_count = count.clone();
        scheduler.set_hook(move || hook_count.set(hook_count.get() + 1));

        scheduler.request();
        scheduler.request();
        assert_eq!(count.get(), 1);

        assert!(scheduler.should_paint(Instant::now()));
        scheduler.request();
        assert_eq!(count.get(), 2);
    }
}
