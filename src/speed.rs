//! Rotational-speed estimation from encoder edge timing.
//!
//! Each encoder edge snapshots a free-running 16-bit capture timer and
//! restarts it, so the snapshot is the number of timer ticks since the
//! previous edge. The timer's overflow interrupt doubles as the stall
//! detector: if a whole overflow period passes with no edge, the axis is
//! declared stopped and its speed reads as zero until the next edge.
//!
//! State is split by owner:
//!
//! - [`SpeedCapture`] is written only from interrupt context (`on_edge`,
//!   `on_overflow`) and read by the main loop. All of its fields live in one
//!   cell guarded by a critical section, so a capture value and its
//!   freshness flag always change together.
//! - [`SpeedEstimator`] is the main loop's view: it consumes freshness and
//!   converts tick counts to RPM.
//!
//! # Example
//!
//! ```rust
//! use rig_control::config::EstimatorConfig;
//! use rig_control::speed::{SpeedCapture, SpeedEstimator};
//!
//! static CAPTURE: SpeedCapture = SpeedCapture::new(true);
//!
//! let estimator = SpeedEstimator::new(&CAPTURE, &EstimatorConfig::default());
//! assert_eq!(estimator.read_speed(), 0);
//!
//! // Interrupt side: 10_000 ticks at 250 kHz between edges
//! CAPTURE.on_edge(10_000, true);
//! assert_eq!(estimator.read_speed(), 1500);
//! ```

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

use crate::config::EstimatorConfig;
use crate::traits::CaptureTimer;

/// Ticks between two overflows of the 16-bit capture timer.
pub const CAPTURE_PERIOD_TICKS: u32 = 1 << 16;

/// Motion state of one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatorState {
    /// No edge within the overflow window, or none since startup.
    #[default]
    Stopped,
    /// Edges are arriving.
    Measuring,
}

/// What the main loop sees of a capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpeedSample {
    /// Timer ticks between the two most recent edges.
    pub raw_count: u32,
    /// A new capture, or the start of a stall, since the last read.
    pub is_fresh: bool,
    /// No edge within the overflow window.
    pub is_stalled: bool,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    raw_count: u32,
    fresh: bool,
    stalled: bool,
    edge_since_overflow: bool,
    overflows: u8,
    position: i32,
    state: EstimatorState,
}

impl Slot {
    const INITIAL: Slot = Slot {
        raw_count: 0,
        fresh: false,
        stalled: false,
        edge_since_overflow: false,
        overflows: 0,
        position: 0,
        state: EstimatorState::Stopped,
    };
}

/// Interrupt-owned capture state for one axis.
///
/// Lives in a `static` for the life of the program and is never
/// reallocated.
pub struct SpeedCapture {
    slot: Mutex<Cell<Slot>>,
    count_up_when_high: bool,
}

impl SpeedCapture {
    /// Create an idle capture.
    ///
    /// `count_up_when_high` sets which quadrature level counts the running
    /// position up.
    pub const fn new(count_up_when_high: bool) -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot::INITIAL)),
            count_up_when_high,
        }
    }

    /// Encoder edge handler.
    ///
    /// `stamp` is the capture timer value at the edge, read just before the
    /// timer was restarted. Overflows since the previous edge are added in,
    /// so a single wrap inside the window is measured correctly.
    pub fn on_edge(&self, stamp: u16, quadrature_high: bool) {
        let step = if quadrature_high == self.count_up_when_high {
            1
        } else {
            -1
        };
        self.modify(|s| {
            s.raw_count = u32::from(s.overflows)
                .saturating_mul(CAPTURE_PERIOD_TICKS)
                .saturating_add(u32::from(stamp));
            s.overflows = 0;
            s.edge_since_overflow = true;
            s.fresh = true;
            s.stalled = false;
            s.state = EstimatorState::Measuring;
            s.position = s.position.wrapping_add(step);
        });
    }

    /// Snapshot the timer, restart it and record the edge.
    ///
    /// This is the whole body of an encoder edge interrupt.
    pub fn capture_edge<T: CaptureTimer, P: InputPin>(&self, timer: &T, quadrature: &mut P) {
        let stamp = timer.count();
        timer.reset();
        let high = quadrature.is_high().unwrap_or(false);
        self.on_edge(stamp, high);
    }

    /// Capture timer overflow handler.
    ///
    /// Declares a stall when no edge arrived since the previous overflow.
    /// Entering the stall counts as a fresh (zero) reading.
    pub fn on_overflow(&self) {
        self.modify(|s| {
            if !s.edge_since_overflow {
                s.fresh |= !s.stalled;
                s.stalled = true;
                s.state = EstimatorState::Stopped;
            }
            s.edge_since_overflow = false;
            s.overflows = s.overflows.saturating_add(1);
        });
    }

    /// Read the capture and clear its freshness in one step.
    pub fn take_sample(&self) -> SpeedSample {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let mut s = cell.get();
            let sample = SpeedSample {
                raw_count: s.raw_count,
                is_fresh: s.fresh,
                is_stalled: s.stalled,
            };
            s.fresh = false;
            cell.set(s);
            sample
        })
    }

    /// Read the capture without consuming freshness.
    pub fn peek(&self) -> SpeedSample {
        let s = self.snapshot();
        SpeedSample {
            raw_count: s.raw_count,
            is_fresh: s.fresh,
            is_stalled: s.stalled,
        }
    }

    /// Current motion state.
    pub fn state(&self) -> EstimatorState {
        self.snapshot().state
    }

    /// Running position count (edges forward minus edges back).
    pub fn position(&self) -> i32 {
        self.snapshot().position
    }

    /// Zero the running position.
    pub fn reset_position(&self) {
        self.modify(|s| s.position = 0);
    }

    fn snapshot(&self) -> Slot {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }

    fn modify(&self, f: impl FnOnce(&mut Slot)) {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let mut s = cell.get();
            f(&mut s);
            cell.set(s);
        });
    }
}

/// Main-loop speed reader for one axis.
#[derive(Clone, Copy)]
pub struct SpeedEstimator<'a> {
    capture: &'a SpeedCapture,
    scale: u32,
}

impl<'a> SpeedEstimator<'a> {
    /// Attach to a capture using the axis' timer rate and encoder geometry.
    pub fn new(capture: &'a SpeedCapture, config: &EstimatorConfig) -> Self {
        Self {
            capture,
            scale: config.scale(),
        }
    }

    /// Latest speed in RPM; zero while stalled or before the first edge.
    ///
    /// Consumes the capture's freshness.
    pub fn read_speed(&self) -> i32 {
        self.to_rpm(self.capture.take_sample())
    }

    /// Speed from a capture that arrived since the last read, if any.
    ///
    /// Entering a stall yields `Some(0)` once; further reads while stalled
    /// yield `None` until the next edge.
    pub fn fresh_speed(&self) -> Option<i32> {
        let sample = self.capture.take_sample();
        sample.is_fresh.then(|| self.to_rpm(sample))
    }

    /// Convert a sample using this axis' scale factor.
    pub fn to_rpm(&self, sample: SpeedSample) -> i32 {
        if sample.is_stalled || sample.raw_count == 0 {
            return 0;
        }
        i32::try_from(self.scale / sample.raw_count).unwrap_or(i32::MAX)
    }

    /// Current motion state.
    #[inline]
    pub fn state(&self) -> EstimatorState {
        self.capture.state()
    }

    /// True while the stall detector holds the speed at zero.
    #[inline]
    pub fn is_stalled(&self) -> bool {
        self.capture.peek().is_stalled
    }

    /// Running position count.
    #[inline]
    pub fn position(&self) -> i32 {
        self.capture.position()
    }

    /// Zero the running position.
    #[inline]
    pub fn reset_position(&self) {
        self.capture.reset_position();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockPin, MockTimer};

    fn estimator(capture: &SpeedCapture) -> SpeedEstimator<'_> {
        SpeedEstimator::new(capture, &EstimatorConfig::default())
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    #[test]
    fn no_edge_yet_reads_zero() {
        let capture = SpeedCapture::new(true);
        assert_eq!(estimator(&capture).read_speed(), 0);
        assert_eq!(capture.state(), EstimatorState::Stopped);
    }

    #[test]
    fn ticks_convert_to_rpm() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        capture.on_edge(10_000, true);
        assert_eq!(est.read_speed(), 1500);

        capture.on_edge(15_000, true);
        assert_eq!(est.read_speed(), 1000);
        assert_eq!(capture.state(), EstimatorState::Measuring);
    }

    #[test]
    fn single_wrap_is_measured() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        capture.on_edge(100, true);
        capture.on_overflow();
        capture.on_edge(34_464, true);

        let sample = capture.peek();
        assert_eq!(sample.raw_count, CAPTURE_PERIOD_TICKS + 34_464);
        assert!(!sample.is_stalled);
        assert_eq!(est.read_speed(), 15_000_000 / 100_000);
    }

    // =========================================================================
    // Freshness
    // =========================================================================

    #[test]
    fn freshness_is_consumed_once() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        assert_eq!(est.fresh_speed(), None);
        capture.on_edge(7_500, true);
        assert!(capture.peek().is_fresh);
        assert_eq!(est.fresh_speed(), Some(2000));
        assert_eq!(est.fresh_speed(), None);
        // The value is still there for a plain read
        assert_eq!(est.read_speed(), 2000);
    }

    #[test]
    fn stall_is_reported_fresh_once() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        capture.on_edge(7_500, true);
        assert_eq!(est.fresh_speed(), Some(2000));

        capture.on_overflow();
        assert_eq!(est.fresh_speed(), None);
        capture.on_overflow();
        assert_eq!(est.fresh_speed(), Some(0));
        capture.on_overflow();
        assert_eq!(est.fresh_speed(), None);
        assert!(est.is_stalled());

        capture.on_edge(7_500, true);
        assert_eq!(est.fresh_speed(), Some(15_000_000 / (3 * 65_536 + 7_500)));
    }

    // =========================================================================
    // Stall detection
    // =========================================================================

    #[test]
    fn stall_after_full_window_without_edge() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        capture.on_edge(10_000, true);
        capture.on_overflow();
        assert!(!est.is_stalled());
        assert_eq!(est.read_speed(), 1500);

        capture.on_overflow();
        assert!(est.is_stalled());
        assert_eq!(est.state(), EstimatorState::Stopped);
        assert_eq!(est.read_speed(), 0);
        assert_eq!(capture.peek().raw_count, 10_000);
    }

    #[test]
    fn stall_fires_from_startup() {
        let capture = SpeedCapture::new(true);
        capture.on_overflow();
        assert!(capture.peek().is_stalled);
    }

    #[test]
    fn next_edge_clears_stall() {
        let capture = SpeedCapture::new(true);
        let est = estimator(&capture);

        capture.on_edge(10_000, true);
        capture.on_overflow();
        capture.on_overflow();
        assert_eq!(est.read_speed(), 0);

        capture.on_edge(1_000, true);
        assert!(!est.is_stalled());
        let expected = 15_000_000 / (2 * CAPTURE_PERIOD_TICKS + 1_000);
        assert_eq!(est.read_speed(), expected as i32);
        assert!(est.read_speed() > 0);
    }

    #[test]
    fn overflow_count_saturates() {
        let capture = SpeedCapture::new(true);
        for _ in 0..1000 {
            capture.on_overflow();
        }
        capture.on_edge(0, true);
        assert_eq!(capture.peek().raw_count, 255 * CAPTURE_PERIOD_TICKS);
    }

    // =========================================================================
    // Position
    // =========================================================================

    #[test]
    fn quadrature_level_sets_direction() {
        let capture = SpeedCapture::new(true);
        for _ in 0..5 {
            capture.on_edge(1_000, true);
        }
        capture.on_edge(1_000, false);
        assert_eq!(capture.position(), 4);

        capture.reset_position();
        assert_eq!(capture.position(), 0);
    }

    #[test]
    fn inverted_polarity_counts_down_when_high() {
        let capture = SpeedCapture::new(false);
        capture.on_edge(1_000, true);
        capture.on_edge(1_000, true);
        assert_eq!(capture.position(), -2);
    }

    // =========================================================================
    // Interrupt body
    // =========================================================================

    #[test]
    fn capture_edge_reads_and_restarts_timer() {
        let capture = SpeedCapture::new(true);
        let timer = MockTimer::new();
        let mut pin = MockPin::new(false);

        timer.set(12_500);
        capture.capture_edge(&timer, &mut pin);

        assert_eq!(timer.count(), 0);
        assert_eq!(timer.resets(), 1);
        assert_eq!(capture.peek().raw_count, 12_500);
        assert_eq!(capture.position(), -1);
        assert_eq!(estimator(&capture).read_speed(), 1200);
    }
}
