//! Tick-paced PID regulator.
//!
//! The regulator's time base is the fixed-period timer interrupt. Each
//! interrupt bumps a [`TickCounter`]; [`Pid::compute`] only runs the
//! algorithm once enough ticks have accumulated and otherwise returns the
//! previous output (zero-order hold). The counter is the only state the
//! interrupt touches.
//!
//! Gains are per update rather than per second, and derivative acts on the
//! measurement so a setpoint change does not kick the output.
//!
//! # Example
//!
//! ```rust
//! use rig_control::config::PidConfig;
//! use rig_control::control::{Pid, TickCounter};
//!
//! static TICKS: TickCounter = TickCounter::new();
//!
//! let mut pid = Pid::new(&PidConfig::default(), &TICKS);
//! pid.reset(1500);
//! assert_eq!(pid.compute(1500, false), 0.0);
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::PidConfig;

/// Ticks that must elapse between updates in low-speed mode.
pub const LOW_SPEED_TICKS: u8 = 5;

/// Step applied by the proportional gain nudges.
pub const KP_STEP: f32 = 0.01;
/// Step applied by the integral gain nudges.
pub const KI_STEP: f32 = 0.0001;
/// Step applied by the derivative gain nudges.
pub const KD_STEP: f32 = 0.05;

/// Timer ticks since the regulator last updated.
///
/// Incremented from the timer interrupt, read-and-reset by the regulator.
/// Saturates at 255 rather than wrapping.
#[derive(Debug, Default)]
pub struct TickCounter(AtomicU8);

impl TickCounter {
    /// A counter at zero.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Timer interrupt body.
    pub fn tick(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1));
    }

    /// Current count.
    #[inline]
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Reset to zero if at least `threshold` ticks have elapsed.
    ///
    /// The check and the reset are one atomic step, so a tick landing in
    /// between is never lost.
    pub fn take_if_at_least(&self, threshold: u8) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n >= threshold).then_some(0)
            })
            .is_ok()
    }
}

/// Regulator gains.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gains {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain
    pub ki: f32,
    /// Derivative gain
    pub kd: f32,
}

/// The individual terms of the last update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Terms {
    /// `kp * error`
    pub proportional: f32,
    /// Accumulated `ki * error`
    pub integral: f32,
    /// `kd * (measured - last measured)`
    pub derivative: f32,
}

/// PID regulator for one axis.
pub struct Pid<'a> {
    setpoint: i32,
    gains: Gains,

    last_measured: i32,
    integral: f32,
    proportional: f32,
    derivative: f32,
    last_output: f32,

    ticks: &'a TickCounter,
    low_speed: bool,
}

impl<'a> Pid<'a> {
    /// Create a regulator from config, paced by `ticks`.
    pub fn new(config: &PidConfig, ticks: &'a TickCounter) -> Self {
        Self {
            setpoint: config.initial_setpoint,
            gains: Gains {
                kp: config.kp,
                ki: config.ki,
                kd: config.kd,
            },
            last_measured: 0,
            integral: 0.0,
            proportional: 0.0,
            derivative: 0.0,
            last_output: 0.0,
            ticks,
            low_speed: false,
        }
    }

    /// Clear history, taking `measured` as the previous sample.
    pub fn reset(&mut self, measured: i32) {
        self.last_measured = measured;
        self.integral = 0.0;
        self.proportional = 0.0;
        self.derivative = 0.0;
        self.last_output = 0.0;
    }

    /// Load the integrator with a known value.
    pub fn preload_integral(&mut self, value: f32) {
        self.integral = value;
    }

    /// Run one update if enough ticks have elapsed.
    ///
    /// The tick threshold is [`LOW_SPEED_TICKS`] in low-speed mode and zero
    /// otherwise. Without an update, returns the previous output and leaves
    /// every term untouched. The result is not clamped.
    pub fn compute(&mut self, measured: i32, low_speed: bool) -> f32 {
        self.low_speed = low_speed;
        let threshold = if low_speed { LOW_SPEED_TICKS } else { 0 };
        if !self.ticks.take_if_at_least(threshold) {
            return self.last_output;
        }

        let error = self.setpoint.saturating_sub(measured) as f32;
        self.proportional = self.gains.kp * error;
        self.integral += self.gains.ki * error;
        self.derivative = self.gains.kd * measured.saturating_sub(self.last_measured) as f32;

        let output = self.proportional + self.integral - self.derivative;
        self.last_measured = measured;
        self.last_output = output;
        output
    }

    /// Output of the most recent update.
    #[inline]
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Terms of the most recent update.
    pub fn terms(&self) -> Terms {
        Terms {
            proportional: self.proportional,
            integral: self.integral,
            derivative: self.derivative,
        }
    }

    /// Whether the last `compute` ran in low-speed mode.
    #[inline]
    pub fn is_low_speed(&self) -> bool {
        self.low_speed
    }

    // ------------------------------------------------------------------------
    // Setpoint
    // ------------------------------------------------------------------------

    /// Target speed (RPM).
    #[inline]
    pub fn setpoint(&self) -> i32 {
        self.setpoint
    }

    /// Set the target speed.
    pub fn set_setpoint(&mut self, setpoint: i32) {
        self.setpoint = setpoint;
    }

    /// Raise the target by `step`.
    pub fn increase_setpoint(&mut self, step: i32) {
        self.setpoint = self.setpoint.saturating_add(step);
    }

    /// Lower the target by `step`.
    pub fn decrease_setpoint(&mut self, step: i32) {
        self.setpoint = self.setpoint.saturating_sub(step);
    }

    // ------------------------------------------------------------------------
    // Gains
    // ------------------------------------------------------------------------

    /// Current gains.
    #[inline]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Replace all three gains. Takes effect on the next update.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.gains = Gains { kp, ki, kd };
        log::debug!("gains kp={} ki={} kd={}", kp, ki, kd);
    }

    /// Raise `kp` by [`KP_STEP`].
    pub fn increase_kp(&mut self) {
        self.gains.kp += KP_STEP;
    }

    /// Lower `kp` by [`KP_STEP`], not below zero.
    pub fn decrease_kp(&mut self) {
        self.gains.kp = (self.gains.kp - KP_STEP).max(0.0);
    }

    /// Raise `ki` by [`KI_STEP`].
    pub fn increase_ki(&mut self) {
        self.gains.ki += KI_STEP;
    }

    /// Lower `ki` by [`KI_STEP`], not below zero.
    pub fn decrease_ki(&mut self) {
        self.gains.ki = (self.gains.ki - KI_STEP).max(0.0);
    }

    /// Raise `kd` by [`KD_STEP`].
    pub fn increase_kd(&mut self) {
        self.gains.kd += KD_STEP;
    }

    /// Lower `kd` by [`KD_STEP`], not below zero.
    pub fn decrease_kd(&mut self) {
        self.gains.kd = (self.gains.kd - KD_STEP).max(0.0);
    }
}

/// Bounded clamp.
///
/// ```rust
/// use rig_control::control::limit;
///
/// assert_eq!(limit(2000, -1400, 1400), 1400);
/// assert_eq!(limit(-2000, -1400, 1400), -1400);
/// assert_eq!(limit(12, -1400, 1400), 12);
/// ```
pub fn limit<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}
