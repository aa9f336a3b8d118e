//! Closed-loop speed control.
//!
//! - [`pid`] - the tick-paced regulator and its interrupt-side counter
//! - [`Axis`] - estimator, regulator and motor driver for one axis

mod axis;
pub mod pid;

pub use axis::Axis;
pub use pid::{limit, Gains, Pid, Terms, TickCounter, LOW_SPEED_TICKS};
