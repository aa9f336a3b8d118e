//! # rig-control
//!
//! Closed-loop speed control kernel for a two-axis motor rig driven over a
//! serial command link.
//!
//! ## Features
//!
//! - **Interrupt-driven serial transport**: lock-free receive/transmit rings per channel
//! - **Bit-framed command protocol**: one status byte with exclusive start/stop and nudge pairs
//! - **Edge-timing speed estimation**: capture-timer RPM with stall detection and position count
//! - **Tick-paced PID**: zero-order hold between updates, slower pacing at low setpoints
//! - **Telemetry**: one space-separated ASCII line per control cycle
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware seams and the interrupt callback interface
//! - `transport` - Serial rings, split into main-loop and interrupt halves
//! - `protocol` - Command/status byte and telemetry line format
//! - `speed` - Encoder edge capture and RPM conversion
//! - `control` - PID regulator and the per-axis control pass
//! - `rig` - Main-loop coordinator
//! - `isr` - Interrupt-side state bound to [`traits::InterruptHandlers`]
//! - `hal` - Concrete implementations (generic H-bridge, mocks for testing)
//!
//! State shared with interrupts lives in atomics or behind a
//! `critical_section::Mutex`, never in plain shared variables. Interrupt
//! handlers hold only their own slice of state; the regulator and drivers
//! are owned by the main loop.
//!
//! ## Example
//!
//! ```rust
//! use rig_control::config::PidConfig;
//! use rig_control::control::{Pid, TickCounter};
//! use rig_control::protocol::{CommandFlags, Flag, StatusByte};
//!
//! // Command byte: start, raise axis A
//! let byte = StatusByte::encode([Flag::Start, Flag::IncreaseA]);
//! assert_eq!(byte.command(), Some(CommandFlags::START | CommandFlags::INCREASE_A));
//!
//! // Regulator on target produces no correction
//! let ticks = TickCounter::new();
//! let mut pid = Pid::new(&PidConfig::default(), &ticks);
//! pid.reset(1500);
//! assert_eq!(pid.compute(1500, false), 0.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Compile-time defaults and run-time tunables.
pub mod config;
/// Closed-loop control: PID regulator and per-axis control pass.
pub mod control;
/// Character readout layout.
pub mod display;
/// Configuration error type.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Interrupt-side state and handler binding.
pub mod isr;
/// Command/status byte and telemetry format.
pub mod protocol;
/// Main-loop coordinator.
pub mod rig;
/// Rotational-speed estimation from encoder edge timing.
pub mod speed;
/// Core traits for hardware abstraction.
pub mod traits;
/// Interrupt-driven serial byte transport.
pub mod transport;

// Re-exports for convenience
pub use config::{AxisConfig, EstimatorConfig, PidConfig, RigConfig, SerialConfig};
pub use control::{limit, Axis, Pid, TickCounter};
pub use error::ConfigError;
pub use isr::{AxisIsr, RigIsr};
pub use protocol::{CommandFlags, Flag, SharedStatusByte, StatusByte, TelemetryFrame};
pub use rig::{Rig, RigError, RigState};
pub use speed::{EstimatorState, SpeedCapture, SpeedEstimator, SpeedSample};
pub use traits::{
    AxisId, CaptureTimer, ChannelId, InterruptHandlers, MotorDriver, ReadoutDisplay,
    UartHardware,
};
pub use transport::{Received, RxErrors, SerialIsr, SerialLink, SerialPort};
