//! Compile-time defaults and run-time tunables for the rig.
//!
//! Nothing here is persisted. Every value is either a constant baked into
//! the firmware or adjustable at run time through the increase/decrease
//! command bits.
//!
//! # Example
//!
//! ```rust
//! use rig_control::config::{AxisConfig, PidConfig, RigConfig, SerialConfig};
//!
//! // Use defaults
//! let config = RigConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = RigConfig::default()
//!     .with_command(SerialConfig::default().with_baud(38_400))
//!     .with_axis_a(AxisConfig::default().with_pid(PidConfig::default().with_setpoint(1200)));
//! assert_eq!(config.axis_a.pid.initial_setpoint, 1200);
//! ```

use crate::error::ConfigError;

/// CPU clock the serial baud divisors are derived from.
pub const F_CPU_HZ: u32 = 16_000_000;

/// Largest divisor the 12-bit baud-rate register accepts.
const MAX_BAUD_DIVISOR: u32 = 0x0FFF;

/// Flag in a baud divisor requesting the double-speed sampling mode.
pub const DOUBLE_SPEED_FLAG: u16 = 0x8000;

// ============================================================================
// Main Config
// ============================================================================

/// Complete rig configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigConfig {
    /// Inbound command channel.
    pub command: SerialConfig,
    /// Outbound telemetry (and debug) channel.
    pub telemetry: SerialConfig,
    /// First regulated axis.
    pub axis_a: AxisConfig,
    /// Second regulated axis.
    pub axis_b: AxisConfig,
    /// Setpoint change applied per increase/decrease command.
    pub setpoint_step: i32,
    /// Drive axis B with axis A's actuation instead of its own regulator.
    pub mirror_b_from_a: bool,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            command: SerialConfig::default(),
            telemetry: SerialConfig::default(),
            axis_a: AxisConfig::default(),
            axis_b: AxisConfig::default(),
            setpoint_step: 10,
            mirror_b_from_a: false,
        }
    }
}

impl RigConfig {
    /// Set the command channel configuration
    pub fn with_command(mut self, command: SerialConfig) -> Self {
        self.command = command;
        self
    }

    /// Set the telemetry channel configuration
    pub fn with_telemetry(mut self, telemetry: SerialConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Set axis A configuration
    pub fn with_axis_a(mut self, axis: AxisConfig) -> Self {
        self.axis_a = axis;
        self
    }

    /// Set axis B configuration
    pub fn with_axis_b(mut self, axis: AxisConfig) -> Self {
        self.axis_b = axis;
        self
    }

    /// Set the setpoint nudge step
    pub fn with_setpoint_step(mut self, step: i32) -> Self {
        self.setpoint_step = step;
        self
    }

    /// Enable or disable axis B mirroring
    pub fn with_mirror_b_from_a(mut self, mirror: bool) -> Self {
        self.mirror_b_from_a = mirror;
        self
    }

    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.command.validate()?;
        self.telemetry.validate()?;
        self.axis_a.validate()?;
        self.axis_b.validate()
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Serial channel configuration. Framing is fixed at 8N1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baud: u32,
    /// Use the double-speed (8x oversampling) mode
    pub double_speed: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: 57_600,
            double_speed: false,
        }
    }
}

impl SerialConfig {
    /// Set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Enable or disable double-speed mode
    pub fn with_double_speed(mut self, double_speed: bool) -> Self {
        self.double_speed = double_speed;
        self
    }

    /// Baud-rate register value for [`F_CPU_HZ`], rounded to nearest.
    ///
    /// In double-speed mode bit 15 ([`DOUBLE_SPEED_FLAG`]) is set so the
    /// platform layer knows to enable 8x oversampling.
    ///
    /// ```rust
    /// use rig_control::config::SerialConfig;
    ///
    /// assert_eq!(SerialConfig::default().with_baud(57_600).divisor(), Ok(16));
    /// assert_eq!(SerialConfig::default().with_baud(9_600).divisor(), Ok(103));
    /// ```
    pub fn divisor(&self) -> Result<u16, ConfigError> {
        if self.baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        let oversample = if self.double_speed { 8 } else { 16 };
        let baud = u64::from(self.baud);
        let rounded = (u64::from(F_CPU_HZ) + baud * oversample / 2) / (baud * oversample);
        if rounded == 0 || rounded - 1 > u64::from(MAX_BAUD_DIVISOR) {
            return Err(ConfigError::BaudOutOfRange { baud: self.baud });
        }
        let divisor = (rounded - 1) as u16;
        Ok(if self.double_speed {
            divisor | DOUBLE_SPEED_FLAG
        } else {
            divisor
        })
    }

    /// Check that a divisor can be derived.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.divisor().map(|_| ())
    }
}

// ============================================================================
// Axis Config
// ============================================================================

/// Per-axis regulator, estimator and actuation limits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisConfig {
    /// Regulator settings
    pub pid: PidConfig,
    /// Speed estimator settings
    pub estimator: EstimatorConfig,
    /// Lowest actuation value sent to the driver
    pub min_output: i16,
    /// Highest actuation value sent to the driver
    pub max_output: i16,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            pid: PidConfig::default(),
            estimator: EstimatorConfig::default(),
            min_output: -1400,
            max_output: 1400,
        }
    }
}

impl AxisConfig {
    /// Set the regulator settings
    pub fn with_pid(mut self, pid: PidConfig) -> Self {
        self.pid = pid;
        self
    }

    /// Set the estimator settings
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// Set the actuation limits
    pub fn with_output_limits(mut self, min: i16, max: i16) -> Self {
        self.min_output = min;
        self.max_output = max;
        self
    }

    /// Check gains, estimator and output range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_output >= self.max_output {
            return Err(ConfigError::InvalidOutputRange {
                min: self.min_output,
                max: self.max_output,
            });
        }
        self.pid.validate()?;
        self.estimator.validate()
    }
}

// ============================================================================
// PID Config
// ============================================================================

/// Regulator gains and startup setpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain (per update, not per second)
    pub ki: f32,
    /// Derivative gain (per update, not per second)
    pub kd: f32,
    /// Setpoint loaded at startup (RPM)
    pub initial_setpoint: i32,
    /// Setpoints below this run the regulator in low-speed mode
    pub low_speed_threshold: i32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.07,
            ki: 0.0135,
            kd: 23.87,
            initial_setpoint: 1500,
            low_speed_threshold: 600,
        }
    }
}

impl PidConfig {
    /// Set all three gains
    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    /// Set the startup setpoint
    pub fn with_setpoint(mut self, setpoint: i32) -> Self {
        self.initial_setpoint = setpoint;
        self
    }

    /// Set the low-speed threshold
    pub fn with_low_speed_threshold(mut self, threshold: i32) -> Self {
        self.low_speed_threshold = threshold;
        self
    }

    /// Reject NaN or infinite gains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if [self.kp, self.ki, self.kd].iter().all(|g| g.is_finite()) {
            Ok(())
        } else {
            Err(ConfigError::NonFiniteGain)
        }
    }
}

// ============================================================================
// Estimator Config
// ============================================================================

/// Capture timer and encoder geometry for one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorConfig {
    /// Capture timer tick rate in Hz (CPU clock over prescaler)
    pub timer_hz: u32,
    /// Encoder edges per shaft revolution
    pub pulses_per_rev: u32,
    /// Count the position up when the quadrature pin reads high
    pub count_up_when_high: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            // 16 MHz / 64
            timer_hz: 250_000,
            pulses_per_rev: 1,
            count_up_when_high: true,
        }
    }
}

impl EstimatorConfig {
    /// Set the capture timer rate
    pub fn with_timer_hz(mut self, hz: u32) -> Self {
        self.timer_hz = hz;
        self
    }

    /// Set the encoder resolution
    pub fn with_pulses_per_rev(mut self, pulses: u32) -> Self {
        self.pulses_per_rev = pulses;
        self
    }

    /// Set the quadrature polarity
    pub fn with_count_up_when_high(mut self, up: bool) -> Self {
        self.count_up_when_high = up;
        self
    }

    /// Tick-count to RPM numerator: `timer_hz * 60 / pulses_per_rev`.
    ///
    /// ```rust
    /// use rig_control::config::EstimatorConfig;
    ///
    /// assert_eq!(EstimatorConfig::default().scale(), 15_000_000);
    /// ```
    pub fn scale(&self) -> u32 {
        if self.pulses_per_rev == 0 {
            return 0;
        }
        (u64::from(self.timer_hz) * 60 / u64::from(self.pulses_per_rev)).min(u64::from(u32::MAX))
            as u32
    }

    /// Reject a zero timer rate or zero encoder resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer_hz == 0 {
            return Err(ConfigError::ZeroTimerRate);
        }
        if self.pulses_per_rev == 0 {
            return Err(ConfigError::ZeroPulsesPerRev);
        }
        Ok(())
    }
}
