//! Configuration error type.
//!
//! Runtime conditions inside the control core (buffer overflow, framing
//! errors, stalls, stale command bytes) are reported as values and never as
//! errors. The only fallible step that is not hardware-specific is validating
//! a [`RigConfig`](crate::config::RigConfig) before the rig is built.

use core::fmt;

/// Reasons a configuration can be rejected by `validate()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// A serial channel was configured with a baud rate of zero.
    ZeroBaud,
    /// The baud rate is too high for the CPU clock to divide down to.
    BaudOutOfRange {
        /// Requested baud rate.
        baud: u32,
    },
    /// The capture timer rate is zero.
    ZeroTimerRate,
    /// The encoder reports zero pulses per revolution.
    ZeroPulsesPerRev,
    /// The actuation range is empty or inverted.
    InvalidOutputRange {
        /// Lower bound.
        min: i16,
        /// Upper bound.
        max: i16,
    },
    /// A PID gain is NaN or infinite.
    NonFiniteGain,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBaud => write!(f, "baud rate must be non-zero"),
            ConfigError::BaudOutOfRange { baud } => {
                write!(f, "baud rate {} cannot be derived from the CPU clock", baud)
            }
            ConfigError::ZeroTimerRate => write!(f, "capture timer rate must be non-zero"),
            ConfigError::ZeroPulsesPerRev => write!(f, "pulses per revolution must be non-zero"),
            ConfigError::InvalidOutputRange { min, max } => {
                write!(f, "output range [{}, {}] is empty", min, max)
            }
            ConfigError::NonFiniteGain => write!(f, "PID gains must be finite"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
