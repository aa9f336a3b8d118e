//! Telemetry line format.
//!
//! One line per control cycle: a tag character, then measured speed,
//! setpoint and actuation for each axis as space-separated decimal
//! integers, terminated by `\n\r`.
//!
//! ```text
//! 2 1493 1500 212 1488 1500 212\n\r
//! ```

use core::fmt;

/// Tag sent while the mechanism is idle.
pub const TAG_IDLE: u8 = b'1';

/// Tag sent while the mechanism is running.
pub const TAG_RUNNING: u8 = b'2';

/// Line terminator, in wire order.
pub const LINE_END: &str = "\n\r";

/// Upper bound on a formatted line: tag, six fields of at most 11
/// characters, separators and terminator.
pub const MAX_LINE_LEN: usize = 1 + 6 * (1 + 11) + 2;

/// One axis' contribution to a telemetry line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisReport {
    /// Latest speed estimate (RPM).
    pub speed: i32,
    /// Commanded speed (RPM).
    pub setpoint: i32,
    /// Actuation value applied to the driver.
    pub actuation: i16,
}

/// A complete telemetry line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// [`TAG_IDLE`] or [`TAG_RUNNING`].
    pub tag: u8,
    /// Axis A then axis B.
    pub axes: [AxisReport; 2],
}

impl TelemetryFrame {
    /// Build a frame with the tag for the given run state.
    pub fn new(running: bool, a: AxisReport, b: AxisReport) -> Self {
        Self {
            tag: if running { TAG_RUNNING } else { TAG_IDLE },
            axes: [a, b],
        }
    }

    /// Format into a fixed-capacity string.
    pub fn to_line(&self) -> heapless::String<MAX_LINE_LEN> {
        let mut line = heapless::String::new();
        // Capacity covers the worst case, so this cannot fail.
        let _ = fmt::Write::write_fmt(&mut line, format_args!("{}", self));
        line
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.tag))?;
        for axis in &self.axes {
            write!(f, " {} {} {}", axis.speed, axis.setpoint, axis.actuation)?;
        }
        f.write_str(LINE_END)
    }
}
