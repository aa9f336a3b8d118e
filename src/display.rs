//! Character readout layout.
//!
//! Two 16-column lines for a small character LCD:
//!
//! ```text
//! 1500 1493
//! 42 5 212 g A
//! ```
//!
//! The first line is axis A's setpoint and measured speed. The second is
//! axis A's running position, the raw status byte, axis B's actuation, the
//! last command byte received (`0` if none) and `A`ctive or `C`losed for
//! the run state. Lines are padded with spaces so a shorter value fully
//! overwrites a longer one, and cut at the display width.

use core::fmt::Write;

use heapless::String;

/// Characters per display row.
pub const COLUMNS: usize = 16;

/// One rendered display row.
pub type Line = String<COLUMNS>;

/// Values shown on the readout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Readout {
    /// Axis A setpoint (RPM).
    pub setpoint: i32,
    /// Axis A measured speed (RPM).
    pub speed: i32,
    /// Axis A running position.
    pub position: i32,
    /// Raw command/status byte.
    pub status: u8,
    /// Axis B actuation.
    pub output: i16,
    /// Last command byte received, zero if none.
    pub command: u8,
    /// Whether the rig is running.
    pub running: bool,
}

/// Lay out both rows.
///
/// ```rust
/// use rig_control::display::{format_lines, Readout};
///
/// let readout = Readout {
///     setpoint: 1500,
///     speed: 1493,
///     position: 42,
///     status: 5,
///     output: 212,
///     command: b'g',
///     running: true,
/// };
/// let [top, bottom] = format_lines(&readout);
/// assert_eq!(top.trim_end(), "1500 1493");
/// assert_eq!(bottom.trim_end(), "42 5 212 g A");
/// assert_eq!(top.len(), 16);
/// ```
pub fn format_lines(readout: &Readout) -> [Line; 2] {
    let mut top: String<48> = String::new();
    let _ = write!(top, "{} {}", readout.setpoint, readout.speed);

    let command = if readout.command == 0 {
        '0'
    } else {
        char::from(readout.command)
    };
    let state = if readout.running { 'A' } else { 'C' };
    let mut bottom: String<48> = String::new();
    let _ = write!(
        bottom,
        "{} {} {} {} {}",
        readout.position, readout.status, readout.output, command, state
    );

    [fit(&top), fit(&bottom)]
}

fn fit(text: &str) -> Line {
    let mut line = Line::new();
    for c in text.chars().chain(core::iter::repeat(' ')) {
        if line.len() + c.len_utf8() > COLUMNS || line.push(c).is_err() {
            break;
        }
    }
    line
}
