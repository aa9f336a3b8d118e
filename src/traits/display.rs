//! Display abstraction for the character-grid readout.
//!
//! This module defines the [`ReadoutDisplay`] trait for putting the
//! setpoint/speed/position readout on a small character LCD. Line layout is
//! produced by [`crate::display::format_lines`]; the display only places text.

use crate::display::Readout;

/// Character display trait.
///
/// # Example
///
/// ```ignore
/// use rig_control::traits::ReadoutDisplay;
/// use rig_control::display::Readout;
///
/// struct Hd44780 { /* ... */ }
///
/// impl ReadoutDisplay for Hd44780 {
///     type Error = ();
///
///     fn init(&mut self) -> Result<(), ()> { Ok(()) }
///     fn write_line(&mut self, row: u8, text: &str) -> Result<(), ()> {
///         // goto (0, row), put characters...
///         Ok(())
///     }
/// }
/// ```
pub trait ReadoutDisplay {
    /// Error type for display operations.
    type Error;

    /// Initializes the display hardware.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Writes `text` starting at column 0 of `row`.
    fn write_line(&mut self, row: u8, text: &str) -> Result<(), Self::Error>;

    /// Renders both readout lines.
    fn render(&mut self, readout: &Readout) -> Result<(), Self::Error> {
        let [top, bottom] = crate::display::format_lines(readout);
        self.write_line(0, &top)?;
        self.write_line(1, &bottom)
    }
}
