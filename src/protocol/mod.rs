//! Command/status protocol and telemetry format.
//!
//! - [`status`] - the bit-framed command/status byte and its exclusivity rules
//! - [`telemetry`] - the space-separated ASCII telemetry line

pub mod status;
pub mod telemetry;

pub use status::{CommandFlags, Flag, SharedStatusByte, StatusByte, EXCLUSIVE_PAIRS};
pub use telemetry::{AxisReport, TelemetryFrame, TAG_IDLE, TAG_RUNNING};
