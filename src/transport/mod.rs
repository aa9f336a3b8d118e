//! Interrupt-driven byte transport.
//!
//! Each serial channel owns a pair of fixed-capacity single-producer /
//! single-consumer ring buffers. Received bytes are produced by the receive
//! interrupt and consumed by the main loop; transmitted bytes flow the other
//! way. The rings are [`heapless::spsc::Queue`]s, so the head and tail
//! indices are atomics owned by exactly one side each and no locking is
//! needed between interrupt and main-loop context.
//!
//! A [`SerialLink`] is split once at startup into the main-loop half,
//! [`SerialPort`], and the interrupt half, [`SerialIsr`].
//!
//! # Example
//!
//! ```rust
//! use rig_control::transport::SerialLink;
//! use rig_control::hal::MockUart;
//!
//! let uart = MockUart::new();
//! let mut link: SerialLink<16, 16> = SerialLink::new();
//! let (mut port, mut isr) = link.split(&uart);
//!
//! uart.inject(b'g');
//! isr.on_receive();
//!
//! assert_eq!(port.available(), 1);
//! assert_eq!(port.receive().map(|r| r.byte), Some(b'g'));
//! assert_eq!(port.receive(), None);
//! ```

mod link;

pub use link::{Received, SerialIsr, SerialLink, SerialPort};

bitflags::bitflags! {
    /// Error bits reported alongside a received byte.
    ///
    /// `FRAME` and `OVERRUN` mirror the hardware status register and belong
    /// to the byte they arrived with. `BUFFER_OVERFLOW` means the receive
    /// ring was full and at least one later byte was dropped.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RxErrors: u8 {
        /// Receive ring was full; a byte was dropped.
        const BUFFER_OVERFLOW = 0x02;
        /// Hardware data overrun: a byte was lost before the interrupt ran.
        const OVERRUN = 0x08;
        /// Stop bit was not detected.
        const FRAME = 0x10;
    }
}

impl RxErrors {
    /// True when the byte itself may be corrupt (framing or overrun).
    #[inline]
    pub fn is_line_error(&self) -> bool {
        self.intersects(RxErrors::FRAME | RxErrors::OVERRUN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_error_classification() {
        assert!(!RxErrors::empty().is_line_error());
        assert!(!RxErrors::BUFFER_OVERFLOW.is_line_error());
        assert!(RxErrors::FRAME.is_line_error());
        assert!((RxErrors::OVERRUN | RxErrors::BUFFER_OVERFLOW).is_line_error());
    }

    #[test]
    fn unknown_bits_truncated() {
        let errs = RxErrors::from_bits_truncate(0xFF);
        assert_eq!(
            errs,
            RxErrors::FRAME | RxErrors::OVERRUN | RxErrors::BUFFER_OVERFLOW
        );
    }
}
