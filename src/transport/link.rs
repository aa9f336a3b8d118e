use core::convert::Infallible;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use super::RxErrors;
use crate::config::SerialConfig;
use crate::error::ConfigError;
use crate::traits::UartHardware;

/// A byte taken from the receive ring and the errors reported with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Received {
    /// The data byte.
    pub byte: u8,
    /// Line errors latched with this byte, plus `BUFFER_OVERFLOW` if bytes
    /// were dropped since the previous read.
    pub errors: RxErrors,
}

impl Received {
    /// True when no error of any kind accompanied the byte.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Error state shared by both halves of a link.
#[derive(Debug, Default)]
struct LinkStatus {
    /// Set by the receive interrupt when it drops a byte; swapped out by the
    /// next `receive()`.
    overflowed: AtomicBool,
    /// Sticky union of every error seen since the last `clear_errors()`.
    last_error: AtomicU8,
    /// Bytes at the head of the transmit ring that the interrupt drops
    /// instead of writing. Stored only while the transmit interrupt is off.
    tx_stale: AtomicUsize,
}

/// Storage for one serial channel: receive ring, transmit ring and error
/// status.
///
/// Both capacities must be powers of two. One slot of each ring is kept
/// free to tell "full" from "empty", so a ring of `N` holds `N - 1` bytes.
///
/// On a microcontroller the link lives in a `static` and is split exactly
/// once during initialization, before interrupts are enabled.
pub struct SerialLink<const RX: usize, const TX: usize> {
    rx: Queue<(u8, RxErrors), RX>,
    tx: Queue<u8, TX>,
    status: LinkStatus,
}

impl<const RX: usize, const TX: usize> SerialLink<RX, TX> {
    const POWER_OF_TWO: () = assert!(
        RX.is_power_of_two() && TX.is_power_of_two(),
        "ring capacities must be powers of two"
    );

    /// Create a link with both rings empty.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::POWER_OF_TWO;
        Self {
            rx: Queue::new(),
            tx: Queue::new(),
            status: LinkStatus {
                overflowed: AtomicBool::new(false),
                last_error: AtomicU8::new(0),
                tx_stale: AtomicUsize::new(0),
            },
        }
    }

    /// Split into the main-loop half and the interrupt half.
    pub fn split<'a, H: UartHardware>(
        &'a mut self,
        hw: &'a H,
    ) -> (SerialPort<'a, H, RX, TX>, SerialIsr<'a, H, RX, TX>) {
        let (rx_producer, rx_consumer) = self.rx.split();
        let (tx_producer, tx_consumer) = self.tx.split();
        let status = &self.status;
        (
            SerialPort {
                hw,
                rx: rx_consumer,
                tx: tx_producer,
                status,
            },
            SerialIsr {
                hw,
                rx: rx_producer,
                tx: tx_consumer,
                status,
            },
        )
    }
}

impl<const RX: usize, const TX: usize> Default for SerialLink<RX, TX> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Main-loop half
// ============================================================================

/// Main-loop side of a serial channel.
///
/// Receiving never blocks. Sending busy-waits only while the transmit ring
/// is full, which is the single blocking point of the main loop.
pub struct SerialPort<'a, H: UartHardware, const RX: usize, const TX: usize> {
    hw: &'a H,
    rx: Consumer<'a, (u8, RxErrors), RX>,
    tx: Producer<'a, u8, TX>,
    status: &'a LinkStatus,
}

impl<'a, H: UartHardware, const RX: usize, const TX: usize> SerialPort<'a, H, RX, TX> {
    /// Configure the hardware and start with both rings empty.
    ///
    /// Bytes still queued for transmission from before are never sent.
    pub fn init(&mut self, config: &SerialConfig) -> Result<(), ConfigError> {
        let divisor = config.divisor()?;
        self.discard_tx();
        self.hw.configure(divisor);
        self.flush();
        self.clear_errors();
        log::info!("serial channel up at {} baud (divisor {:#06x})", config.baud, divisor);
        Ok(())
    }

    /// Take the oldest received byte, or `None` if the ring is empty.
    pub fn receive(&mut self) -> Option<Received> {
        let (byte, mut errors) = self.rx.dequeue()?;
        if self.status.overflowed.swap(false, Ordering::AcqRel) {
            errors |= RxErrors::BUFFER_OVERFLOW;
        }
        Some(Received { byte, errors })
    }

    /// Number of unread bytes in the receive ring.
    #[inline]
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Discard every unread byte.
    ///
    /// A pending overflow goes with them, so the next byte read is not
    /// blamed for bytes lost before the flush.
    pub fn flush(&mut self) {
        while self.rx.dequeue().is_some() {}
        self.status.overflowed.store(false, Ordering::Release);
    }

    /// Queue a byte without waiting.
    ///
    /// Enables the transmit-ready interrupt after the byte is queued.
    /// Returns `WouldBlock` while the transmit ring is full.
    pub fn try_send(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        match self.tx.enqueue(byte) {
            Ok(()) => {
                self.hw.set_tx_interrupt(true);
                Ok(())
            }
            Err(_) => Err(nb::Error::WouldBlock),
        }
    }

    /// Queue a byte, busy-waiting while the transmit ring is full.
    pub fn send(&mut self, byte: u8) {
        match nb::block!(self.try_send(byte)) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Queue every byte of `bytes`.
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.send(b);
        }
    }

    /// Queue a string.
    #[inline]
    pub fn send_str(&mut self, s: &str) {
        self.send_bytes(s.as_bytes());
    }

    /// Queue a signed integer as decimal ASCII.
    pub fn send_int(&mut self, value: i32) {
        let mut buf: heapless::String<11> = heapless::String::new();
        let _ = fmt::Write::write_fmt(&mut buf, format_args!("{}", value));
        self.send_str(&buf);
    }

    /// Bytes queued for transmission that the interrupt has not sent yet.
    #[inline]
    pub fn tx_pending(&self) -> usize {
        self.tx
            .len()
            .saturating_sub(self.status.tx_stale.load(Ordering::Acquire))
    }

    /// Every error seen since the last [`clear_errors`](Self::clear_errors).
    #[inline]
    pub fn last_error(&self) -> RxErrors {
        RxErrors::from_bits_truncate(self.status.last_error.load(Ordering::Acquire))
    }

    /// Mark everything in the transmit ring as stale.
    ///
    /// The producer half cannot dequeue, so the interrupt skips the stale
    /// bytes on its next firings.
    fn discard_tx(&mut self) {
        self.hw.set_tx_interrupt(false);
        // Interrupt is off: the ring length cannot change under us
        let stale = self.tx.len();
        self.status.tx_stale.store(stale, Ordering::Release);
        if stale > 0 {
            self.hw.set_tx_interrupt(true);
        }
    }

    /// Forget latched errors.
    pub fn clear_errors(&mut self) {
        self.status.last_error.store(0, Ordering::Release);
        self.status.overflowed.store(false, Ordering::Release);
    }
}

impl<H: UartHardware, const RX: usize, const TX: usize> fmt::Write for SerialPort<'_, H, RX, TX> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send_str(s);
        Ok(())
    }
}

// ============================================================================
// Interrupt half
// ============================================================================

/// Interrupt side of a serial channel.
pub struct SerialIsr<'a, H: UartHardware, const RX: usize, const TX: usize> {
    hw: &'a H,
    rx: Producer<'a, (u8, RxErrors), RX>,
    tx: Consumer<'a, u8, TX>,
    status: &'a LinkStatus,
}

impl<H: UartHardware, const RX: usize, const TX: usize> SerialIsr<'_, H, RX, TX> {
    /// Receive-complete handler.
    ///
    /// Stores the byte with its line errors. When the ring is full the new
    /// byte is dropped, buffered data is left intact and an overflow is
    /// latched for the reader.
    pub fn on_receive(&mut self) {
        let (byte, errors) = self.hw.read();
        let latched = match self.rx.enqueue((byte, errors)) {
            Ok(()) => errors,
            Err(_) => {
                self.status.overflowed.store(true, Ordering::Release);
                errors | RxErrors::BUFFER_OVERFLOW
            }
        };
        if !latched.is_empty() {
            self.status.last_error.fetch_or(latched.bits(), Ordering::AcqRel);
        }
    }

    /// Transmit-ready handler.
    ///
    /// Writes the next queued byte, or disables the interrupt once the ring
    /// has drained so it stops firing. Stale bytes left by
    /// [`SerialPort::init`] are dropped first.
    pub fn on_transmit_ready(&mut self) {
        let mut stale = self.status.tx_stale.load(Ordering::Acquire);
        while let Some(byte) = self.tx.dequeue() {
            if stale == 0 {
                self.hw.write(byte);
                return;
            }
            stale -= 1;
            self.status.tx_stale.store(stale, Ordering::Release);
        }
        self.hw.set_tx_interrupt(false);
    }

    /// Free slots left in the receive ring.
    #[inline]
    pub fn rx_free(&self) -> usize {
        self.rx.capacity() - self.rx.len()
    }
}
