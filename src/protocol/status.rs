//! The command/status byte.
//!
//! One byte carries eight independent single-bit flags:
//!
//! | Bit | Flag |
//! |-----|------|
//! | 0 | validity ("new command present") |
//! | 1 | data request |
//! | 2 | start mechanism |
//! | 3 | stop mechanism |
//! | 4 | increase axis A speed |
//! | 5 | decrease axis A speed |
//! | 6 | increase axis B speed |
//! | 7 | decrease axis B speed |
//!
//! Start/stop and each increase/decrease pair are mutually exclusive.
//! Setting one member of a pair through [`StatusByte::with`] clears the
//! other and sets the validity bit. A byte whose validity bit is clear
//! carries no command, whatever else is set.
//!
//! # Example
//!
//! ```rust
//! use rig_control::protocol::{CommandFlags, Flag, StatusByte};
//!
//! let byte = StatusByte::EMPTY.with(Flag::Start).with(Flag::Stop);
//! assert!(byte.is_valid());
//! assert!(byte.flags().contains(CommandFlags::STOP));
//! assert!(!byte.flags().contains(CommandFlags::START));
//!
//! let rest = byte.consume();
//! assert!(!rest.is_valid());
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

bitflags::bitflags! {
    /// Decoded contents of a command/status byte.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u8 {
        /// A not-yet-consumed command is present.
        const VALID = 1 << 0;
        /// Send a telemetry line.
        const DATA_REQUEST = 1 << 1;
        /// Start the mechanism.
        const START = 1 << 2;
        /// Stop the mechanism.
        const STOP = 1 << 3;
        /// Raise axis A setpoint one step.
        const INCREASE_A = 1 << 4;
        /// Lower axis A setpoint one step.
        const DECREASE_A = 1 << 5;
        /// Raise axis B setpoint one step.
        const INCREASE_B = 1 << 6;
        /// Lower axis B setpoint one step.
        const DECREASE_B = 1 << 7;
    }
}

/// A single flag of the command/status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Flag {
    /// Bit 0.
    Valid = 0,
    /// Bit 1.
    DataRequest = 1,
    /// Bit 2.
    Start = 2,
    /// Bit 3.
    Stop = 3,
    /// Bit 4.
    IncreaseA = 4,
    /// Bit 5.
    DecreaseA = 5,
    /// Bit 6.
    IncreaseB = 6,
    /// Bit 7.
    DecreaseB = 7,
}

/// Mutually exclusive flag pairs.
pub const EXCLUSIVE_PAIRS: [(Flag, Flag); 3] = [
    (Flag::Start, Flag::Stop),
    (Flag::IncreaseA, Flag::DecreaseA),
    (Flag::IncreaseB, Flag::DecreaseB),
];

/// Flags that survive [`StatusByte::consume`]; the rest are one-shot.
const RESIDUAL: CommandFlags = CommandFlags::START.union(CommandFlags::STOP);

impl Flag {
    /// Every flag, in bit order.
    pub const ALL: [Flag; 8] = [
        Flag::Valid,
        Flag::DataRequest,
        Flag::Start,
        Flag::Stop,
        Flag::IncreaseA,
        Flag::DecreaseA,
        Flag::IncreaseB,
        Flag::DecreaseB,
    ];

    /// Bit position within the byte.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The flag as a one-element set.
    #[inline]
    pub const fn as_flags(self) -> CommandFlags {
        CommandFlags::from_bits_retain(1 << self.index())
    }

    /// The other member of this flag's exclusive pair, if it has one.
    pub fn opposite(self) -> Option<Flag> {
        EXCLUSIVE_PAIRS.iter().find_map(|&(a, b)| {
            if a == self {
                Some(b)
            } else if b == self {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Flag at bit position `index`.
    pub fn from_index(index: u8) -> Option<Flag> {
        Flag::ALL.get(usize::from(index)).copied()
    }
}

/// A command/status byte value.
///
/// Pure and `Copy`: every operation returns a new value and the caller owns
/// storage. For a byte shared with interrupt context use
/// [`SharedStatusByte`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusByte(u8);

impl StatusByte {
    /// No flags set.
    pub const EMPTY: StatusByte = StatusByte(0);

    /// Wrap a raw byte as received.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Every flag set in the byte, including validity.
    #[inline]
    pub const fn flags(self) -> CommandFlags {
        CommandFlags::from_bits_retain(self.0)
    }

    /// True if the byte holds a not-yet-consumed command.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 & CommandFlags::VALID.bits() != 0
    }

    /// The command flags, or `None` for a stale byte.
    ///
    /// The validity bit is not part of the returned set.
    pub fn command(self) -> Option<CommandFlags> {
        if self.is_valid() {
            Some(self.flags().difference(CommandFlags::VALID))
        } else {
            None
        }
    }

    /// Set `flag`, clearing its exclusive partner and setting validity.
    ///
    /// Setting [`Flag::Valid`] itself only sets validity.
    #[must_use]
    pub fn with(self, flag: Flag) -> Self {
        let mut flags = self.flags();
        if let Some(other) = flag.opposite() {
            flags.remove(other.as_flags());
        }
        flags.insert(flag.as_flags() | CommandFlags::VALID);
        Self(flags.bits())
    }

    /// Clear a single flag. Validity is left as is.
    #[must_use]
    pub fn without(self, flag: Flag) -> Self {
        Self(self.flags().difference(flag.as_flags()).bits())
    }

    /// Mark the command as acted upon.
    ///
    /// Clears validity and every one-shot flag. Start/stop survive as the
    /// residual state of the mechanism request.
    #[must_use]
    pub fn consume(self) -> Self {
        Self(self.flags().intersection(RESIDUAL).bits())
    }

    /// Resolve a byte that arrived with both members of a pair set.
    ///
    /// Stop wins over start; conflicting increase/decrease requests cancel.
    #[must_use]
    pub fn normalize(self) -> Self {
        let mut flags = self.flags();
        for (a, b) in EXCLUSIVE_PAIRS {
            let pair = a.as_flags() | b.as_flags();
            if flags.contains(pair) {
                flags.remove(pair);
                if b == Flag::Stop {
                    flags.insert(CommandFlags::STOP);
                }
            }
        }
        Self(flags.bits())
    }

    /// Build a byte by setting each flag in turn.
    pub fn encode<I: IntoIterator<Item = Flag>>(flags: I) -> Self {
        flags.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<u8> for StatusByte {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<StatusByte> for u8 {
    fn from(byte: StatusByte) -> u8 {
        byte.0
    }
}

/// A status byte shared between contexts.
///
/// Every update is a single atomic read-modify-write, so a flag posted from
/// an interrupt cannot be lost between the main loop's read and its
/// consume.
#[derive(Debug, Default)]
pub struct SharedStatusByte(AtomicU8);

impl SharedStatusByte {
    /// Create an empty byte.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Current value.
    #[inline]
    pub fn load(&self) -> StatusByte {
        StatusByte(self.0.load(Ordering::Acquire))
    }

    /// Set one flag (with exclusivity and validity).
    pub fn post(&self, flag: Flag) {
        self.update(|byte| byte.with(flag));
    }

    /// Merge a received byte. Stale bytes are ignored.
    pub fn merge(&self, incoming: StatusByte) {
        let Some(command) = incoming.normalize().command() else {
            return;
        };
        self.update(|byte| {
            Flag::ALL
                .into_iter()
                .filter(|f| command.contains(f.as_flags()))
                .fold(byte.with(Flag::Valid), StatusByte::with)
        });
    }

    /// Take the pending command, consuming it.
    ///
    /// Returns `None` and leaves the byte untouched if it is stale.
    pub fn take(&self) -> Option<CommandFlags> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                let byte = StatusByte(raw);
                byte.is_valid().then(|| byte.consume().raw())
            })
            .ok()
            .and_then(|raw| StatusByte(raw).command())
    }

    fn update(&self, f: impl Fn(StatusByte) -> StatusByte) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(f(StatusByte(raw)).raw())
            });
    }
}
