//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `hbridge`: PWM + two direction pins over `embedded-hal` 1.0, for any HAL
//! - `mock`: Test implementations for desktop development (requires `std`)

pub mod hbridge;

#[cfg(feature = "std")]
pub mod mock;

pub use hbridge::{Direction, HBridge, HBridgeError};

#[cfg(feature = "std")]
pub use mock::*;
