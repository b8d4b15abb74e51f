#![cfg_attr(not(feature = "std"), no_std)]

//! Decision engine for a multi-channel soil moisture guard.
//!
//! Each channel pairs a capacitive moisture sensor with a user-set reference
//! potentiometer and a water pump. Once per cycle the engine samples every
//! channel, conditions the raw readings into bounded percentages and decides
//! whether anything changed enough to matter. Only then does it refresh the
//! display and run the pumps of channels below their reference, counting
//! attempts against a per-channel maximum.
//!
//! The engine is hardware-agnostic: analog sampling, channel multiplexing,
//! pump actuation, e-paper rendering and deep sleep are reached exclusively
//! through the narrow traits in `core::hal`. Bindings for real boards live
//! outside this crate; the `sim` module provides in-memory implementations
//! for tests and demos.

/// The no_std enclave
pub mod core;

pub use self::core::*;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
