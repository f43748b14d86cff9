#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//! # onewire-hal
//! A no-std interface for 1-Wire bus masters.
//!
//! The [OneWire] trait defines the operations a bus master must provide: resetting the
//! bus and detecting device presence, and reading and writing bits and bytes (LSB first).
//! Byte transfers and device addressing are layered on the bit operations as default
//! methods, so a bit-banged transport only has to supply the timing-sensitive slots.
//!
//! The crate also provides [OneWireCrc], the CRC-8 accumulator used to validate ROM
//! codes and register reads of 1-Wire devices.

mod crc;
mod error;
mod traits;
pub use crc::OneWireCrc;
pub use error::OneWireError;
pub use traits::OneWire;

/// Result type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;

/// Command to read the ROM code of the single device on the bus.
///
/// Only usable on a single-drop bus: with more than one device responding, the
/// bit-wise wired-AND of the ROM codes is read back and the CRC check fails.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to address a specific device by its 64-bit ROM code.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to address all devices on the bus without sending a ROM code.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;
