#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

/*! # onewire-gpio

A bit-banged 1-Wire bus master over a single open-drain GPIO line.

[`BitbangBus`] takes ownership of a pin (implementing the
[`InputPin`](embedded_hal::digital::InputPin) and
[`OutputPin`](embedded_hal::digital::OutputPin) traits) and a timer object
implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait, and generates
the reset/presence sequence and the read and write time slots in software.
Every bus operation runs inside a critical section held through
[`ReentrantGuard`] so the microsecond timing of a slot cannot be disturbed by
preemption.
*/

mod bus;
mod guard;

pub use bus::BitbangBus;
pub use guard::{GuardToken, ReentrantGuard};
