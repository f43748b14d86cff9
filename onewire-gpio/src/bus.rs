use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use onewire_hal::{OneWire, OneWireError, OneWireResult};

use crate::guard::ReentrantGuard;

// Nominal slot timings in microseconds. The relative ordering (hold before
// release, settle before sample) and rough magnitudes encode the protocol's
// timing budget; the exact values are not critical.
const RESET_HOLD_US: u32 = 500;
const RESET_SETTLE_US: u32 = 50;
const PRESENCE_POLL_US: u32 = 5;
const PRESENCE_RETRIES: u32 = 100;
const PRESENCE_END_RETRIES: u32 = 240;
const WRITE_SLOT_US: u32 = 80;
const WRITE_RELEASE_US: u32 = 1;
const READ_INIT_US: u32 = 3;
const READ_SLOT_US: u32 = 80;
const RECOVERY_US: u32 = 1;

struct RetryCounter {
    retries: u32,
    max_retries: u32,
}

impl RetryCounter {
    fn new(max_retries: u32) -> Self {
        Self {
            retries: 0,
            max_retries,
        }
    }

    fn tick(&mut self) -> bool {
        self.retries += 1;
        self.retries <= self.max_retries
    }

    fn in_budget(&self) -> bool {
        self.retries <= self.max_retries
    }
}

/// A bit-banged 1-Wire bus master over one open-drain GPIO line.
///
/// Takes ownership of the data pin and a delay source. The pin must be
/// configured open-drain with a pull-up: driving it low holds the bus, driving
/// it high releases it so the pull-up (or a device) controls the level.
///
/// Every operation of the [`OneWire`] impl holds one [`ReentrantGuard`] token
/// for its full duration, so two byte transfers can never interleave at bit
/// level and a slot's timing is not disturbed by preemption. The guard is
/// reentrant but assumes a single owning thread (see [`ReentrantGuard`]).
#[derive(Debug)]
pub struct BitbangBus<P, D> {
    pin: P,
    delay: D,
    guard: ReentrantGuard,
}

impl<P: InputPin + OutputPin, D: DelayNs> BitbangBus<P, D> {
    /// Creates a new bus master and releases the line.
    ///
    /// # Errors
    /// Returns the pin error if the line cannot be released.
    pub fn new(mut pin: P, delay: D) -> Result<Self, P::Error> {
        pin.set_high()?;
        Ok(Self {
            pin,
            delay,
            guard: ReentrantGuard::new(),
        })
    }
}

fn write_bit_slot<P, D>(pin: &mut P, delay: &mut D, bit: bool) -> Result<(), P::Error>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin.set_low()?;
    if bit {
        delay.delay_us(WRITE_RELEASE_US);
        pin.set_high()?;
        delay.delay_us(WRITE_SLOT_US);
    } else {
        // A 0 slot holds the bus low for the whole slot.
        delay.delay_us(WRITE_SLOT_US);
        pin.set_high()?;
    }
    Ok(())
}

fn read_bit_slot<P, D>(pin: &mut P, delay: &mut D) -> Result<bool, P::Error>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin.set_low()?;
    delay.delay_us(READ_INIT_US);
    pin.set_high()?;
    let bit = pin.is_high()?;
    delay.delay_us(READ_SLOT_US);
    Ok(bit)
}

impl<P: InputPin + OutputPin, D: DelayNs> OneWire for BitbangBus<P, D> {
    type BusError = P::Error;

    fn reset(&mut self) -> OneWireResult<(), Self::BusError> {
        let _token = self.guard.acquire();
        self.pin.set_low()?;
        self.delay.delay_us(RESET_HOLD_US);
        self.pin.set_high()?;

        self.delay.delay_us(RESET_SETTLE_US);
        let mut retry = RetryCounter::new(PRESENCE_RETRIES);
        while self.pin.is_high()? && retry.tick() {
            self.delay.delay_us(PRESENCE_POLL_US);
        }
        if !retry.in_budget() {
            return Err(OneWireError::NoDevicePresent);
        }

        // Wait for the device to let go of the line before starting slots.
        let mut retry = RetryCounter::new(PRESENCE_END_RETRIES);
        while self.pin.is_low()? {
            if !retry.tick() {
                return Err(OneWireError::Timeout);
            }
            self.delay.delay_us(PRESENCE_POLL_US);
        }
        Ok(())
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        let _token = self.guard.acquire();
        write_bit_slot(&mut self.pin, &mut self.delay, bit)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        let _token = self.guard.acquire();
        Ok(read_bit_slot(&mut self.pin, &mut self.delay)?)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        // One token for the whole byte keeps the eight slots atomic.
        let _token = self.guard.acquire();
        for bit in 0..8 {
            write_bit_slot(&mut self.pin, &mut self.delay, byte & (1 << bit) != 0)?;
            self.delay.delay_us(RECOVERY_US);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let _token = self.guard.acquire();
        let mut byte = 0;
        for bit in 0..8 {
            if read_bit_slot(&mut self.pin, &mut self.delay)? {
                byte |= 1 << bit;
            }
            self.delay.delay_us(RECOVERY_US);
        }
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use embedded_hal::delay::DelayNs;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use onewire_hal::{OneWire, OneWireError};

    use super::BitbangBus;

    #[derive(Default, Clone)]
    struct RecordingDelay(Rc<RefCell<Vec<u32>>>);

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(ns);
        }
    }

    fn released() -> PinTransaction {
        // Constructor releases the line.
        PinTransaction::set(PinState::High)
    }

    #[test]
    fn reset_detects_presence_pulse() {
        let mut pin = PinMock::new(&[
            released(),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ]);
        let mut bus = BitbangBus::new(pin.clone(), NoopDelay).unwrap();
        assert!(bus.reset().is_ok());
        pin.done();
    }

    #[test]
    fn reset_without_device_times_out() {
        let mut transactions = vec![
            released(),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        // 100 retries plus the initial sample.
        transactions.extend((0..101).map(|_| PinTransaction::get(PinState::High)));
        let mut pin = PinMock::new(&transactions);
        let mut bus = BitbangBus::new(pin.clone(), NoopDelay).unwrap();
        assert_eq!(bus.reset(), Err(OneWireError::NoDevicePresent));
        pin.done();
    }

    #[test]
    fn write_zero_holds_for_full_slot() {
        let delays = RecordingDelay::default();
        let mut pin = PinMock::new(&[
            released(),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut bus = BitbangBus::new(pin.clone(), delays.clone()).unwrap();
        bus.write_bit(false).unwrap();
        assert_eq!(*delays.0.borrow(), vec![80_000]);
        pin.done();
    }

    #[test]
    fn write_one_releases_early() {
        let delays = RecordingDelay::default();
        let mut pin = PinMock::new(&[
            released(),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut bus = BitbangBus::new(pin.clone(), delays.clone()).unwrap();
        bus.write_bit(true).unwrap();
        assert_eq!(*delays.0.borrow(), vec![1_000, 80_000]);
        pin.done();
    }

    #[test]
    fn read_bit_samples_after_release() {
        let mut pin = PinMock::new(&[
            released(),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::get(PinState::High),
        ]);
        let mut bus = BitbangBus::new(pin.clone(), NoopDelay).unwrap();
        assert_eq!(bus.read_bit(), Ok(true));
        pin.done();
    }

    #[test]
    fn read_byte_assembles_lsb_first() {
        let mut transactions = vec![released()];
        // 0xb4, least-significant bit first.
        for bit in 0..8 {
            transactions.push(PinTransaction::set(PinState::Low));
            transactions.push(PinTransaction::set(PinState::High));
            transactions.push(PinTransaction::get(if 0xb4 & (1 << bit) != 0 {
                PinState::High
            } else {
                PinState::Low
            }));
        }
        let mut pin = PinMock::new(&transactions);
        let mut bus = BitbangBus::new(pin.clone(), NoopDelay).unwrap();
        assert_eq!(bus.read_byte(), Ok(0xb4));
        pin.done();
    }

    #[test]
    fn write_byte_generates_eight_slots() {
        let mut transactions = vec![released()];
        for _ in 0..8 {
            transactions.push(PinTransaction::set(PinState::Low));
            transactions.push(PinTransaction::set(PinState::High));
        }
        let mut pin = PinMock::new(&transactions);
        let mut bus = BitbangBus::new(pin.clone(), NoopDelay).unwrap();
        bus.write_byte(0x33).unwrap();
        pin.done();
    }
}
