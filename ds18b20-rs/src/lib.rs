#![cfg_attr(not(test), no_std)]
//! Driver for the Maxim DS18B20 digital thermometer on a single-drop 1-Wire bus.
//!
//! The driver caches the ROM code of the one attached device, addresses it with
//! Match ROM before every command, and reads temperatures through the 9-byte
//! scratchpad with CRC validation. Any failed transaction drops the cached
//! identity so the next cycle rediscovers the device.

use embedded_hal::delay::DelayNs;
use fixed::types::I12F4;
use onewire_hal::{ONEWIRE_READ_ROM_CMD, OneWire, OneWireCrc, OneWireError, OneWireResult};

const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_READ_SCRATCH: u8 = 0xbe;

// Conversion takes at most 750 ms at 12-bit resolution; budget a full second
// of completion polls before giving up.
const CONVERSION_POLL_MS: u32 = 10;
const CONVERSION_POLL_LIMIT: u32 = 100;

/// Temperature readout as a signed fixed-point count, 0.0625 degrees Celsius
/// per bit at the default 12-bit resolution.
pub type Temperature = I12F4;

/// The 64-bit lasered ROM code identifying one DS18B20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomCode {
    /// Device family code, 0x28 for the DS18B20. Never zero on a valid code.
    pub family_code: u8,
    /// Unique 48-bit serial number.
    pub serial: [u8; 6],
    /// CRC-8 over the family code and serial bytes.
    pub crc: u8,
}

impl RomCode {
    fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            family_code: bytes[0],
            serial: [bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6]],
            crc: bytes[7],
        }
    }

    /// The code in bus transmission order: family code, serial, CRC.
    pub const fn to_bytes(&self) -> [u8; 8] {
        [
            self.family_code,
            self.serial[0],
            self.serial[1],
            self.serial[2],
            self.serial[3],
            self.serial[4],
            self.serial[5],
            self.crc,
        ]
    }

    /// The code as the `u64` consumed by [`OneWire::address`].
    pub const fn as_u64(&self) -> u64 {
        u64::from_le_bytes(self.to_bytes())
    }

    /// A code is valid when the family code is nonzero and the CRC checks out.
    pub fn is_valid(&self) -> bool {
        self.family_code != 0 && OneWireCrc::validate(&self.to_bytes())
    }
}

/// A CRC-checked snapshot of the sensor's 9-byte register block.
///
/// Only validated snapshots are handed out; a scratchpad read that fails its
/// CRC check surfaces as [`OneWireError::InvalidCrc`] instead.
#[derive(Debug, Clone, Copy)]
pub struct Scratchpad {
    data: [u8; 9],
}

impl Scratchpad {
    /// Temperature register, least-significant byte.
    pub fn temp_lsb(&self) -> u8 {
        self.data[0]
    }

    /// Temperature register, most-significant byte.
    pub fn temp_msb(&self) -> u8 {
        self.data[1]
    }

    /// High-alarm trigger register (TH).
    pub fn alarm_high(&self) -> u8 {
        self.data[2]
    }

    /// Low-alarm trigger register (TL).
    pub fn alarm_low(&self) -> u8 {
        self.data[3]
    }

    /// Configuration register.
    pub fn configuration(&self) -> u8 {
        self.data[4]
    }

    /// CRC-8 over the first eight bytes.
    pub fn crc(&self) -> u8 {
        self.data[8]
    }

    /// Decode the temperature registers.
    pub fn temperature(&self) -> Temperature {
        Temperature::from_le_bytes([self.temp_lsb(), self.temp_msb()])
    }
}

/// Driver state for the single DS18B20 on the bus.
///
/// The bus and delay source are passed into each operation, so one bus can be
/// shared with other device drivers between transactions.
#[derive(Debug, Default)]
pub struct Ds18b20 {
    rom: Option<RomCode>,
}

impl Ds18b20 {
    /// DS18B20 family code.
    #[inline]
    pub const fn family() -> u8 {
        0x28
    }

    /// Creates a driver with no cached identity.
    pub const fn new() -> Self {
        Self { rom: None }
    }

    /// The cached ROM code, if the device has been identified.
    pub fn rom_code(&self) -> Option<&RomCode> {
        self.rom.as_ref()
    }

    /// Drops the cached ROM code so the next operation rediscovers the device.
    pub fn invalidate_identity(&mut self) {
        self.rom = None;
    }

    /// Returns the cached ROM code, reading it from the device if necessary.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if the bus reset sees no presence
    /// pulse or the code reads back all zero, [`OneWireError::InvalidCrc`] if
    /// the code fails its CRC check.
    pub fn ensure_identity<O: OneWire>(
        &mut self,
        bus: &mut O,
    ) -> OneWireResult<RomCode, O::BusError> {
        if let Some(rom) = self.rom {
            return Ok(rom);
        }
        bus.reset()?;
        bus.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut() {
            *byte = bus.read_byte()?;
        }
        let rom = RomCode::from_bytes(bytes);
        if rom.family_code == 0 {
            return Err(OneWireError::NoDevicePresent);
        }
        if !rom.is_valid() {
            log::error!("ROM code failed CRC check");
            return Err(OneWireError::InvalidCrc);
        }
        log::info!(
            "found sensor: family {:#04x}, serial {:02x?}",
            rom.family_code,
            rom.serial
        );
        self.rom = Some(rom);
        Ok(rom)
    }

    /// Addresses the device with Match ROM, discovering it first if needed.
    ///
    /// # Errors
    /// This method returns an error if identification or addressing fails.
    pub fn select<O: OneWire>(&mut self, bus: &mut O) -> OneWireResult<(), O::BusError> {
        let rom = self.ensure_identity(bus)?;
        bus.address(Some(rom.as_u64()))
    }

    /// Reads and validates the 9-byte scratchpad.
    ///
    /// # Errors
    /// [`OneWireError::InvalidCrc`] if the snapshot fails its CRC check, or
    /// any addressing error.
    pub fn read_scratchpad<O: OneWire>(
        &mut self,
        bus: &mut O,
    ) -> OneWireResult<Scratchpad, O::BusError> {
        self.select(bus)?;
        bus.write_byte(DS18B20_READ_SCRATCH)?;
        let mut data = [0u8; 9];
        for byte in data.iter_mut() {
            *byte = bus.read_byte()?;
        }
        if !OneWireCrc::validate(&data) {
            return Err(OneWireError::InvalidCrc);
        }
        Ok(Scratchpad { data })
    }

    /// Triggers a conversion and reads the temperature in degrees Celsius.
    ///
    /// Blocks for the duration of the conversion (up to 750 ms), polling the
    /// completion bit every 10 ms. On any failure the cached identity is
    /// dropped and rediscovered on the next call.
    ///
    /// # Errors
    /// [`OneWireError::Timeout`] if the sensor never signals completion,
    /// otherwise any identification, addressing or CRC error.
    pub fn read_temperature<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> OneWireResult<Temperature, O::BusError> {
        let result = self.read_temperature_inner(bus, delay);
        if result.is_err() {
            self.rom = None;
        }
        result
    }

    fn read_temperature_inner<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> OneWireResult<Temperature, O::BusError> {
        self.select(bus)?;
        bus.write_byte(DS18B20_START_CONV)?;
        let mut polls = 0;
        while !bus.read_bit()? {
            if polls >= CONVERSION_POLL_LIMIT {
                return Err(OneWireError::Timeout);
            }
            polls += 1;
            delay.delay_ms(CONVERSION_POLL_MS);
        }
        let scratchpad = self.read_scratchpad(bus)?;
        Ok(scratchpad.temperature())
    }
}
