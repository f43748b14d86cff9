use crate::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireResult};

/// Trait for 1-Wire bus masters.
///
/// Implementors supply the reset sequence and the bit-level time slots; byte
/// transfers and ROM addressing are provided on top of those. Implementations
/// that transfer whole bytes natively can override [`write_byte`](OneWire::write_byte)
/// and [`read_byte`](OneWire::read_byte).
pub trait OneWire {
    /// The error type returned by the underlying hardware.
    type BusError;

    /// Resets the 1-Wire bus and waits for a device to assert presence.
    ///
    /// Every bus transaction starts with a reset.
    ///
    /// # Errors
    /// Returns [`NoDevicePresent`](crate::OneWireError::NoDevicePresent) if no
    /// device answers the reset pulse within the detection window.
    fn reset(&mut self) -> OneWireResult<(), Self::BusError>;

    /// Generates one write time slot on the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Generates one read time slot and samples the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the bus, least-significant bit first.
    ///
    /// # Errors
    /// This method returns an error if any of the bit writes fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for bit in 0..8 {
            self.write_bit(byte & (1 << bit) != 0)?;
        }
        Ok(())
    }

    /// Reads a byte from the bus, least-significant bit first.
    ///
    /// # Errors
    /// This method returns an error if any of the bit reads fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for bit in 0..8 {
            if self.read_bit()? {
                byte |= 1 << bit;
            }
        }
        Ok(byte)
    }

    /// Addresses a device on the bus.
    ///
    /// Resets the bus, then sends a Match ROM command followed by the 64-bit
    /// ROM code, or a Skip ROM command when `rom` is [`None`]. Skip ROM
    /// addresses every device at once and is only meaningful for subsequent
    /// reads on a single-drop bus.
    ///
    /// # Errors
    /// This method returns an error if the reset or any write fails.
    fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
        let cmd = if rom.is_some() {
            ONEWIRE_MATCH_ROM_CMD
        } else {
            ONEWIRE_SKIP_ROM_CMD
        };
        self.reset()?;
        self.write_byte(cmd)?;
        if let Some(rom) = rom {
            for &byte in rom.to_le_bytes().iter() {
                self.write_byte(byte)?;
            }
        }
        Ok(())
    }
}
