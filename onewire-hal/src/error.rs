/// One wire communication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// Indicates that no device asserted a presence pulse after a bus reset.
    NoDevicePresent,
    /// A CRC check over a ROM code or register read failed.
    InvalidCrc,
    /// A bounded wait for a device response expired.
    Timeout,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}
