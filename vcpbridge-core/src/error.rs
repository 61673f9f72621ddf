//! Bridge error taxonomy

use vcpbridge_hal::{FileError, UartFault};

/// Errors returned by bridge operations
///
/// Interrupt-context faults never reach a caller directly: the relay latches
/// them and the worker reports [`BridgeError::HardwareFault`] after it has
/// stopped the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// UART channel already owned by another session
    HardwareUnavailable,
    /// Operation requires a running bridge
    NotRunning,
    /// Status lock was contended; the caller keeps its last snapshot
    MutexTimeout,
    /// Line error on the receive side; the bridge has been stopped
    HardwareFault(UartFault),
    /// Channel id outside the supported profiles
    InvalidChannel,
    /// Baud rate of zero or beyond what the UART can clock
    InvalidBaudrate,
    /// UART driver refused init or transmit
    Driver,
    /// Injection source could not be read
    File(FileError),
    /// Injection source larger than the injection buffer
    PayloadTooLarge,
}

impl From<FileError> for BridgeError {
    fn from(e: FileError) -> Self {
        match e {
            FileError::BufferTooSmall => BridgeError::PayloadTooLarge,
            other => BridgeError::File(other),
        }
    }
}

impl BridgeError {
    /// Check if this error stopped the bridge
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::HardwareFault(_))
    }
}
