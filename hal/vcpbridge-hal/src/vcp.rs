//! USB virtual COM port
//!
//! The bridge treats the host side as a best-effort byte stream. Neither
//! direction may block the bridge worker.

/// Non-blocking byte stream to and from the USB host
pub trait VirtualSerial {
    /// Read whatever the host has sent, up to `buf.len()` bytes
    ///
    /// Returns 0 when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue bytes for the host
    ///
    /// Returns how many bytes were accepted; the caller keeps the rest.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Whether a host has the port open
    fn is_connected(&self) -> bool {
        true
    }
}
