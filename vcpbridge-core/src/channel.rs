//! UART channel ownership
//!
//! Each UART channel can be owned by at most one bridge session. Acquiring
//! an owned channel fails immediately; there is no queueing.

use portable_atomic::{AtomicBool, Ordering};
use vcpbridge_hal::uart::{UartId, UART_CHANNEL_COUNT};

/// Ownership table for the UART channels
pub struct ChannelRegistry {
    owned: [AtomicBool; UART_CHANNEL_COUNT],
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Create a registry with every channel free
    pub const fn new() -> Self {
        Self {
            owned: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Take ownership of a channel
    ///
    /// Returns `None` if the channel is already owned. Ownership ends when
    /// the returned lease is dropped.
    pub fn try_acquire(&self, id: UartId) -> Option<ChannelLease<'_>> {
        self.owned[id.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ChannelLease { registry: self, id })
    }

    /// Check if a channel is owned
    pub fn is_owned(&self, id: UartId) -> bool {
        self.owned[id.index()].load(Ordering::Acquire)
    }

    fn release(&self, id: UartId) {
        self.owned[id.index()].store(false, Ordering::Release);
    }
}

/// Proof of ownership of one UART channel
pub struct ChannelLease<'a> {
    registry: &'a ChannelRegistry,
    id: UartId,
}

impl ChannelLease<'_> {
    /// The owned channel
    pub fn id(&self) -> UartId {
        self.id
    }
}

impl Drop for ChannelLease<'_> {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let registry = ChannelRegistry::new();

        let lease = registry.try_acquire(UartId::Uart0);
        assert!(lease.is_some());
        assert!(registry.is_owned(UartId::Uart0));
        assert!(!registry.is_owned(UartId::Uart1));

        drop(lease);
        assert!(!registry.is_owned(UartId::Uart0));
    }

    #[test]
    fn test_double_acquire_fails_fast() {
        let registry = ChannelRegistry::new();

        let first = registry.try_acquire(UartId::Uart1);
        assert!(first.is_some());
        assert!(registry.try_acquire(UartId::Uart1).is_none());

        // Other channel is independent
        assert!(registry.try_acquire(UartId::Uart0).is_some());
    }
}
