//! Receive interrupt relay
//!
//! The relay is the only code that runs in UART interrupt context. It moves
//! bytes from the receive register into the [`ByteRing`](crate::ByteRing)
//! and wakes the bridge worker. It never allocates, never blocks, and never
//! touches the status mutex.
//!
//! Line faults are latched here and acted on by the worker: the relay stops
//! accepting bytes, and the next worker step deinitializes the UART and
//! stops the bridge.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU8, Ordering};
use vcpbridge_hal::{UartFault, UartIrqEvent};

use crate::ring::RingWriter;

/// Wake-up path from the interrupt to the worker
///
/// `notify` never blocks, so it is safe from interrupt context.
pub struct RxNotify {
    ready: Signal<CriticalSectionRawMutex, ()>,
    fault: AtomicU8,
}

impl Default for RxNotify {
    fn default() -> Self {
        Self::new()
    }
}

impl RxNotify {
    /// Create a new notifier with no pending wake-up
    pub const fn new() -> Self {
        Self {
            ready: Signal::new(),
            fault: AtomicU8::new(0),
        }
    }

    /// Wake the worker
    pub fn notify(&self) {
        self.ready.signal(());
    }

    /// Wait for the next wake-up
    ///
    /// Callers bound this with a timeout so a stop request is never missed.
    pub async fn wait(&self) {
        self.ready.wait().await
    }

    /// Check if a wake-up is pending
    pub fn is_pending(&self) -> bool {
        self.ready.signaled()
    }

    /// Record a line fault; the first fault wins until taken
    pub fn latch_fault(&self, fault: UartFault) {
        let _ = self
            .fault
            .compare_exchange(0, fault.as_u8(), Ordering::AcqRel, Ordering::Acquire);
    }

    /// Take the latched fault, if any
    pub fn take_fault(&self) -> Option<UartFault> {
        UartFault::from_u8(self.fault.swap(0, Ordering::AcqRel))
    }

    /// Drop any pending wake-up and fault (start of a new session)
    pub fn reset(&self) {
        self.ready.reset();
        self.fault.store(0, Ordering::Release);
    }
}

/// Interrupt-side half of a bridge session
pub struct RxRelay<'a, const N: usize> {
    writer: RingWriter<'a, N>,
    notify: &'a RxNotify,
    faulted: bool,
}

impl<'a, const N: usize> RxRelay<'a, N> {
    /// Create a relay feeding `writer`
    pub fn new(writer: RingWriter<'a, N>, notify: &'a RxNotify) -> Self {
        Self {
            writer,
            notify,
            faulted: false,
        }
    }

    /// Handle one interrupt event
    pub fn on_irq(&mut self, event: UartIrqEvent) {
        match event {
            UartIrqEvent::RxByte(byte) => {
                if self.faulted {
                    return;
                }
                // Full ring drops the byte; the writer counts it
                self.writer.push(byte);
                self.notify.notify();
            }
            UartIrqEvent::RxBurst(burst) => self.on_rx_burst(burst.as_slice()),
            UartIrqEvent::Idle => self.notify.notify(),
            UartIrqEvent::Fault(fault) => {
                self.faulted = true;
                self.notify.latch_fault(fault);
                self.notify.notify();
            }
        }
    }

    /// Handle a burst read from a receive FIFO
    pub fn on_rx_burst(&mut self, bytes: &[u8]) {
        if self.faulted || bytes.is_empty() {
            return;
        }
        self.writer.push_slice(bytes);
        self.notify.notify();
    }

    /// Check if a fault has been seen since this relay was installed
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Give the ring writer back (relay unregistered)
    pub fn into_writer(self) -> RingWriter<'a, N> {
        self.writer
    }
}

/// Registration point between the UART interrupt and the relay
///
/// The interrupt callback calls [`RelaySlot::dispatch`]. The critical
/// section around the slot is held only to swap the relay in or out, or
/// for one relay call, so the interrupt never waits on the worker.
pub struct RelaySlot<'a, const N: usize> {
    relay: Mutex<CriticalSectionRawMutex, RefCell<Option<RxRelay<'a, N>>>>,
}

impl<'a, const N: usize> Default for RelaySlot<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> RelaySlot<'a, N> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            relay: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install a relay, returning the previous one if there was any
    pub fn install(&self, relay: RxRelay<'a, N>) -> Option<RxRelay<'a, N>> {
        self.relay.lock(|cell| cell.borrow_mut().replace(relay))
    }

    /// Remove the installed relay
    pub fn remove(&self) -> Option<RxRelay<'a, N>> {
        self.relay.lock(|cell| cell.borrow_mut().take())
    }

    /// Check if a relay is installed
    pub fn is_installed(&self) -> bool {
        self.relay.lock(|cell| cell.borrow().is_some())
    }

    /// Forward an interrupt event to the installed relay
    ///
    /// Events arriving with no relay installed are discarded.
    pub fn dispatch(&self, event: UartIrqEvent) {
        self.relay.lock(|cell| {
            if let Some(relay) = cell.borrow_mut().as_mut() {
                relay.on_irq(event);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::ByteRing;
    use vcpbridge_hal::RxBurst;

    #[test]
    fn test_bytes_reach_ring_and_wake() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (writer, mut reader) = ring.split();
        let notify = RxNotify::new();
        let mut relay = RxRelay::new(writer, &notify);

        assert!(!notify.is_pending());
        relay.on_irq(UartIrqEvent::RxByte(b'A'));
        relay.on_rx_burst(b"BC");

        assert!(notify.is_pending());
        assert_eq!(reader.pop(), Some(b'A'));
        assert_eq!(reader.pop(), Some(b'B'));
        assert_eq!(reader.pop(), Some(b'C'));
    }

    #[test]
    fn test_fault_latches_and_blocks_reception() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (writer, mut reader) = ring.split();
        let notify = RxNotify::new();
        let mut relay = RxRelay::new(writer, &notify);

        relay.on_irq(UartIrqEvent::RxByte(1));
        relay.on_irq(UartIrqEvent::Fault(UartFault::Framing));
        relay.on_irq(UartIrqEvent::Fault(UartFault::Overrun));
        relay.on_irq(UartIrqEvent::RxByte(2));
        let mut burst = RxBurst::new();
        burst.push(3);
        relay.on_irq(UartIrqEvent::RxBurst(burst));

        assert!(relay.is_faulted());
        assert_eq!(notify.take_fault(), Some(UartFault::Framing));
        assert_eq!(notify.take_fault(), None);
        assert_eq!(reader.pop(), Some(1));
        assert_eq!(reader.pop(), None);
    }

    #[test]
    fn test_slot_dispatch() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let (writer, mut reader) = ring.split();
        let notify = RxNotify::new();
        let slot: RelaySlot<'_, 8> = RelaySlot::new();

        // Nothing installed: event is discarded
        slot.dispatch(UartIrqEvent::RxByte(9));
        assert!(!notify.is_pending());

        assert!(slot.install(RxRelay::new(writer, &notify)).is_none());
        assert!(slot.is_installed());
        slot.dispatch(UartIrqEvent::RxByte(7));
        let mut burst = RxBurst::new();
        burst.push(8);
        burst.push(9);
        slot.dispatch(UartIrqEvent::RxBurst(burst));
        assert_eq!(reader.pop(), Some(7));
        assert_eq!(reader.pop(), Some(8));
        assert_eq!(reader.pop(), Some(9));

        assert!(slot.remove().is_some());
        assert!(!slot.is_installed());
    }

    #[test]
    fn test_reset_clears_wake_and_fault() {
        let notify = RxNotify::new();
        notify.latch_fault(UartFault::Break);
        notify.notify();
        notify.reset();
        assert!(!notify.is_pending());
        assert_eq!(notify.take_fault(), None);
    }
}
