//! Interrupt-driven UART abstraction
//!
//! Mirrors the shape of the platform UART drivers the bridge runs on:
//! explicit init/deinit per channel, a receive interrupt that reports one
//! event at a time, and an async transmit that yields while the line is busy.

use core::future::Future;

/// UART peripheral identifier
///
/// The bridge supports exactly two channel profiles. Channel 0 is the
/// peripheral normally owned by the log console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

/// Number of UART channels exposed to the bridge
pub const UART_CHANNEL_COUNT: usize = 2;

impl UartId {
    /// Look up a channel by its numeric id
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(UartId::Uart0),
            1 => Some(UartId::Uart1),
            _ => None,
        }
    }

    /// Numeric channel id (0 or 1)
    pub fn index(self) -> usize {
        match self {
            UartId::Uart0 => 0,
            UartId::Uart1 => 1,
        }
    }
}

/// Line errors reported by the receive interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UartFault {
    /// Stop bit not where it should be
    Framing = 1,
    /// Receive FIFO overflowed before it was read
    Overrun = 2,
    /// Parity check failed
    Parity = 3,
    /// Line held low for longer than a frame
    Break = 4,
}

impl UartFault {
    /// Get the fault as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a fault from a byte value (0 means "no fault")
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(UartFault::Framing),
            2 => Some(UartFault::Overrun),
            3 => Some(UartFault::Parity),
            4 => Some(UartFault::Break),
            _ => None,
        }
    }
}

/// Bytes carried by one [`RxBurst`]
pub const RX_BURST_LEN: usize = 32;

/// Bytes read from the receive FIFO in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxBurst {
    len: u8,
    data: [u8; RX_BURST_LEN],
}

impl Default for RxBurst {
    fn default() -> Self {
        Self::new()
    }
}

impl RxBurst {
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; RX_BURST_LEN],
        }
    }

    /// Append a byte; returns `false` when the burst is full
    pub fn push(&mut self, byte: u8) -> bool {
        let Some(slot) = self.data.get_mut(self.len as usize) else {
            return false;
        };
        *slot = byte;
        self.len += 1;
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len as usize == RX_BURST_LEN
    }
}

/// Event delivered by the receive interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartIrqEvent {
    /// Receive register not empty, carrying the byte that was read
    RxByte(u8),
    /// Several bytes drained from the receive FIFO, in arrival order
    RxBurst(RxBurst),
    /// Line went idle after a burst
    Idle,
    /// Line error; reception must not continue
    Fault(UartFault),
}

/// Interrupt callback
///
/// Called from interrupt context. Implementations must not block.
pub type IrqCallback = fn(UartIrqEvent);

/// UART driver used by the bridge
pub trait UartPort {
    /// Error type for init/transmit operations
    type Error: core::fmt::Debug;

    /// Bring up the channel at the given baud rate
    fn init(&mut self, channel: UartId, baudrate: u32) -> Result<(), Self::Error>;

    /// Shut the channel down and mask its interrupt
    fn deinit(&mut self, channel: UartId);

    /// Install (or with `None`, remove) the receive interrupt callback
    fn set_irq_callback(&mut self, channel: UartId, callback: Option<IrqCallback>);

    /// Write data to the channel
    ///
    /// Completes once the data is in the transmit FIFO, yielding to other
    /// tasks while the FIFO is full. Returns the number of bytes written.
    fn transmit(
        &mut self,
        channel: UartId,
        data: &[u8],
    ) -> impl Future<Output = Result<usize, Self::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index() {
        assert_eq!(UartId::from_index(0), Some(UartId::Uart0));
        assert_eq!(UartId::from_index(1), Some(UartId::Uart1));
        assert_eq!(UartId::from_index(2), None);
        assert_eq!(UartId::Uart1.index(), 1);
    }

    #[test]
    fn test_fault_byte_values() {
        for fault in [
            UartFault::Framing,
            UartFault::Overrun,
            UartFault::Parity,
            UartFault::Break,
        ] {
            assert_eq!(UartFault::from_u8(fault.as_u8()), Some(fault));
        }
        assert_eq!(UartFault::from_u8(0), None);
    }

    #[test]
    fn test_rx_burst_fills_up() {
        let mut burst = RxBurst::new();
        assert!(burst.is_empty());
        for i in 0..RX_BURST_LEN as u8 {
            assert!(burst.push(i));
        }
        assert!(burst.is_full());
        assert!(!burst.push(0xff));
        assert_eq!(burst.as_slice().len(), RX_BURST_LEN);
        assert_eq!(burst.as_slice()[RX_BURST_LEN - 1], RX_BURST_LEN as u8 - 1);
    }
}
