//! Bridge instance shared by the worker and UI tasks

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use vcpbridge_core::ring::RX_RING_SIZE;
use vcpbridge_core::{BridgeShared, ChannelRegistry, UartBridge};
use vcpbridge_hal::UartIrqEvent;
use vcpbridge_hal_rp2040::{Rp2040Uart, UartConsole};

/// The bridge as wired on this board
pub type Bridge = UartBridge<'static, Rp2040Uart<'static>, UartConsole, RX_RING_SIZE>;

/// Lock around the bridge; held for one command or one worker step
pub type SharedBridge = Mutex<CriticalSectionRawMutex, Bridge>;

/// Status, wake signal and interrupt relay slot
pub static SHARED: BridgeShared<'static, RX_RING_SIZE> = BridgeShared::new();

/// UART channel ownership
pub static REGISTRY: ChannelRegistry = ChannelRegistry::new();

/// Callback registered with the UART driver (interrupt context)
pub fn relay_irq(event: UartIrqEvent) {
    SHARED.slot.dispatch(event);
}
