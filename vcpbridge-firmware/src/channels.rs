//! Inter-task communication channels
//!
//! Static channels and signals shared between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use vcpbridge_core::view::InputEvent;

/// Channel capacity for key events
const INPUT_CHANNEL_SIZE: usize = 8;

/// Bytes buffered per USB direction
pub const USB_PIPE_SIZE: usize = 256;

/// Key events from the button tasks
pub static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, InputEvent, INPUT_CHANNEL_SIZE> =
    Channel::new();

/// Bytes received from the USB host, waiting to go out on the UART
pub static FROM_HOST: Pipe<CriticalSectionRawMutex, USB_PIPE_SIZE> = Pipe::new();

/// Bytes from the UART, waiting to be sent to the USB host
pub static TO_HOST: Pipe<CriticalSectionRawMutex, USB_PIPE_SIZE> = Pipe::new();

/// Signal that the host sent data (wakes the bridge worker)
pub static HOST_DATA: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// A host has the CDC-ACM port open
pub static HOST_CONNECTED: AtomicBool = AtomicBool::new(false);
