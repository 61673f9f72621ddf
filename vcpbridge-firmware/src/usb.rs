//! USB CDC-ACM virtual COM port
//!
//! The CDC class runs in its own task and exchanges bytes with the bridge
//! worker through two pipes. [`PipeVcp`] is the worker's non-blocking view
//! of those pipes.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_rp::Peri;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, UsbDevice};
use portable_atomic::Ordering;
use static_cell::StaticCell;

use vcpbridge_hal::VirtualSerial;

use crate::channels::{FROM_HOST, HOST_CONNECTED, TO_HOST};
use crate::Irqs;

/// Full-speed bulk packet size
pub const MAX_PACKET_SIZE: u16 = 64;

pub type UsbDriver = Driver<'static, USB>;

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

/// Build the USB device with a single CDC-ACM interface
pub fn init(usb: Peri<'static, USB>) -> (UsbDevice<'static, UsbDriver>, CdcAcmClass<'static, UsbDriver>) {
    let driver = Driver::new(usb, Irqs);

    let mut config = embassy_usb::Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("vcpbridge");
    config.product = Some("USB-UART Bridge");
    config.serial_number = Some("VCP0001");
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUF.init([0; 64]),
    );

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET_SIZE);
    (builder.build(), class)
}

/// Worker-side handle on the USB pipes
pub struct PipeVcp;

impl PipeVcp {
    /// Drop whatever the host sent
    pub fn discard_input(&mut self) {
        let mut buf = [0u8; 64];
        while let Ok(n) = FROM_HOST.try_read(&mut buf) {
            if n == 0 {
                break;
            }
        }
    }
}

impl VirtualSerial for PipeVcp {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        FROM_HOST.try_read(buf).unwrap_or(0)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        if !self.is_connected() {
            // No host: the bytes have nowhere to go, don't hold up the ring
            return data.len();
        }
        TO_HOST.try_write(data).unwrap_or(0)
    }

    fn is_connected(&self) -> bool {
        HOST_CONNECTED.load(Ordering::Relaxed)
    }
}
