//! vcpbridge - USB virtual COM port to UART bridge
//!
//! Forwards bytes between a GPIO UART and a USB CDC-ACM port on RP2040
//! boards. A six-key keypad drives the status view: start/stop the
//! bridge, send canned commands to the attached module, and pick the
//! baud rate.

#![no_std]
#![no_main]

use core::fmt::Write;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::USB;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use vcpbridge_core::ring::RX_RING_SIZE;
use vcpbridge_core::view::InputKey;
use vcpbridge_core::{BridgeConfig, ByteRing, CommandStore, UartBridge};
use vcpbridge_hal::Console;
use vcpbridge_hal_rp2040::{
    Rp2040FlashStorage, Rp2040Uart, Uart0IrqHandler, Uart1IrqHandler, UartConsole,
};

use crate::bridge::{relay_irq, SharedBridge, REGISTRY, SHARED};
use crate::commands::COMMAND_FILES;
use crate::config::ConfigPersistence;

mod bridge;
mod channels;
mod commands;
mod config;
mod tasks;
mod usb;

bind_interrupts!(pub struct Irqs {
    UART0_IRQ => Uart0IrqHandler;
    UART1_IRQ => Uart1IrqHandler;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

// Static cells for the bridge (must live forever for task references)
static RX_RING: StaticCell<ByteRing<RX_RING_SIZE>> = StaticCell::new();
static BRIDGE: StaticCell<SharedBridge> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("vcpbridge firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load configuration from flash (or use embedded defaults)
    let mut flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let config = ConfigPersistence::new(&mut flash).load_or_default().await;

    let session = match config.bridge_config() {
        Ok(session) => session,
        Err(e) => {
            warn!("Configured bridge settings rejected ({:?}), using defaults", e);
            BridgeConfig::default()
        }
    };

    // Serial console on UART0 TX until the bridge takes the channel
    let mut console = UartConsole::new();
    console.enable();
    let _ = writeln!(console, "\r\nvcpbridge {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(
        console,
        "UART{} {} baud, pins TX {} RX {}\r",
        session.channel().index(),
        session.baudrate(),
        session.tx_pin(),
        session.rx_pin()
    );

    // UART0 on GPIO0/1, UART1 on GPIO4/5
    let uart = Rp2040Uart::new(
        p.UART0, p.PIN_0, p.PIN_1, p.UART1, p.PIN_4, p.PIN_5, Irqs,
    );

    let ring = RX_RING.init(ByteRing::new());
    let bridge: &'static SharedBridge = BRIDGE.init(Mutex::new(UartBridge::new(
        uart, console, ring, &SHARED, &REGISTRY, relay_irq,
    )));
    info!("Bridge initialized");

    // USB CDC-ACM port
    let (usb_device, cdc) = usb::init(p.USB);
    info!("USB initialized");

    // Keypad, active-low with pull-ups on GPIO16-21
    let keys = [
        (Input::new(p.PIN_16, Pull::Up), InputKey::Up),
        (Input::new(p.PIN_17, Pull::Up), InputKey::Down),
        (Input::new(p.PIN_18, Pull::Up), InputKey::Left),
        (Input::new(p.PIN_19, Pull::Up), InputKey::Right),
        (Input::new(p.PIN_20, Pull::Up), InputKey::Ok),
        (Input::new(p.PIN_21, Pull::Up), InputKey::Back),
    ];

    let store = CommandStore::new(flash, &COMMAND_FILES);

    // Spawn tasks
    spawner.spawn(tasks::usb_device_task(usb_device)).unwrap();
    spawner.spawn(tasks::cdc_task(cdc)).unwrap();
    for (btn, key) in keys {
        spawner.spawn(tasks::button_task(btn, key)).unwrap();
    }
    spawner.spawn(tasks::bridge_worker_task(bridge)).unwrap();
    spawner
        .spawn(tasks::ui_task(bridge, store, config, session))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
