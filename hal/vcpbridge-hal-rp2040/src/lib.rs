//! RP2040-specific HAL for the vcpbridge firmware
//!
//! Implements the `vcpbridge-hal` traits on the RP2040:
//!
//! - Register-level interrupt UART with per-channel receive callbacks
//! - Interrupt handlers to bind with `bind_interrupts!`
//! - Serial console on UART0 TX that the bridge can displace
//! - Flash storage driver (implements `vcpbridge_hal::FlashStorage`)

#![no_std]

pub mod console;
pub mod flash;
pub mod uart;

pub use console::UartConsole;
pub use flash::Rp2040FlashStorage;
pub use uart::{Rp2040Uart, Uart0IrqHandler, Uart1IrqHandler, UartError};
