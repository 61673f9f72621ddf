//! Text console on a UART TX pin
//!
//! The board's serial console lives on UART0 TX (GPIO0). It shares the
//! peripheral with bridge channel 0, so the bridge switches it off for
//! the length of a session on that channel.

use core::fmt;

use vcpbridge_hal::{Console, UartId};

use crate::uart::{flush, regs, route_pin, set_baudrate, set_line_format, unreset, write_blocking};

/// Default console baud rate
pub const CONSOLE_BAUDRATE: u32 = 115200;

/// TX-only console on a UART channel
///
/// Writes while disabled are discarded.
pub struct UartConsole {
    channel: UartId,
    tx_gpio: usize,
    baudrate: u32,
    enabled: bool,
}

impl UartConsole {
    /// Console on UART0 / GPIO0, initially disabled
    pub const fn new() -> Self {
        Self {
            channel: UartId::Uart0,
            tx_gpio: 0,
            baudrate: CONSOLE_BAUDRATE,
            enabled: false,
        }
    }
}

impl Default for UartConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for UartConsole {
    fn channel(&self) -> UartId {
        self.channel
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        if self.enabled {
            return;
        }
        let r = regs(self.channel);
        unreset(self.channel);
        r.uartcr().write(|_| {});
        if set_baudrate(r, self.baudrate).is_err() {
            return;
        }
        set_line_format(r);
        route_pin(self.tx_gpio, true, false);
        r.uartcr().write(|w| {
            w.set_uarten(true);
            w.set_txe(true);
        });
        self.enabled = true;
    }

    fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        let r = regs(self.channel);
        flush(r);
        r.uartcr().write(|_| {});
        route_pin(self.tx_gpio, false, false);
        self.enabled = false;
    }
}

impl fmt::Write for UartConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.enabled {
            write_blocking(regs(self.channel), s.as_bytes());
        }
        Ok(())
    }
}
