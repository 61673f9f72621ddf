//! Log console control
//!
//! On some boards the log console is wired to one of the bridge UARTs.
//! The bridge has to switch it off while it owns that channel.

use crate::uart::UartId;

/// A console that can be displaced from its UART
pub trait Console {
    /// UART the console writes to
    fn channel(&self) -> UartId;

    /// Check if console output is currently enabled
    fn is_enabled(&self) -> bool;

    /// Resume console output on its UART
    fn enable(&mut self);

    /// Stop console output and release the UART
    fn disable(&mut self);
}
