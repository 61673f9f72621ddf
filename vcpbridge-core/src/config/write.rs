//! `bridge.toml` writer
//!
//! Emits the subset [`parse_config`](super::parse_config) reads back.

use core::fmt::{self, Write};

use super::types::{AppConfig, CommandSlot};

/// Write a config as TOML text
pub fn write_config<W: Write>(config: &AppConfig, out: &mut W) -> fmt::Result {
    writeln!(out, "version = {}", config.version)?;
    writeln!(out)?;
    writeln!(out, "[uart]")?;
    writeln!(out, "channel = {}", config.uart_channel)?;
    writeln!(out, "baudrate = {}", config.baudrate)?;
    writeln!(out)?;
    writeln!(out, "[usb]")?;
    writeln!(out, "vcp_channel = {}", config.vcp_channel)?;
    writeln!(out)?;
    writeln!(out, "[bridge]")?;
    writeln!(out, "autostart = {}", config.autostart)?;
    writeln!(out)?;
    writeln!(out, "[commands]")?;
    for slot in CommandSlot::ALL {
        // Unbound slots are written empty so they stay unbound on reload
        let path = config.commands.get(slot).unwrap_or("");
        writeln!(out, "{} = \"{}\"", slot.key(), path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use heapless::String;

    #[test]
    fn test_written_config_reads_back() {
        let mut config = AppConfig::default();
        config.uart_channel = 1;
        config.baudrate = 921_600;
        config.autostart = true;
        config.commands.clear(CommandSlot::Right);
        config.commands.set(CommandSlot::Down, "/any/uart/reset.txt").unwrap();

        let mut text: String<512> = String::new();
        write_config(&config, &mut text).unwrap();

        assert!(text.contains("baudrate = 921600"));
        assert!(text.contains("right = \"\""));
        assert_eq!(parse_config(&text), Ok(config));
    }

    #[test]
    fn test_buffer_too_small() {
        let mut text: String<16> = String::new();
        assert!(write_config(&AppConfig::default(), &mut text).is_err());
    }
}
