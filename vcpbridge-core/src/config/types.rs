//! Configuration type definitions

use heapless::String;
use vcpbridge_hal::storage::MAX_PATH_LEN;
use vcpbridge_hal::UartId;

use crate::error::BridgeError;

/// Default UART baud rate
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// Highest baud rate the bridge will configure
pub const MAX_BAUDRATE: u32 = 3_000_000;

/// Baud rates offered by the Config key, in cycling order
pub const BAUD_PRESETS: [u32; 8] = [
    9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// Canned command file bound to the Right key by default
pub const DEFAULT_RIGHT_COMMAND: &str = "/any/uart/Right.txt";

/// A UART channel and the header pins it is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelProfile {
    pub channel: UartId,
    /// Header pin number of TX
    pub tx_pin: u8,
    /// Header pin number of RX
    pub rx_pin: u8,
}

/// The two supported channel profiles
pub const CHANNEL_PROFILES: [ChannelProfile; 2] = [
    ChannelProfile {
        channel: UartId::Uart0,
        tx_pin: 13,
        rx_pin: 14,
    },
    ChannelProfile {
        channel: UartId::Uart1,
        tx_pin: 15,
        rx_pin: 16,
    },
];

impl ChannelProfile {
    /// Profile for a channel
    pub fn for_channel(channel: UartId) -> Self {
        CHANNEL_PROFILES[channel.index()]
    }
}

/// Immutable configuration of one bridge session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    profile: ChannelProfile,
    baudrate: u32,
    vcp_channel: u8,
}

impl BridgeConfig {
    /// Build a session config from raw ids
    ///
    /// Fails with [`BridgeError::InvalidChannel`] for a channel outside the
    /// two profiles, and [`BridgeError::InvalidBaudrate`] for a zero or
    /// out-of-range baud rate.
    pub fn new(channel: u8, baudrate: u32, vcp_channel: u8) -> Result<Self, BridgeError> {
        let channel = UartId::from_index(channel).ok_or(BridgeError::InvalidChannel)?;
        if baudrate == 0 || baudrate > MAX_BAUDRATE {
            return Err(BridgeError::InvalidBaudrate);
        }
        Ok(Self {
            profile: ChannelProfile::for_channel(channel),
            baudrate,
            vcp_channel,
        })
    }

    pub fn channel(&self) -> UartId {
        self.profile.channel
    }

    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    /// USB virtual COM port index
    pub fn vcp_channel(&self) -> u8 {
        self.vcp_channel
    }

    pub fn tx_pin(&self) -> u8 {
        self.profile.tx_pin
    }

    pub fn rx_pin(&self) -> u8 {
        self.profile.rx_pin
    }
}

impl Default for BridgeConfig {
    /// UART0 at the default baud rate on the first COM port
    fn default() -> Self {
        Self {
            profile: ChannelProfile::for_channel(UartId::Uart0),
            baudrate: DEFAULT_BAUDRATE,
            vcp_channel: 0,
        }
    }
}

/// Keys that can carry a canned command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandSlot {
    Right,
    Up,
    Down,
}

impl CommandSlot {
    pub const ALL: [CommandSlot; 3] = [CommandSlot::Right, CommandSlot::Up, CommandSlot::Down];

    fn index(self) -> usize {
        match self {
            CommandSlot::Right => 0,
            CommandSlot::Up => 1,
            CommandSlot::Down => 2,
        }
    }

    /// Config key naming this slot in `[commands]`
    pub fn key(self) -> &'static str {
        match self {
            CommandSlot::Right => "right",
            CommandSlot::Up => "up",
            CommandSlot::Down => "down",
        }
    }
}

/// Command file path
pub type CommandPath = String<MAX_PATH_LEN>;

/// Command files bound to keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBindings {
    paths: [Option<CommandPath>; 3],
}

impl CommandBindings {
    /// Path bound to a slot
    pub fn get(&self, slot: CommandSlot) -> Option<&str> {
        self.paths[slot.index()].as_deref()
    }

    /// Bind a path to a slot
    ///
    /// Fails if the path is longer than the store accepts.
    pub fn set(&mut self, slot: CommandSlot, path: &str) -> Result<(), BridgeError> {
        let mut owned = CommandPath::new();
        owned
            .push_str(path)
            .map_err(|_| BridgeError::File(vcpbridge_hal::FileError::InvalidPath))?;
        self.paths[slot.index()] = Some(owned);
        Ok(())
    }

    /// Remove the binding of a slot
    pub fn clear(&mut self, slot: CommandSlot) {
        self.paths[slot.index()] = None;
    }

    /// Number of bound slots
    pub fn len(&self) -> usize {
        self.paths.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete application configuration (`bridge.toml`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Config format version
    pub version: u8,
    pub uart_channel: u8,
    pub baudrate: u32,
    pub vcp_channel: u8,
    /// Start the bridge at boot instead of waiting for Ok
    pub autostart: bool,
    pub commands: CommandBindings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut commands = CommandBindings::default();
        // Default path is shorter than MAX_PATH_LEN
        let _ = commands.set(CommandSlot::Right, DEFAULT_RIGHT_COMMAND);
        Self {
            version: 1,
            uart_channel: 0,
            baudrate: DEFAULT_BAUDRATE,
            vcp_channel: 0,
            autostart: false,
            commands,
        }
    }
}

impl AppConfig {
    /// Session config for the bridge
    pub fn bridge_config(&self) -> Result<BridgeConfig, BridgeError> {
        BridgeConfig::new(self.uart_channel, self.baudrate, self.vcp_channel)
    }

    /// Switch to the next baud preset and return it
    ///
    /// A rate that is not a preset moves to the first preset above it.
    pub fn cycle_baudrate(&mut self) -> u32 {
        self.baudrate = BAUD_PRESETS
            .iter()
            .copied()
            .find(|&b| b > self.baudrate)
            .unwrap_or(BAUD_PRESETS[0]);
        self.baudrate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pins_follow_channel() {
        let cfg = BridgeConfig::new(0, 115200, 1).unwrap();
        assert_eq!(cfg.channel(), UartId::Uart0);
        assert_eq!((cfg.tx_pin(), cfg.rx_pin()), (13, 14));
        assert_eq!(cfg.vcp_channel(), 1);

        let cfg = BridgeConfig::new(1, 9600, 0).unwrap();
        assert_eq!(cfg.channel(), UartId::Uart1);
        assert_eq!((cfg.tx_pin(), cfg.rx_pin()), (15, 16));
    }

    #[test]
    fn test_invalid_config() {
        assert_eq!(
            BridgeConfig::new(2, 115200, 0),
            Err(BridgeError::InvalidChannel)
        );
        assert_eq!(BridgeConfig::new(0, 0, 0), Err(BridgeError::InvalidBaudrate));
        assert_eq!(
            BridgeConfig::new(0, MAX_BAUDRATE + 1, 0),
            Err(BridgeError::InvalidBaudrate)
        );
    }

    #[test]
    fn test_default_bridge_config() {
        let cfg = BridgeConfig::default();
        assert_eq!(Ok(cfg), AppConfig::default().bridge_config());
        assert_eq!((cfg.tx_pin(), cfg.rx_pin()), (13, 14));
    }

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.commands.get(CommandSlot::Right), Some(DEFAULT_RIGHT_COMMAND));
        assert_eq!(config.commands.get(CommandSlot::Up), None);
        assert_eq!(config.commands.len(), 1);
        assert!(config.bridge_config().is_ok());
    }

    #[test]
    fn test_cycle_baudrate() {
        let mut config = AppConfig::default();
        assert_eq!(config.cycle_baudrate(), 230400);
        config.baudrate = 921600;
        assert_eq!(config.cycle_baudrate(), 9600);
        config.baudrate = 100_000;
        assert_eq!(config.cycle_baudrate(), 115200);
    }

    #[test]
    fn test_path_too_long() {
        let mut bindings = CommandBindings::default();
        let long = [b'a'; MAX_PATH_LEN + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert!(bindings.set(CommandSlot::Up, long).is_err());
        assert!(bindings.is_empty());
    }
}
