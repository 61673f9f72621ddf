//! Configuration persistence
//!
//! Loads `bridge.toml` from flash storage and writes it back when the
//! user changes a setting. Falls back to the embedded default if flash
//! holds no usable copy.

use core::str;
use defmt::*;

use heapless::String;
use vcpbridge_core::config::{parse_config, write_config, AppConfig, CommandSlot, ParseError};
use vcpbridge_hal::{FileError, FlashStorage, StorageKey};

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 1024;

/// Embedded default configuration (compiled into firmware)
/// Edit bridge.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../bridge.toml");

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FileError),
    /// TOML parsing failed
    TomlParse(ParseError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config does not fit the TOML buffer
    TooLarge,
}

impl From<FileError> for ConfigError {
    fn from(e: FileError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::TomlParse(e)
    }
}

/// Configuration persistence manager
pub struct ConfigPersistence<'a, F: FlashStorage> {
    storage: &'a mut F,
}

impl<'a, F: FlashStorage> ConfigPersistence<'a, F> {
    pub fn new(storage: &'a mut F) -> Self {
        Self { storage }
    }

    /// Load the config saved in flash
    pub async fn load(&mut self) -> Result<AppConfig, ConfigError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::BridgeConfigToml, &mut buffer)
            .await?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
        Ok(parse_config(toml_str)?)
    }

    /// Save a config to flash
    pub async fn save(&mut self, config: &AppConfig) -> Result<(), ConfigError> {
        let mut text: String<MAX_TOML_SIZE> = String::new();
        write_config(config, &mut text).map_err(|_| ConfigError::TooLarge)?;

        self.storage
            .write(StorageKey::BridgeConfigToml, text.as_bytes())
            .await?;
        info!("Configuration saved ({} bytes)", text.len());
        Ok(())
    }

    /// Load from flash, or fall back to the embedded default
    pub async fn load_or_default(&mut self) -> AppConfig {
        let config = match self.load().await {
            Ok(config) => {
                info!("Loaded configuration from flash");
                config
            }
            Err(ConfigError::Flash(FileError::NotFound)) => {
                info!("No configuration in flash, using embedded defaults");
                embedded_config()
            }
            Err(e) => {
                warn!("Flash configuration unusable ({:?}), using embedded defaults", e);
                embedded_config()
            }
        };
        log_config_summary(&config);
        config
    }
}

/// Parse the embedded bridge.toml
///
/// build.rs validates the file, so failure here means the runtime parser
/// and the build-time check disagree.
fn embedded_config() -> AppConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            AppConfig::default()
        }
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &AppConfig) {
    info!(
        "Config: UART{} at {} baud, COM{}, autostart={}",
        config.uart_channel, config.baudrate, config.vcp_channel, config.autostart
    );
    for slot in CommandSlot::ALL {
        if let Some(path) = config.commands.get(slot) {
            debug!("  {} -> {}", slot.key(), path);
        }
    }
}
