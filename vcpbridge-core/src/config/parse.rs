//! Minimal `bridge.toml` parser
//!
//! Handles only the subset of TOML the bridge configuration uses. It does
//! NOT support the full TOML spec.
//!
//! Supported features:
//! - `[section]` headers
//! - `key = value` pairs (string, integer, boolean)
//! - Comments (`# ...`), including trailing comments after values
//!
//! Unknown sections and keys are skipped, so a config saved by another
//! firmware build still loads.
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings, escapes inside strings
//! - Dotted keys

use super::types::{AppConfig, CommandSlot};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed section header
    InvalidSection,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Command path too long
    PathTooLong,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Uart,
    Usb,
    Bridge,
    Commands,
    /// Section this firmware does not know; its keys are skipped
    Unknown,
}

/// Parse TOML text into an [`AppConfig`]
///
/// Missing keys keep their defaults. The result is validated: a config
/// that parses but names an unsupported channel or baud rate is rejected.
pub fn parse_config(input: &str) -> Result<AppConfig, ParseError> {
    let mut config = AppConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(line[1..line.len() - 1].trim());
            continue;
        }

        let (key, value) = line.split_once('=').ok_or(ParseError::InvalidLine)?;
        apply_key(&mut config, section, key.trim(), value.trim())?;
    }

    config
        .bridge_config()
        .map_err(|_| ParseError::InvalidValue)?;

    Ok(config)
}

fn parse_section_header(name: &str) -> Section {
    match name {
        "uart" => Section::Uart,
        "usb" => Section::Usb,
        "bridge" => Section::Bridge,
        "commands" => Section::Commands,
        _ => {
            #[cfg(feature = "defmt")]
            defmt::debug!("Skipping unknown section [{}]", name);
            Section::Unknown
        }
    }
}

fn apply_key(
    config: &mut AppConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Root, "version") => config.version = parse_int(value)?,
        (Section::Uart, "channel") => config.uart_channel = parse_int(value)?,
        (Section::Uart, "baudrate") => config.baudrate = parse_int(value)?,
        (Section::Usb, "vcp_channel") => config.vcp_channel = parse_int(value)?,
        (Section::Bridge, "autostart") => config.autostart = parse_bool(value)?,
        (Section::Commands, name) => {
            let Some(slot) = CommandSlot::ALL.into_iter().find(|slot| slot.key() == name) else {
                skip_key(name);
                return Ok(());
            };
            let path = parse_string(value)?;
            if path.is_empty() {
                config.commands.clear(slot);
            } else {
                config
                    .commands
                    .set(slot, path)
                    .map_err(|_| ParseError::PathTooLong)?;
            }
        }
        (_, name) => skip_key(name),
    }
    Ok(())
}

fn skip_key(_name: &str) {
    #[cfg(feature = "defmt")]
    defmt::debug!("Skipping unknown key {}", _name);
}

/// Remove a trailing `# comment`, ignoring `#` inside quotes
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    // TOML allows underscores as digit separators
    let mut digits: heapless::String<16> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_string(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::DEFAULT_RIGHT_COMMAND;

    const SAMPLE: &str = r#"
# Bridge configuration
version = 1

[uart]
channel = 1
baudrate = 921_600   # ESP8266 flashing speed

[usb]
vcp_channel = 1

[bridge]
autostart = true

[commands]
right = "/any/uart/at.txt"
up = "/any/uart/#reset.txt"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.uart_channel, 1);
        assert_eq!(config.baudrate, 921_600);
        assert_eq!(config.vcp_channel, 1);
        assert!(config.autostart);
        assert_eq!(
            config.commands.get(CommandSlot::Right),
            Some("/any/uart/at.txt")
        );
        assert_eq!(
            config.commands.get(CommandSlot::Up),
            Some("/any/uart/#reset.txt")
        );
        assert_eq!(config.commands.get(CommandSlot::Down), None);
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.commands.get(CommandSlot::Right),
            Some(DEFAULT_RIGHT_COMMAND)
        );
    }

    #[test]
    fn test_empty_path_unbinds() {
        let config = parse_config("[commands]\nright = \"\"\n").unwrap();
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_config("[uart"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[uart]\nbaud"), Err(ParseError::InvalidLine));
        assert_eq!(parse_config("[uart]\nbaudrate = fast"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[bridge]\nautostart = 1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[commands]\nright = x"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let config = parse_config("[uart]\nbaudrate = 9600\nparity = 1\n").unwrap();
        assert_eq!(config.baudrate, 9600);

        let config = parse_config("[commands]\nleft = \"x\"\ndown = \"/any/uart/d.txt\"").unwrap();
        assert_eq!(config.commands.get(CommandSlot::Down), Some("/any/uart/d.txt"));
        assert_eq!(config.commands.len(), 2);

        let config = parse_config("stray = true\n[uart]\nchannel = 1").unwrap();
        assert_eq!(config.uart_channel, 1);
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let config =
            parse_config("[uart]\nbaudrate = 9600\n[display]\ncontrast = 3\n").unwrap();
        assert_eq!(config.baudrate, 9600);

        // Keys after the unknown section land in their own section again
        let config = parse_config("[serial]\nchannel = 3\n[uart]\nchannel = 1").unwrap();
        assert_eq!(config.uart_channel, 1);
    }

    #[test]
    fn test_semantic_validation() {
        assert_eq!(parse_config("[uart]\nchannel = 3"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[uart]\nbaudrate = 0"), Err(ParseError::InvalidValue));
    }
}
