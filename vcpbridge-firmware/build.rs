//! Build script for vcpbridge-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bridge.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `MAX_BAUDRATE` in vcpbridge-core
const MAX_BAUDRATE: i64 = 3_000_000;

/// Must match `MAX_PATH_LEN` in vcpbridge-hal
const MAX_PATH_LEN: usize = 64;

/// Keys the firmware's parser accepts, per section ("" is the root table)
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("", &["version"]),
    ("uart", &["channel", "baudrate"]),
    ("usb", &["vcp_channel"]),
    ("bridge", &["autostart"]),
    ("commands", &["right", "up", "down"]),
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=commands");
}

/// Validate bridge.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds bridge.toml as its default configuration.   ║\n\
            ║  Please create one in the vcpbridge-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in bridge.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_keys(&config, &mut errors);
    validate_uart(&config, &mut errors);
    validate_usb_and_bridge(&config, &mut errors);
    validate_commands(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid bridge configuration                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=bridge.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reject sections and keys the firmware's line parser does not know
fn validate_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    let root_keys = KNOWN_KEYS[0].1;

    for (name, value) in root {
        match value {
            toml::Value::Table(table) => {
                let Some((_, keys)) = KNOWN_KEYS.iter().find(|(s, _)| *s == name.as_str()) else {
                    errors.push(format!("unknown section [{}]", name));
                    continue;
                };
                for key in table.keys() {
                    if !keys.contains(&key.as_str()) {
                        errors.push(format!("[{}] unknown key '{}'", name, key));
                    }
                }
            }
            _ if root_keys.contains(&name.as_str()) => {}
            _ => errors.push(format!("unknown top-level key '{}'", name)),
        }
    }

    if let Some(version) = config.get("version") {
        if version.as_integer() != Some(1) {
            errors.push("version must be 1".to_string());
        }
    }
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(uart) = config.get("uart") else {
        return;
    };

    match uart.get("channel") {
        None => {}
        Some(toml::Value::Integer(0 | 1)) => {}
        Some(_) => errors.push("[uart] channel must be 0 or 1".to_string()),
    }

    match uart.get("baudrate") {
        None => {}
        Some(toml::Value::Integer(baud)) if (1..=MAX_BAUDRATE).contains(baud) => {}
        Some(_) => errors.push(format!("[uart] baudrate must be 1-{}", MAX_BAUDRATE)),
    }
}

fn validate_usb_and_bridge(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(vcp) = config.get("usb").and_then(|u| u.get("vcp_channel")) {
        match vcp.as_integer() {
            Some(n) if (0..=255).contains(&n) => {}
            _ => errors.push("[usb] vcp_channel must be 0-255".to_string()),
        }
    }

    if let Some(autostart) = config.get("bridge").and_then(|b| b.get("autostart")) {
        if !autostart.is_bool() {
            errors.push("[bridge] autostart must be true or false".to_string());
        }
    }
}

fn validate_commands(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(commands) = config.get("commands").and_then(|c| c.as_table()) else {
        return;
    };

    for (slot, path) in commands {
        let Some(path) = path.as_str() else {
            errors.push(format!("[commands] {} must be a string", slot));
            continue;
        };
        // Empty unbinds the key
        if path.is_empty() {
            continue;
        }
        if !path.starts_with('/') {
            errors.push(format!("[commands] {} must be an absolute path", slot));
        }
        if path.len() > MAX_PATH_LEN {
            errors.push(format!(
                "[commands] {} is longer than {} bytes",
                slot, MAX_PATH_LEN
            ));
        }
        if path.contains('"') {
            errors.push(format!("[commands] {} must not contain quotes", slot));
        }
    }
}
