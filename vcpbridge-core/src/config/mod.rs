//! Configuration types and parsing
//!
//! The firmware embeds a default `bridge.toml` and may override it from
//! flash. Both go through [`parse_config`]; [`write_config`] produces the
//! text stored back to flash.

pub mod parse;
pub mod types;
pub mod write;

pub use parse::{parse_config, ParseError};
pub use types::*;
pub use write::write_config;
