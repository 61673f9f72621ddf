//! Board-agnostic core logic for the vcpbridge firmware
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Receive ring buffer shared between the UART interrupt and the worker
//! - Interrupt relay that feeds the ring without blocking
//! - Bridge lifecycle (start/stop), transmit and drain paths
//! - Status counters and snapshots for the status view
//! - Configuration types and the `bridge.toml` parser
//! - Canned command files with embedded fallbacks
//! - Presentation model for the USB-UART status view

#![no_std]
#![deny(unsafe_code)]

pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod files;
pub mod relay;
pub mod ring;
pub mod status;
pub mod view;

pub use bridge::{BridgeShared, RunState, UartBridge};
pub use channel::{ChannelLease, ChannelRegistry};
pub use config::{AppConfig, BridgeConfig, ChannelProfile, CommandSlot};
pub use error::BridgeError;
pub use files::{CommandFile, CommandStore};
pub use relay::{RelaySlot, RxNotify, RxRelay};
pub use ring::{ByteRing, RingReader, RingWriter};
pub use status::{BridgeState, StatusModel, StatusSnapshot};
