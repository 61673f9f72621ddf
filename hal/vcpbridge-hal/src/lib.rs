//! vcpbridge Hardware Abstraction Layer
//!
//! This crate defines the hardware-facing traits the bridge core is written
//! against. Chip-specific HALs (RP2040 today) implement them; host tests
//! implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  vcpbridge-firmware (tasks, USB, UI)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vcpbridge-core (ring, relay, bridge)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vcpbridge-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          ┌─────────────────────┐
//!          │ vcpbridge-hal-rp2040│
//!          └─────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartPort`] - Interrupt-driven UART with per-channel callbacks
//! - [`vcp::VirtualSerial`] - USB virtual COM port byte stream
//! - [`storage::FileStore`], [`storage::FlashStorage`] - Canned command files and config storage
//! - [`console::Console`] - Log console that may share a UART channel

#![no_std]
#![deny(unsafe_code)]

pub mod console;
pub mod storage;
pub mod uart;
pub mod vcp;

// Re-export key traits at crate root for convenience
pub use console::Console;
pub use storage::{FileError, FileStore, FlashStorage, StorageKey};
pub use uart::{IrqCallback, RxBurst, UartFault, UartId, UartIrqEvent, UartPort};
pub use vcp::VirtualSerial;
