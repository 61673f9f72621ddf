//! Configuration loading and persistence

mod loader;

pub use loader::{ConfigError, ConfigPersistence};
