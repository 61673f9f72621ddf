//! Persistent storage abstractions
//!
//! Two views over the same flash partition:
//!
//! - [`FlashStorage`]: key-value records (bridge configuration, command files)
//! - [`FileStore`]: path-addressed files used by command injection

use core::future::Future;

/// Longest path a [`FileStore`] accepts
pub const MAX_PATH_LEN: usize = 64;

/// Storage keys for persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Bridge configuration as TOML text
    BridgeConfigToml = 0,
    /// Canned command bound to the Right key
    CommandRight = 1,
    /// Canned command bound to the Up key
    CommandUp = 2,
    /// Canned command bound to the Down key
    CommandDown = 3,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::BridgeConfigToml),
            1 => Some(StorageKey::CommandRight),
            2 => Some(StorageKey::CommandUp),
            3 => Some(StorageKey::CommandDown),
            _ => None,
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileError {
    /// Flash operation failed
    Flash,
    /// Storage layer failed (corrupt map, full partition)
    Storage,
    /// No such key or path
    NotFound,
    /// Path longer than [`MAX_PATH_LEN`] or not valid for this store
    InvalidPath,
    /// Buffer too small for the data
    BufferTooSmall,
}

/// Key-value flash storage
pub trait FlashStorage {
    /// Read a value by key into the provided buffer
    ///
    /// Returns the number of bytes read.
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl Future<Output = Result<usize, FileError>>;

    /// Write a value by key
    fn write(&mut self, key: StorageKey, data: &[u8]) -> impl Future<Output = Result<(), FileError>>;

    /// Check if a key exists in storage
    fn exists(&mut self, key: StorageKey) -> impl Future<Output = bool>;
}

/// Path-addressed file store
///
/// Files are opaque byte sequences. A handle is only valid between `open`
/// and `close`.
pub trait FileStore {
    /// Open file handle
    type File;

    /// Open an existing file for reading
    fn open(&mut self, path: &str) -> impl Future<Output = Result<Self::File, FileError>>;

    /// Read the entire file into `buf`
    ///
    /// Returns the file length. Fails with [`FileError::BufferTooSmall`]
    /// rather than truncating.
    fn read_all(
        &mut self,
        file: &mut Self::File,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<usize, FileError>>;

    /// Release the handle
    fn close(&mut self, file: Self::File);
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        match buffer.first_mut() {
            Some(slot) => {
                *slot = self.as_u8();
                Ok(1)
            }
            None => Err(sequential_storage::map::SerializationError::BufferTooSmall),
        }
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let byte = buffer
            .first()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        StorageKey::from_u8(*byte)
            .map(|key| (key, 1))
            .ok_or(sequential_storage::map::SerializationError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_bytes() {
        for key in [
            StorageKey::BridgeConfigToml,
            StorageKey::CommandRight,
            StorageKey::CommandUp,
            StorageKey::CommandDown,
        ] {
            assert_eq!(StorageKey::from_u8(key.as_u8()), Some(key));
        }
        assert_eq!(StorageKey::from_u8(7), None);
    }
}
