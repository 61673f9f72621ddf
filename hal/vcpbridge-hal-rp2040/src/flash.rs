//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage
//! in the last 64KB of flash.
//!
//! Implements the `FlashStorage` trait from `vcpbridge-hal`.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use vcpbridge_hal::{FileError, StorageKey};

pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB on the Pico
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024;
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Flash range for the config partition
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Largest value stored under one key
pub const MAX_ITEM_SIZE: usize = 2048;

/// RP2040 flash storage
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    async fn fetch<'b>(
        &mut self,
        key: StorageKey,
        scratch: &'b mut [u8; MAX_ITEM_SIZE],
    ) -> Result<Option<&'b [u8]>, FileError> {
        map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            scratch,
            &key,
        )
        .await
        .map_err(|_| FileError::Storage)
    }
}

impl vcpbridge_hal::FlashStorage for Rp2040FlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FileError> {
        let mut scratch = [0u8; MAX_ITEM_SIZE];
        let data = self.fetch(key, &mut scratch).await?.ok_or(FileError::NotFound)?;

        let dst = buffer
            .get_mut(..data.len())
            .ok_or(FileError::BufferTooSmall)?;
        dst.copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FileError> {
        let mut scratch = [0u8; MAX_ITEM_SIZE];

        map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut scratch,
            &key,
            &data,
        )
        .await
        .map_err(|_| FileError::Storage)
    }

    async fn exists(&mut self, key: StorageKey) -> bool {
        let mut scratch = [0u8; MAX_ITEM_SIZE];
        matches!(self.fetch(key, &mut scratch).await, Ok(Some(_)))
    }
}
