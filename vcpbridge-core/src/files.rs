//! Canned command files
//!
//! Command files are addressed by path. Each known path maps to a flash
//! key and an embedded default; a copy in flash wins over the default.

use vcpbridge_hal::{FileError, FileStore, FlashStorage, StorageKey};

/// A command file the firmware knows about
#[derive(Debug, Clone, Copy)]
pub struct CommandFile {
    pub path: &'static str,
    pub key: StorageKey,
    /// Contents used when flash has no copy (may be empty)
    pub default: &'static [u8],
}

/// Where an open file reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileSource {
    Flash,
    Embedded,
}

/// Handle returned by [`CommandStore::open`]
#[derive(Debug)]
pub struct CommandHandle {
    entry: usize,
    source: FileSource,
}

impl CommandHandle {
    pub fn source(&self) -> FileSource {
        self.source
    }
}

/// [`FileStore`] over flash storage with embedded fallbacks
pub struct CommandStore<'t, F: FlashStorage> {
    flash: F,
    table: &'t [CommandFile],
}

impl<'t, F: FlashStorage> CommandStore<'t, F> {
    pub fn new(flash: F, table: &'t [CommandFile]) -> Self {
        Self { flash, table }
    }

    /// Underlying flash storage (for config writes)
    pub fn storage(&mut self) -> &mut F {
        &mut self.flash
    }
}

impl<'t, F: FlashStorage> FileStore for CommandStore<'t, F> {
    type File = CommandHandle;

    async fn open(&mut self, path: &str) -> Result<Self::File, FileError> {
        let entry = self
            .table
            .iter()
            .position(|f| f.path == path)
            .ok_or(FileError::NotFound)?;
        let file = self.table[entry];

        let source = if self.flash.exists(file.key).await {
            FileSource::Flash
        } else if !file.default.is_empty() {
            FileSource::Embedded
        } else {
            return Err(FileError::NotFound);
        };
        Ok(CommandHandle { entry, source })
    }

    async fn read_all(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FileError> {
        let entry = self.table[file.entry];
        match file.source {
            FileSource::Flash => self.flash.read(entry.key, buf).await,
            FileSource::Embedded => {
                let data = entry.default;
                let dst = buf.get_mut(..data.len()).ok_or(FileError::BufferTooSmall)?;
                dst.copy_from_slice(data);
                Ok(data.len())
            }
        }
    }

    fn close(&mut self, _file: Self::File) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use heapless::Vec;

    #[derive(Default)]
    struct MockFlash {
        slots: [Option<Vec<u8, 32>>; 4],
    }

    impl FlashStorage for MockFlash {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FileError> {
            let data = self.slots[key.as_u8() as usize]
                .as_ref()
                .ok_or(FileError::NotFound)?;
            let dst = buffer
                .get_mut(..data.len())
                .ok_or(FileError::BufferTooSmall)?;
            dst.copy_from_slice(data);
            Ok(data.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FileError> {
            let stored = Vec::from_slice(data).map_err(|_| FileError::Storage)?;
            self.slots[key.as_u8() as usize] = Some(stored);
            Ok(())
        }

        async fn exists(&mut self, key: StorageKey) -> bool {
            self.slots[key.as_u8() as usize].is_some()
        }
    }

    const TABLE: &[CommandFile] = &[
        CommandFile {
            path: "/any/uart/Right.txt",
            key: StorageKey::CommandRight,
            default: b"AT\r\n",
        },
        CommandFile {
            path: "/any/uart/Up.txt",
            key: StorageKey::CommandUp,
            default: b"",
        },
    ];

    #[test]
    fn test_embedded_fallback() {
        let mut store = CommandStore::new(MockFlash::default(), TABLE);
        block_on(async {
            let mut file = store.open("/any/uart/Right.txt").await.unwrap();
            assert_eq!(file.source(), FileSource::Embedded);
            let mut buf = [0u8; 16];
            let n = store.read_all(&mut file, &mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"AT\r\n");
            store.close(file);
        });
    }

    #[test]
    fn test_flash_copy_wins() {
        let mut store = CommandStore::new(MockFlash::default(), TABLE);
        block_on(async {
            store
                .storage()
                .write(StorageKey::CommandRight, b"AT+GMR\r\n")
                .await
                .unwrap();
            let mut file = store.open("/any/uart/Right.txt").await.unwrap();
            assert_eq!(file.source(), FileSource::Flash);
            let mut buf = [0u8; 16];
            let n = store.read_all(&mut file, &mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"AT+GMR\r\n");
        });
    }

    #[test]
    fn test_missing_files() {
        let mut store = CommandStore::new(MockFlash::default(), TABLE);
        block_on(async {
            // Unknown path
            assert!(matches!(
                store.open("/any/uart/Left.txt").await,
                Err(FileError::NotFound)
            ));
            // Known path with neither a flash copy nor a default
            assert!(matches!(
                store.open("/any/uart/Up.txt").await,
                Err(FileError::NotFound)
            ));
        });
    }

    #[test]
    fn test_small_buffer() {
        let mut store = CommandStore::new(MockFlash::default(), TABLE);
        block_on(async {
            let mut file = store.open("/any/uart/Right.txt").await.unwrap();
            let mut buf = [0u8; 2];
            assert_eq!(
                store.read_all(&mut file, &mut buf).await,
                Err(FileError::BufferTooSmall)
            );
        });
    }
}
