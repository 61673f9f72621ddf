//! Canned command files shipped with the firmware
//!
//! Each file can be replaced by a copy in flash under its storage key.

use vcpbridge_core::CommandFile;
use vcpbridge_hal::StorageKey;

pub static COMMAND_FILES: [CommandFile; 3] = [
    CommandFile {
        path: "/any/uart/Right.txt",
        key: StorageKey::CommandRight,
        default: include_bytes!("../commands/Right.txt"),
    },
    CommandFile {
        path: "/any/uart/Up.txt",
        key: StorageKey::CommandUp,
        default: include_bytes!("../commands/Up.txt"),
    },
    CommandFile {
        path: "/any/uart/Down.txt",
        key: StorageKey::CommandDown,
        default: include_bytes!("../commands/Down.txt"),
    },
];
