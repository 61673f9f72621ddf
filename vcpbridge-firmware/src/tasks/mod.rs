//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod input;
pub mod ui;
pub mod usb;
pub mod worker;

pub use input::button_task;
pub use ui::ui_task;
pub use usb::{cdc_task, usb_device_task};
pub use worker::bridge_worker_task;
