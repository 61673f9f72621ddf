//! Presentation model for the USB-UART status view
//!
//! The view never calls the bridge. Key presses become [`ViewEvent`]s
//! delivered to an injected [`ViewListener`]; the listener (the firmware's
//! UI task) turns them into bridge commands. Status flows the other way
//! through [`UsbUartView::update_state`].

pub mod screen;
pub mod usb_uart;

pub use screen::{Screen, SCREEN_COLS, SCREEN_ROWS};
pub use usb_uart::{format_count, UsbUartModel, UsbUartView, KB_THRESHOLD};

use crate::config::CommandSlot;

/// Physical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputKey {
    Up,
    Down,
    Left,
    Right,
    Ok,
    Back,
}

/// How a key was actuated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputType {
    Press,
    Release,
    /// Press and release under the long-press threshold
    Short,
    Long,
    Repeat,
}

/// Input event from the key driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvent {
    pub key: InputKey,
    pub kind: InputType,
}

impl InputEvent {
    pub const fn short(key: InputKey) -> Self {
        Self {
            key,
            kind: InputType::Short,
        }
    }

    pub const fn long(key: InputKey) -> Self {
        Self {
            key,
            kind: InputType::Long,
        }
    }
}

/// Notification from the view to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ViewEvent {
    /// Open the bridge configuration screen
    Config,
    /// Send the command file bound to a key
    InjectCommand(CommandSlot),
    /// Start the bridge if stopped, stop it if running
    ToggleBridge,
    /// Leave the view
    Exit,
}

/// Receiver of view notifications
pub trait ViewListener {
    fn on_view_event(&mut self, event: ViewEvent);
}
