//! USB-UART status view
//!
//! Layout (8x21 characters):
//!
//! ```text
//! USB Serial      COM:0
//! ---------------------
//! TX Pin 13 ^   1234 B.
//! Ok to start
//! RX Pin 14 .  56789 B.
//! Lost:           12 B.
//! ---------------------
//! <Config  Baud: 115200
//! ```

use core::fmt::Write;

use heapless::String;

use super::screen::Screen;
use super::{InputEvent, InputKey, InputType, ViewEvent, ViewListener};
use crate::config::{BridgeConfig, CommandSlot};
use crate::status::StatusSnapshot;

/// Counters at or above this are shown in KB
pub const KB_THRESHOLD: u32 = 100_000_000;

const RULE: &str = "---------------------";

/// Everything the status view draws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbUartModel {
    pub running: bool,
    /// 0 when unknown
    pub baudrate: u32,
    pub tx_cnt: u32,
    pub rx_cnt: u32,
    pub rx_dropped: u32,
    pub vcp_port: u8,
    pub tx_pin: u8,
    pub rx_pin: u8,
    pub tx_active: bool,
    pub rx_active: bool,
}

/// Format a byte counter with its unit
///
/// Below [`KB_THRESHOLD`] the count is in bytes (`"B."`), above it in
/// kibibytes (`"KB."`).
pub fn format_count(count: u32) -> String<16> {
    let mut out = String::new();
    if count < KB_THRESHOLD {
        let _ = write!(out, "{} B.", count);
    } else {
        let _ = write!(out, "{} KB.", count / 1024);
    }
    out
}

/// The USB-UART status view
#[derive(Debug, Default)]
pub struct UsbUartView {
    model: UsbUartModel,
    last: StatusSnapshot,
}

impl UsbUartView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &UsbUartModel {
        &self.model
    }

    /// Snapshot the model was last updated from
    ///
    /// Pass it as `prev` to the next [`StatusModel`](crate::StatusModel)
    /// snapshot so activity flags cover one polling interval.
    pub fn last_snapshot(&self) -> &StatusSnapshot {
        &self.last
    }

    /// Refresh the model from config and a status snapshot
    pub fn update_state(&mut self, config: &BridgeConfig, snapshot: StatusSnapshot) {
        self.model = UsbUartModel {
            running: snapshot.running,
            baudrate: snapshot.baudrate,
            tx_cnt: snapshot.tx_cnt,
            rx_cnt: snapshot.rx_cnt,
            rx_dropped: snapshot.rx_dropped,
            vcp_port: config.vcp_channel(),
            tx_pin: config.tx_pin(),
            rx_pin: config.rx_pin(),
            tx_active: snapshot.tx_active,
            rx_active: snapshot.rx_active,
        };
        self.last = snapshot;
    }

    /// Handle a key; returns true if the view consumed it
    pub fn handle_input<L: ViewListener>(&mut self, event: InputEvent, listener: &mut L) -> bool {
        if event.kind != InputType::Short {
            return false;
        }
        let view_event = match event.key {
            InputKey::Left => ViewEvent::Config,
            InputKey::Right => ViewEvent::InjectCommand(CommandSlot::Right),
            InputKey::Up => ViewEvent::InjectCommand(CommandSlot::Up),
            InputKey::Down => ViewEvent::InjectCommand(CommandSlot::Down),
            InputKey::Ok => ViewEvent::ToggleBridge,
            InputKey::Back => ViewEvent::Exit,
        };
        listener.on_view_event(view_event);
        true
    }

    /// Draw the model
    pub fn render(&self, screen: &mut Screen) {
        let m = &self.model;
        let mut buf: String<24> = String::new();

        let _ = write!(buf, "COM:{}", m.vcp_port);
        screen.set_split(0, "USB Serial", &buf);
        screen.set_line(1, RULE);

        buf.clear();
        let _ = write!(buf, "TX Pin {} {}", m.tx_pin, if m.tx_active { '^' } else { '.' });
        screen.set_split(2, &buf, &format_count(m.tx_cnt));
        screen.set_line(3, if m.running { "" } else { "Ok to start" });

        buf.clear();
        let _ = write!(buf, "RX Pin {} {}", m.rx_pin, if m.rx_active { 'v' } else { '.' });
        screen.set_split(4, &buf, &format_count(m.rx_cnt));

        if m.rx_dropped > 0 {
            screen.set_split(5, "Lost:", &format_count(m.rx_dropped));
        } else {
            screen.set_line(5, "");
        }
        screen.set_line(6, RULE);

        buf.clear();
        if m.baudrate == 0 {
            let _ = buf.push_str("Baud: ????");
        } else {
            let _ = write!(buf, "Baud: {}", m.baudrate);
        }
        screen.set_split(7, "<Config", &buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: heapless::Vec<ViewEvent, 8>,
    }

    impl ViewListener for Recorder {
        fn on_view_event(&mut self, event: ViewEvent) {
            let _ = self.events.push(event);
        }
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0).as_str(), "0 B.");
        assert_eq!(format_count(99_999_999).as_str(), "99999999 B.");
        assert_eq!(format_count(KB_THRESHOLD).as_str(), "97656 KB.");
    }

    #[test]
    fn test_update_state_derives_pins() {
        let mut view = UsbUartView::new();
        let config = BridgeConfig::new(1, 9600, 2).unwrap();
        let snapshot = StatusSnapshot {
            running: true,
            baudrate: 9600,
            tx_cnt: 5,
            tx_active: true,
            ..StatusSnapshot::default()
        };
        view.update_state(&config, snapshot);

        let m = view.model();
        assert_eq!((m.tx_pin, m.rx_pin, m.vcp_port), (15, 16, 2));
        assert!(m.tx_active);
        assert!(!m.rx_active);
        assert_eq!(view.last_snapshot(), &snapshot);
    }

    #[test]
    fn test_key_dispatch() {
        let mut view = UsbUartView::new();
        let mut rec = Recorder::default();

        assert!(view.handle_input(InputEvent::short(InputKey::Left), &mut rec));
        assert!(view.handle_input(InputEvent::short(InputKey::Right), &mut rec));
        assert!(view.handle_input(InputEvent::short(InputKey::Ok), &mut rec));
        assert!(!view.handle_input(InputEvent::long(InputKey::Ok), &mut rec));

        assert_eq!(
            rec.events.as_slice(),
            &[
                ViewEvent::Config,
                ViewEvent::InjectCommand(CommandSlot::Right),
                ViewEvent::ToggleBridge,
            ]
        );
    }

    #[test]
    fn test_render_unknown_baud() {
        let view = UsbUartView::new();
        let mut screen = Screen::new();
        view.render(&mut screen);
        assert!(screen.get_line(7).ends_with("Baud: ????"));
        assert!(screen.get_line(7).starts_with("<Config"));
        assert!(screen.get_line(0).starts_with("USB Serial"));
        assert_eq!(screen.get_line(3), "Ok to start");
    }

    #[test]
    fn test_render_counters() {
        let mut view = UsbUartView::new();
        let config = BridgeConfig::new(0, 115200, 0).unwrap();
        view.update_state(
            &config,
            StatusSnapshot {
                running: true,
                baudrate: 115200,
                tx_cnt: 42,
                rx_cnt: 7,
                rx_active: true,
                ..StatusSnapshot::default()
            },
        );
        let mut screen = Screen::new();
        view.render(&mut screen);

        assert_eq!(screen.get_line(2), "TX Pin 13 .     42 B.");
        assert_eq!(screen.get_line(4), "RX Pin 14 v      7 B.");
        assert_eq!(screen.get_line(5), "");
        assert!(screen.get_line(7).ends_with("Baud: 115200"));
    }
}
