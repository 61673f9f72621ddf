//! Status view task
//!
//! Polls the bridge status every tick, renders the USB-UART view and
//! turns key presses into bridge commands:
//!
//! - Ok: start or stop the bridge
//! - Right/Up/Down: send the bound command file
//! - Left: next baud rate preset (bridge stopped), saved to flash
//! - Back: stop the bridge and leave the view

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{with_timeout, Duration, Ticker};
use heapless::Vec;

use vcpbridge_core::config::{AppConfig, CommandSlot};
use vcpbridge_core::view::{Screen, UsbUartView, ViewEvent, ViewListener};
use vcpbridge_core::{BridgeConfig, BridgeError, CommandStore, StatusSnapshot};
use vcpbridge_hal_rp2040::Rp2040FlashStorage;

use crate::bridge::{SharedBridge, SHARED};
use crate::channels::INPUT_CHANNEL;
use crate::config::ConfigPersistence;

/// Status poll interval
const UI_TICK_MS: u64 = 100;

/// Longest a status poll may wait for the status lock
const STATUS_TIMEOUT_MS: u64 = 10;

pub type Store = CommandStore<'static, Rp2040FlashStorage<'static>>;

/// View events raised by one key press
#[derive(Default)]
struct PendingEvents(Vec<ViewEvent, 4>);

impl ViewListener for PendingEvents {
    fn on_view_event(&mut self, event: ViewEvent) {
        if self.0.push(event).is_err() {
            warn!("View event dropped: {:?}", event);
        }
    }
}

struct UiState {
    bridge: &'static SharedBridge,
    store: Store,
    config: AppConfig,
    session: BridgeConfig,
    view: UsbUartView,
    screen: Screen,
    active: bool,
}

/// UI task
#[embassy_executor::task]
pub async fn ui_task(
    bridge: &'static SharedBridge,
    store: Store,
    config: AppConfig,
    session: BridgeConfig,
) {
    info!("UI task started");

    let mut ui = UiState {
        bridge,
        store,
        config,
        session,
        view: UsbUartView::new(),
        screen: Screen::new(),
        active: true,
    };

    if ui.config.autostart {
        ui.start().await;
    }

    let mut ticker = Ticker::every(Duration::from_millis(UI_TICK_MS));

    loop {
        match select(ticker.next(), INPUT_CHANNEL.receive()).await {
            Either::First(()) => ui.refresh().await,
            Either::Second(event) => {
                if !ui.active {
                    // Any key brings the view back
                    ui.active = true;
                    continue;
                }
                let mut pending = PendingEvents::default();
                ui.view.handle_input(event, &mut pending);
                for view_event in pending.0 {
                    ui.handle(view_event).await;
                }
                ui.refresh().await;
            }
        }
    }
}

impl UiState {
    async fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ToggleBridge => {
                if self.bridge.lock().await.is_running() {
                    self.stop().await;
                } else {
                    self.start().await;
                }
            }
            ViewEvent::InjectCommand(slot) => self.inject(slot).await,
            ViewEvent::Config => self.next_baudrate().await,
            ViewEvent::Exit => {
                self.stop().await;
                self.active = false;
                info!("Left USB-UART view");
            }
        }
    }

    async fn start(&mut self) {
        match self.bridge.lock().await.start(self.session).await {
            Ok(()) => info!(
                "Bridge running: {:?} at {} baud",
                self.session.channel(),
                self.session.baudrate()
            ),
            Err(BridgeError::HardwareUnavailable) => warn!("UART channel busy, not starting"),
            Err(e) => error!("Bridge start failed: {:?}", e),
        }
    }

    async fn stop(&mut self) {
        self.bridge.lock().await.stop().await;
        info!("Bridge stopped");
    }

    async fn inject(&mut self, slot: CommandSlot) {
        let Some(path) = self.config.commands.get(slot) else {
            debug!("No command bound to {}", slot.key());
            return;
        };
        let result = self
            .bridge
            .lock()
            .await
            .inject_file(&mut self.store, path)
            .await;
        match result {
            Ok(n) => info!("Sent {} ({} bytes)", path, n),
            Err(BridgeError::NotRunning) => info!("Start the bridge to send {}", path),
            Err(e) => warn!("Sending {} failed: {:?}", path, e),
        }
    }

    async fn next_baudrate(&mut self) {
        if self.bridge.lock().await.is_running() {
            info!("Stop the bridge to change settings");
            return;
        }
        let baudrate = self.config.cycle_baudrate();
        match self.config.bridge_config() {
            Ok(session) => self.session = session,
            Err(e) => {
                error!("Baud rate {} rejected: {:?}", baudrate, e);
                return;
            }
        }
        info!("Baud rate set to {}", baudrate);

        if let Err(e) = ConfigPersistence::new(self.store.storage())
            .save(&self.config)
            .await
        {
            warn!("Failed to save configuration: {:?}", e);
        }
    }

    async fn refresh(&mut self) {
        if !self.active {
            return;
        }
        let prev = *self.view.last_snapshot();
        let snapshot = match SHARED.status.try_snapshot(&prev) {
            Ok(snapshot) => snapshot,
            // Counters busy: wait a little, then keep the last status
            Err(e) => match with_timeout(
                Duration::from_millis(STATUS_TIMEOUT_MS),
                SHARED.status.snapshot(&prev),
            )
            .await
            {
                Ok(snapshot) => snapshot,
                Err(_) => {
                    warn!("Status poll skipped: {:?}", e);
                    return;
                }
            },
        };
        log_changes(&prev, &snapshot);

        // Between sessions the view shows the settings the next start will use
        let shown = if snapshot.running {
            snapshot
        } else {
            StatusSnapshot {
                baudrate: self.session.baudrate(),
                ..snapshot
            }
        };
        self.view.update_state(&self.session, shown);
        self.view.render(&mut self.screen);

        if self.screen.is_dirty() {
            for (row, line) in self.screen.rows() {
                debug!("|{}| {}", row, line);
            }
            self.screen.mark_clean();
        }
    }
}

fn log_changes(prev: &StatusSnapshot, now: &StatusSnapshot) {
    if now.rx_dropped > prev.rx_dropped {
        warn!(
            "RX ring overflow: {} bytes lost ({} total)",
            now.rx_dropped - prev.rx_dropped,
            now.rx_dropped
        );
    }
    if prev.running && !now.running {
        info!(
            "Session ended: tx {} bytes, rx {} bytes",
            now.tx_cnt, now.rx_cnt
        );
    }
}
