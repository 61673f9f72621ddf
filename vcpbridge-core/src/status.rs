//! Status counters and snapshots
//!
//! The worker updates the counters; the status view polls them. Both run
//! at task priority, so an ordinary async mutex guards the state. Every
//! critical section here is plain counter arithmetic.
//!
//! Activity flags are not stored. A snapshot compares its counters with
//! the previous snapshot the caller passes in, so "active" means "moved
//! during the last polling interval", not a hardware line state.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use crate::error::BridgeError;

/// Runtime counters of the current (or last) bridge session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeState {
    /// Active session exists
    pub running: bool,
    /// Baud rate in use, 0 if unknown
    pub baudrate: u32,
    /// Bytes sent to the UART
    pub tx_cnt: u32,
    /// Bytes forwarded to USB
    pub rx_cnt: u32,
    /// Bytes dropped because the receive ring was full
    pub rx_dropped: u32,
}

/// Point-in-time view of the bridge for the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub running: bool,
    pub baudrate: u32,
    pub tx_cnt: u32,
    pub rx_cnt: u32,
    pub rx_dropped: u32,
    /// tx_cnt changed since the previous snapshot
    pub tx_active: bool,
    /// rx_cnt changed since the previous snapshot
    pub rx_active: bool,
}

impl StatusSnapshot {
    fn from_state(state: &BridgeState, prev: &StatusSnapshot) -> Self {
        Self {
            running: state.running,
            baudrate: state.baudrate,
            tx_cnt: state.tx_cnt,
            rx_cnt: state.rx_cnt,
            rx_dropped: state.rx_dropped,
            tx_active: state.tx_cnt != prev.tx_cnt,
            rx_active: state.rx_cnt != prev.rx_cnt,
        }
    }
}

/// Shared status model
///
/// Injected transmissions are counted separately and folded into `tx_cnt`
/// by the next snapshot.
pub struct StatusModel {
    state: Mutex<CriticalSectionRawMutex, BridgeState>,
    injected_tx: Mutex<CriticalSectionRawMutex, u32>,
}

impl Default for StatusModel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusModel {
    /// Create a model with zeroed counters
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState {
                running: false,
                baudrate: 0,
                tx_cnt: 0,
                rx_cnt: 0,
                rx_dropped: 0,
            }),
            injected_tx: Mutex::new(0),
        }
    }

    /// Reset counters for a new session
    pub async fn begin_session(&self, baudrate: u32) {
        {
            let mut state = self.state.lock().await;
            *state = BridgeState {
                running: true,
                baudrate,
                ..BridgeState::default()
            };
        }
        *self.injected_tx.lock().await = 0;
    }

    /// Mark the session over; counters keep their last values
    pub async fn end_session(&self) {
        self.state.lock().await.running = false;
    }

    /// Count bytes written to the UART by the live path
    pub async fn record_tx(&self, n: usize) {
        let mut state = self.state.lock().await;
        state.tx_cnt = state.tx_cnt.wrapping_add(n as u32);
    }

    /// Count bytes forwarded to USB and bytes lost to ring overflow
    pub async fn record_rx(&self, forwarded: usize, dropped: u32) {
        let mut state = self.state.lock().await;
        state.rx_cnt = state.rx_cnt.wrapping_add(forwarded as u32);
        state.rx_dropped = state.rx_dropped.wrapping_add(dropped);
    }

    /// Count bytes sent outside the live path (command injection)
    pub async fn record_injected(&self, n: usize) {
        let mut injected = self.injected_tx.lock().await;
        *injected = injected.wrapping_add(n as u32);
    }

    /// Take a snapshot, waiting for the lock
    pub async fn snapshot(&self, prev: &StatusSnapshot) -> StatusSnapshot {
        let mut state = self.state.lock().await;
        let mut injected = self.injected_tx.lock().await;
        Self::merge_injected(&mut state, &mut injected);
        StatusSnapshot::from_state(&state, prev)
    }

    /// Take a snapshot without waiting
    ///
    /// Fails with [`BridgeError::MutexTimeout`] if either lock is held.
    pub fn try_snapshot(&self, prev: &StatusSnapshot) -> Result<StatusSnapshot, BridgeError> {
        let mut state = self.state.try_lock().map_err(|_| BridgeError::MutexTimeout)?;
        let mut injected = self
            .injected_tx
            .try_lock()
            .map_err(|_| BridgeError::MutexTimeout)?;
        Self::merge_injected(&mut state, &mut injected);
        Ok(StatusSnapshot::from_state(&state, prev))
    }

    fn merge_injected(state: &mut BridgeState, injected: &mut u32) {
        state.tx_cnt = state.tx_cnt.wrapping_add(*injected);
        *injected = 0;
    }
}
