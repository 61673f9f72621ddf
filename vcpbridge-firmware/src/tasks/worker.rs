//! Bridge worker task
//!
//! Moves received UART bytes to the USB host and host bytes to the UART.
//! Waits on the receive signal (or host data) with a bounded timeout, then
//! takes the bridge lock for one step. The lock is never held while
//! waiting, so start/stop from the UI go through within one step.

use defmt::*;
use embassy_futures::select::select;
use embassy_time::{with_timeout, Duration};

use crate::bridge::{SharedBridge, SHARED};
use crate::channels::{FROM_HOST, HOST_DATA};
use crate::usb::PipeVcp;

/// Longest the worker sleeps without a wake-up
const WORKER_TIMEOUT_MS: u64 = 10;

/// Bridge worker task
#[embassy_executor::task]
pub async fn bridge_worker_task(bridge: &'static SharedBridge) {
    info!("Bridge worker started");

    let mut usb = PipeVcp;

    loop {
        let _ = with_timeout(
            Duration::from_millis(WORKER_TIMEOUT_MS),
            select(SHARED.notify.wait(), HOST_DATA.wait()),
        )
        .await;

        let mut bridge = bridge.lock().await;
        if !bridge.is_running() {
            // Host bytes typed while stopped go nowhere
            usb.discard_input();
            continue;
        }

        match bridge.drain_to_usb(&mut usb).await {
            Ok(n) if n > 0 => trace!("UART -> USB {} bytes", n),
            Ok(_) => {}
            Err(e) if e.is_fatal() => {
                error!("{:?}, bridge stopped", e);
                continue;
            }
            Err(e) => {
                warn!("Drain failed: {:?}", e);
                continue;
            }
        }

        match bridge.forward_from_usb(&mut usb).await {
            Ok(n) if n > 0 => trace!("USB -> UART {} bytes", n),
            Ok(_) => {}
            Err(e) => warn!("Forward failed: {:?}", e),
        }

        // Signals coalesce; come straight back if the host queued more
        if !FROM_HOST.is_empty() {
            HOST_DATA.signal(());
        }
    }
}
