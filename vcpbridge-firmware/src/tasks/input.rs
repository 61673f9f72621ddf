//! Button input task
//!
//! One task instance per key. Buttons are active-low with pull-ups.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant, Timer};

use vcpbridge_core::view::{InputEvent, InputKey, InputType};

use crate::channels::INPUT_CHANNEL;

const DEBOUNCE_MS: u64 = 20;
const LONG_PRESS_MS: u64 = 500;
/// Shorter presses are treated as bounce
const MIN_PRESS_MS: u64 = 50;

/// Button task
#[embassy_executor::task(pool_size = 6)]
pub async fn button_task(mut btn: Input<'static>, key: InputKey) {
    debug!("Button task started for {:?}", key);

    loop {
        btn.wait_for_falling_edge().await;
        let press_start = Instant::now();

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if btn.is_high() {
            continue;
        }

        let released = embassy_time::with_timeout(
            Duration::from_millis(LONG_PRESS_MS),
            btn.wait_for_rising_edge(),
        )
        .await;

        let kind = match released {
            Ok(()) if press_start.elapsed().as_millis() > MIN_PRESS_MS => Some(InputType::Short),
            Ok(()) => None,
            Err(_) => {
                // Report the long press now, then wait for the release
                INPUT_CHANNEL.send(InputEvent { key, kind: InputType::Long }).await;
                btn.wait_for_rising_edge().await;
                None
            }
        };

        if let Some(kind) = kind {
            trace!("Key {:?} {:?}", key, kind);
            INPUT_CHANNEL.send(InputEvent { key, kind }).await;
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
    }
}
