//! UART <-> USB bridge
//!
//! The bridge owns the UART driver and the reader half of the receive ring.
//! The writer half moves into an [`RxRelay`] registered with the UART
//! interrupt while the bridge runs, and comes back on stop.
//!
//! ```text
//!  UART IRQ ──► RxRelay ──► ByteRing ──► drain_to_usb ──► VirtualSerial
//!                  │                          ▲
//!                  └──── RxNotify ────────────┘ (wake / fault latch)
//!
//!  VirtualSerial ──► forward_from_usb ─┐
//!  FileStore ──────► inject_file ──────┴──► UartPort::transmit
//! ```
//!
//! Lifecycle is `Stopped -> Running -> Stopped`. A line fault while running
//! stops the bridge from the next worker step.

use heapless::Vec;
use vcpbridge_hal::{Console, FileStore, IrqCallback, UartPort, VirtualSerial};

use crate::channel::{ChannelLease, ChannelRegistry};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::relay::{RelaySlot, RxNotify, RxRelay};
use crate::ring::{ByteRing, RingReader, RingWriter};
use crate::status::StatusModel;

/// Bytes moved per USB write
pub const USB_CHUNK_SIZE: usize = 64;

/// Largest canned command that can be injected
pub const MAX_INJECT_LEN: usize = 512;

/// Most host bytes moved to the UART by one `forward_from_usb` call
pub const MAX_FORWARD_LEN: usize = 4 * USB_CHUNK_SIZE;

/// Bridge lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    Stopped,
    Running,
}

/// State shared between the bridge, the UART interrupt and the status view
///
/// Lives in a `static` on the firmware so the interrupt callback can reach
/// the relay slot.
pub struct BridgeShared<'a, const N: usize> {
    pub status: StatusModel,
    pub notify: RxNotify,
    pub slot: RelaySlot<'a, N>,
}

impl<'a, const N: usize> Default for BridgeShared<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> BridgeShared<'a, N> {
    pub const fn new() -> Self {
        Self {
            status: StatusModel::new(),
            notify: RxNotify::new(),
            slot: RelaySlot::new(),
        }
    }
}

/// Per-session state, dropped on stop
struct Session<'a> {
    config: BridgeConfig,
    // Releases the channel when dropped
    _lease: ChannelLease<'a>,
    console_displaced: bool,
}

/// The bridge
pub struct UartBridge<'a, U, C, const N: usize>
where
    U: UartPort,
    C: Console,
{
    uart: U,
    console: C,
    registry: &'a ChannelRegistry,
    shared: &'a BridgeShared<'a, N>,
    irq_callback: IrqCallback,
    reader: RingReader<'a, N>,
    /// Ring writer while stopped; lives in the relay slot while running
    writer: Option<RingWriter<'a, N>>,
    session: Option<Session<'a>>,
    /// Bytes popped from the ring that USB has not accepted yet
    pending: Vec<u8, USB_CHUNK_SIZE>,
}

impl<'a, U, C, const N: usize> UartBridge<'a, U, C, N>
where
    U: UartPort,
    C: Console,
{
    /// Create a stopped bridge
    ///
    /// `irq_callback` is what gets registered with the UART driver; it must
    /// forward events to `shared.slot`.
    pub fn new(
        uart: U,
        console: C,
        ring: &'a mut ByteRing<N>,
        shared: &'a BridgeShared<'a, N>,
        registry: &'a ChannelRegistry,
        irq_callback: IrqCallback,
    ) -> Self {
        let (writer, reader) = ring.split();
        Self {
            uart,
            console,
            registry,
            shared,
            irq_callback,
            reader,
            writer: Some(writer),
            session: None,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        if self.session.is_some() {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Config of the running session
    pub fn config(&self) -> Option<&BridgeConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn status(&self) -> &'a StatusModel {
        &self.shared.status
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Start a session
    ///
    /// Acquires the channel, displaces the console if it shares the
    /// channel, initializes the UART and registers the receive relay.
    pub async fn start(&mut self, config: BridgeConfig) -> Result<(), BridgeError> {
        if self.session.is_some() {
            return Err(BridgeError::HardwareUnavailable);
        }
        let channel = config.channel();
        let lease = self
            .registry
            .try_acquire(channel)
            .ok_or(BridgeError::HardwareUnavailable)?;

        let console_displaced = self.console.channel() == channel && self.console.is_enabled();
        if console_displaced {
            self.console.disable();
        }

        if self.uart.init(channel, config.baudrate()).is_err() {
            if console_displaced {
                self.console.enable();
            }
            return Err(BridgeError::Driver);
        }

        // Anything left over from the previous session is stale
        self.reader.clear();
        self.reader.take_dropped();
        self.pending.clear();
        self.shared.notify.reset();

        if let Some(writer) = self.writer.take() {
            self.shared
                .slot
                .install(RxRelay::new(writer, &self.shared.notify));
        }
        self.uart.set_irq_callback(channel, Some(self.irq_callback));

        self.shared.status.begin_session(config.baudrate()).await;
        self.session = Some(Session {
            config,
            _lease: lease,
            console_displaced,
        });

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Bridge started on {:?} at {} baud",
            channel,
            config.baudrate()
        );
        Ok(())
    }

    /// Stop the session
    ///
    /// No-op when already stopped.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let channel = session.config.channel();

        self.uart.set_irq_callback(channel, None);
        self.uart.deinit(channel);
        if let Some(relay) = self.shared.slot.remove() {
            self.writer = Some(relay.into_writer());
        }
        if session.console_displaced {
            self.console.enable();
        }
        self.pending.clear();
        drop(session);

        self.shared.status.end_session().await;
        // Let a waiting worker see the stop without sitting out its timeout
        self.shared.notify.notify();

        #[cfg(feature = "defmt")]
        defmt::info!("Bridge stopped on {:?}", channel);
    }

    /// Send bytes on the UART from the live path
    pub async fn transmit(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        let sent = self.send(data).await?;
        self.shared.status.record_tx(sent).await;
        Ok(sent)
    }

    /// Send bytes on the UART outside the live path
    ///
    /// Counted separately and folded into `tx_cnt` by the next snapshot.
    pub async fn inject(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        let sent = self.send(data).await?;
        self.shared.status.record_injected(sent).await;
        Ok(sent)
    }

    /// Send the contents of a stored file outside the live path
    pub async fn inject_file<S: FileStore>(
        &mut self,
        store: &mut S,
        path: &str,
    ) -> Result<usize, BridgeError> {
        self.require_running()?;

        let mut buf = [0u8; MAX_INJECT_LEN];
        let mut file = store.open(path).await?;
        let read = store.read_all(&mut file, &mut buf).await;
        store.close(file);
        let len = read?;

        self.inject(&buf[..len]).await
    }

    /// Forward received bytes to USB
    ///
    /// Pops everything available from the ring and writes it to `usb` in
    /// arrival order. Bytes USB does not accept stay queued for the next
    /// call. Returns the number of bytes forwarded.
    ///
    /// A latched line fault stops the bridge and is returned as
    /// [`BridgeError::HardwareFault`].
    pub async fn drain_to_usb<V: VirtualSerial>(
        &mut self,
        usb: &mut V,
    ) -> Result<usize, BridgeError> {
        if let Some(fault) = self.shared.notify.take_fault() {
            if self.session.is_some() {
                #[cfg(feature = "defmt")]
                defmt::warn!("UART fault {:?}, stopping bridge", fault);
                self.stop().await;
                return Err(BridgeError::HardwareFault(fault));
            }
        }
        self.require_running()?;

        let mut forwarded = 0;
        loop {
            let room = self.pending.capacity() - self.pending.len();
            let mut chunk = [0u8; USB_CHUNK_SIZE];
            let n = self.reader.pop_into(&mut chunk[..room]);
            // Fits: n <= room
            let _ = self.pending.extend_from_slice(&chunk[..n]);
            if self.pending.is_empty() {
                break;
            }

            let written = usb.write(&self.pending).min(self.pending.len());
            forwarded += written;
            if written < self.pending.len() {
                let remaining = self.pending.len() - written;
                self.pending.rotate_left(written);
                self.pending.truncate(remaining);
                break;
            }
            self.pending.clear();
        }

        let dropped = self.reader.take_dropped();
        if forwarded > 0 || dropped > 0 {
            self.shared.status.record_rx(forwarded, dropped).await;
        }
        Ok(forwarded)
    }

    /// Forward bytes the host sent to the UART
    ///
    /// Reads until the host side is empty or [`MAX_FORWARD_LEN`] bytes have
    /// been sent. Returns the number of bytes forwarded.
    pub async fn forward_from_usb<V: VirtualSerial>(
        &mut self,
        usb: &mut V,
    ) -> Result<usize, BridgeError> {
        self.require_running()?;

        let mut buf = [0u8; USB_CHUNK_SIZE];
        let mut forwarded = 0;
        while forwarded < MAX_FORWARD_LEN {
            let want = (MAX_FORWARD_LEN - forwarded).min(USB_CHUNK_SIZE);
            let n = usb.read(&mut buf[..want]).min(want);
            if n == 0 {
                break;
            }
            forwarded += self.transmit(&buf[..n]).await?;
        }
        Ok(forwarded)
    }

    fn require_running(&self) -> Result<&Session<'a>, BridgeError> {
        self.session.as_ref().ok_or(BridgeError::NotRunning)
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        let channel = self.require_running()?.config.channel();
        self.uart
            .transmit(channel, data)
            .await
            .map_err(|_| BridgeError::Driver)
    }
}
