//! Interrupt-driven UART driver
//!
//! RP2040 has two PL011 UARTs. The bridge brings them up and down at
//! runtime, so this driver talks to the registers directly instead of
//! holding an embassy `Uart` for the whole program.
//!
//! Channel to pin mapping:
//!
//! | Channel | Peripheral | TX     | RX     |
//! |---------|------------|--------|--------|
//! | 0       | UART0      | GPIO0  | GPIO1  |
//! | 1       | UART1      | GPIO4  | GPIO5  |
//!
//! The receive interrupt drains the RX FIFO and hands the bytes (in bursts)
//! and any line fault to the callback registered for the channel. Transmit fills the
//! TX FIFO and parks on the TX interrupt while it is full.

use core::cell::Cell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_rp::interrupt::typelevel::{Binding, Handler, Interrupt, UART0_IRQ, UART1_IRQ};
use embassy_rp::pac;
use embassy_rp::peripherals::{PIN_0, PIN_1, PIN_4, PIN_5, UART0, UART1};
use embassy_rp::{clocks, Peri};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::AtomicWaker;

use vcpbridge_hal::{IrqCallback, RxBurst, UartFault, UartId, UartIrqEvent, UartPort};

/// GPIO function select value for UART
const FUNCSEL_UART: u8 = 2;
/// GPIO function select value for "no function"
const FUNCSEL_NULL: u8 = 0x1f;

/// (TX, RX) GPIO numbers per channel
const CHANNEL_PINS: [(usize, usize); 2] = [(0, 1), (4, 5)];

type CallbackCell = Mutex<CriticalSectionRawMutex, Cell<Option<IrqCallback>>>;

static CALLBACKS: [CallbackCell; 2] = [
    Mutex::new(Cell::new(None)),
    Mutex::new(Cell::new(None)),
];

static TX_WAKERS: [AtomicWaker; 2] = [AtomicWaker::new(), AtomicWaker::new()];

/// UART driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Baud rate cannot be derived from the peripheral clock
    UnsupportedBaudrate,
    /// Channel has not been initialized
    NotInitialized,
}

pub(crate) fn regs(channel: UartId) -> pac::uart::Uart {
    match channel {
        UartId::Uart0 => pac::UART0,
        UartId::Uart1 => pac::UART1,
    }
}

/// Take the peripheral out of reset
pub(crate) fn unreset(channel: UartId) {
    pac::RESETS.reset().modify(|w| match channel {
        UartId::Uart0 => w.set_uart0(false),
        UartId::Uart1 => w.set_uart1(false),
    });
    loop {
        let done = pac::RESETS.reset_done().read();
        let ready = match channel {
            UartId::Uart0 => done.uart0(),
            UartId::Uart1 => done.uart1(),
        };
        if ready {
            break;
        }
    }
}

/// Route a GPIO to the UART function (or back to nothing)
pub(crate) fn route_pin(gpio: usize, uart: bool, input: bool) {
    pac::PADS_BANK0.gpio(gpio).write(|w| {
        w.set_ie(input);
        w.set_od(false);
        w.set_pue(input);
        w.set_pde(false);
    });
    pac::IO_BANK0
        .gpio(gpio)
        .ctrl()
        .write(|w| w.set_funcsel(if uart { FUNCSEL_UART } else { FUNCSEL_NULL }));
}

/// Program the baud rate divisors
///
/// Fractional divisor per the RP2040 datasheet (4.2.7.1).
pub(crate) fn set_baudrate(r: pac::uart::Uart, baudrate: u32) -> Result<(), UartError> {
    if baudrate == 0 {
        return Err(UartError::UnsupportedBaudrate);
    }
    let div = 8 * clocks::clk_peri_freq() / baudrate;
    let ibrd = div >> 7;
    if ibrd == 0 || ibrd >= 65535 {
        return Err(UartError::UnsupportedBaudrate);
    }
    let fbrd = ((div & 0x7f) + 1) / 2;

    r.uartibrd().write(|w| w.set_baud_divint(ibrd as u16));
    r.uartfbrd().write(|w| w.set_baud_divfrac(fbrd as u8));
    Ok(())
}

/// 8N1 with FIFOs; also latches the divisors
pub(crate) fn set_line_format(r: pac::uart::Uart) {
    r.uartlcr_h().write(|w| {
        w.set_wlen(0b11);
        w.set_fen(true);
    });
}

/// Write bytes into the TX FIFO, spinning while it is full
pub(crate) fn write_blocking(r: pac::uart::Uart, data: &[u8]) {
    for &byte in data {
        while r.uartfr().read().txff() {}
        r.uartdr().write(|w| w.set_data(byte));
    }
}

/// Write bytes into the TX FIFO, waiting on the TX interrupt while it is full
async fn write_async(channel: UartId, data: &[u8]) {
    let r = regs(channel);
    let mut rest = data;

    while !rest.is_empty() {
        poll_fn(|cx| {
            TX_WAKERS[channel.index()].register(cx.waker());
            if r.uartfr().read().txff() {
                // The handler masks TXIM again before waking us
                critical_section::with(|_| r.uartimsc().modify(|w| w.set_txim(true)));
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
        .await;

        while let Some((&byte, tail)) = rest.split_first() {
            if r.uartfr().read().txff() {
                break;
            }
            r.uartdr().write(|w| w.set_data(byte));
            rest = tail;
        }
    }
}

/// Wait until the last byte has left the shift register
pub(crate) fn flush(r: pac::uart::Uart) {
    while r.uartfr().read().busy() {}
}

fn line_fault(dr: pac::uart::regs::Uartdr) -> Option<UartFault> {
    if dr.oe() {
        Some(UartFault::Overrun)
    } else if dr.be() {
        Some(UartFault::Break)
    } else if dr.pe() {
        Some(UartFault::Parity)
    } else if dr.fe() {
        Some(UartFault::Framing)
    } else {
        None
    }
}

fn on_interrupt(channel: UartId) {
    let r = regs(channel);
    let callback = CALLBACKS[channel.index()].lock(|cell| cell.get());
    let emit = |event| {
        if let Some(callback) = callback {
            callback(event);
        }
    };
    let timed_out = r.uartmis().read().rtmis();

    // Drain even without a callback so the interrupt deasserts
    let mut burst = RxBurst::new();
    while !r.uartfr().read().rxfe() {
        let dr = r.uartdr().read();
        match line_fault(dr) {
            Some(fault) => {
                // Bytes before the fault still count
                if !burst.is_empty() {
                    emit(UartIrqEvent::RxBurst(burst));
                    burst = RxBurst::new();
                }
                emit(UartIrqEvent::Fault(fault));
            }
            None => {
                burst.push(dr.data());
                if burst.is_full() {
                    emit(UartIrqEvent::RxBurst(burst));
                    burst = RxBurst::new();
                }
            }
        }
    }
    if !burst.is_empty() {
        emit(UartIrqEvent::RxBurst(burst));
    }
    if timed_out {
        emit(UartIrqEvent::Idle);
    }

    if r.uartmis().read().txmis() {
        r.uartimsc().modify(|w| w.set_txim(false));
        TX_WAKERS[channel.index()].wake();
    }

    r.uarticr().write(|w| {
        w.set_rxic(true);
        w.set_rtic(true);
        w.set_feic(true);
        w.set_peic(true);
        w.set_beic(true);
        w.set_oeic(true);
    });
}

/// UART0 receive interrupt handler
pub struct Uart0IrqHandler;

impl Handler<UART0_IRQ> for Uart0IrqHandler {
    unsafe fn on_interrupt() {
        on_interrupt(UartId::Uart0);
    }
}

/// UART1 receive interrupt handler
pub struct Uart1IrqHandler;

impl Handler<UART1_IRQ> for Uart1IrqHandler {
    unsafe fn on_interrupt() {
        on_interrupt(UartId::Uart1);
    }
}

/// RP2040 implementation of [`UartPort`]
///
/// Owns both UART peripherals and their pins so nothing else can claim
/// them through embassy-rp.
pub struct Rp2040Uart<'d> {
    _uart0: Peri<'d, UART0>,
    _uart1: Peri<'d, UART1>,
    _pins: (
        Peri<'d, PIN_0>,
        Peri<'d, PIN_1>,
        Peri<'d, PIN_4>,
        Peri<'d, PIN_5>,
    ),
    active: [bool; 2],
}

impl<'d> Rp2040Uart<'d> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        uart0: Peri<'d, UART0>,
        tx0: Peri<'d, PIN_0>,
        rx0: Peri<'d, PIN_1>,
        uart1: Peri<'d, UART1>,
        tx1: Peri<'d, PIN_4>,
        rx1: Peri<'d, PIN_5>,
        _irqs: impl Binding<UART0_IRQ, Uart0IrqHandler> + Binding<UART1_IRQ, Uart1IrqHandler>,
    ) -> Self {
        Self {
            _uart0: uart0,
            _uart1: uart1,
            _pins: (tx0, rx0, tx1, rx1),
            active: [false; 2],
        }
    }

    /// Check if a channel is initialized
    pub fn is_active(&self, channel: UartId) -> bool {
        self.active[channel.index()]
    }

    fn enable_irq(channel: UartId) {
        match channel {
            UartId::Uart0 => {
                UART0_IRQ::unpend();
                // Handler is bound: `new` requires the binding
                unsafe { UART0_IRQ::enable() };
            }
            UartId::Uart1 => {
                UART1_IRQ::unpend();
                unsafe { UART1_IRQ::enable() };
            }
        }
    }

    fn disable_irq(channel: UartId) {
        match channel {
            UartId::Uart0 => UART0_IRQ::disable(),
            UartId::Uart1 => UART1_IRQ::disable(),
        }
    }
}

impl UartPort for Rp2040Uart<'_> {
    type Error = UartError;

    fn init(&mut self, channel: UartId, baudrate: u32) -> Result<(), UartError> {
        let r = regs(channel);
        let (tx, rx) = CHANNEL_PINS[channel.index()];

        unreset(channel);
        r.uartcr().write(|_| {});
        set_baudrate(r, baudrate)?;
        set_line_format(r);

        route_pin(tx, true, false);
        route_pin(rx, true, true);

        // RX interrupt at 1/8 full, on receive timeout and on every line
        // error; TX interrupt (unmasked only while a write waits) at 1/2
        r.uartifls().write(|w| {
            w.set_rxiflsel(0b000);
            w.set_txiflsel(0b010);
        });
        r.uarticr().write_value(pac::uart::regs::Uarticr(0x7ff));
        r.uartimsc().write(|w| {
            w.set_rxim(true);
            w.set_rtim(true);
            w.set_feim(true);
            w.set_peim(true);
            w.set_beim(true);
            w.set_oeim(true);
        });
        r.uartcr().write(|w| {
            w.set_uarten(true);
            w.set_txe(true);
            w.set_rxe(true);
        });

        Self::enable_irq(channel);
        self.active[channel.index()] = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("{:?} up at {} baud", channel, baudrate);
        Ok(())
    }

    fn deinit(&mut self, channel: UartId) {
        if !self.active[channel.index()] {
            return;
        }
        let r = regs(channel);
        let (tx, rx) = CHANNEL_PINS[channel.index()];

        Self::disable_irq(channel);
        r.uartimsc().write(|_| {});
        flush(r);
        r.uartcr().write(|_| {});
        route_pin(tx, false, false);
        route_pin(rx, false, false);

        self.active[channel.index()] = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("{:?} down", channel);
    }

    fn set_irq_callback(&mut self, channel: UartId, callback: Option<IrqCallback>) {
        CALLBACKS[channel.index()].lock(|cell| cell.set(callback));
    }

    async fn transmit(&mut self, channel: UartId, data: &[u8]) -> Result<usize, UartError> {
        if !self.active[channel.index()] {
            return Err(UartError::NotInitialized);
        }
        write_async(channel, data).await;
        Ok(data.len())
    }
}
