//! Mock hardware for bridge tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::string::String;
use std::vec::Vec;

use embassy_futures::yield_now;
use vcpbridge_hal::{
    Console, FileError, FileStore, IrqCallback, UartId, UartIrqEvent, UartPort, VirtualSerial,
};

/// Callback registered with the mock UART; tests drive the relay slot directly
pub fn noop_irq(_event: UartIrqEvent) {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockUartError;

#[derive(Default)]
pub struct MockUart {
    pub baudrate: [Option<u32>; 2],
    pub callbacks: [bool; 2],
    pub init_calls: usize,
    pub deinit_calls: usize,
    pub fail_init: bool,
    pub wire: Vec<u8>,
    /// TX FIFO size; transmit yields after each fill when set
    pub fifo_depth: Option<usize>,
    /// Times transmit waited for the FIFO to drain
    pub waits: usize,
}

impl UartPort for MockUart {
    type Error = MockUartError;

    fn init(&mut self, channel: UartId, baudrate: u32) -> Result<(), Self::Error> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(MockUartError);
        }
        self.baudrate[channel.index()] = Some(baudrate);
        Ok(())
    }

    fn deinit(&mut self, channel: UartId) {
        self.deinit_calls += 1;
        self.baudrate[channel.index()] = None;
    }

    fn set_irq_callback(&mut self, channel: UartId, callback: Option<IrqCallback>) {
        self.callbacks[channel.index()] = callback.is_some();
    }

    async fn transmit(&mut self, channel: UartId, data: &[u8]) -> Result<usize, Self::Error> {
        if self.baudrate[channel.index()].is_none() {
            return Err(MockUartError);
        }
        let mut rest = data;
        loop {
            let n = self.fifo_depth.map_or(rest.len(), |depth| depth.min(rest.len()));
            self.wire.extend_from_slice(&rest[..n]);
            rest = &rest[n..];
            if rest.is_empty() {
                break;
            }
            self.waits += 1;
            yield_now().await;
        }
        Ok(data.len())
    }
}

pub struct MockConsole {
    pub channel: UartId,
    pub enabled: bool,
    pub toggles: usize,
}

impl MockConsole {
    pub fn on(channel: UartId) -> Self {
        Self {
            channel,
            enabled: true,
            toggles: 0,
        }
    }
}

impl Console for MockConsole {
    fn channel(&self) -> UartId {
        self.channel
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.toggles += 1;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.toggles += 1;
    }
}

/// USB port that accepts at most `accept` bytes per write
#[derive(Default)]
pub struct MockUsb {
    pub received: Vec<u8>,
    pub accept: Option<usize>,
    pub host_input: VecDeque<u8>,
}

impl VirtualSerial for MockUsb {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.host_input.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let n = self.accept.map_or(data.len(), |limit| limit.min(data.len()));
        self.received.extend_from_slice(&data[..n]);
        n
    }
}

#[derive(Default)]
pub struct MockStore {
    pub files: HashMap<String, Vec<u8>>,
    pub open_handles: usize,
}

impl MockStore {
    pub fn with_file(path: &str, contents: &[u8]) -> Self {
        let mut store = Self::default();
        store.files.insert(path.into(), contents.to_vec());
        store
    }
}

pub struct MockFile {
    contents: Vec<u8>,
}

impl FileStore for MockStore {
    type File = MockFile;

    async fn open(&mut self, path: &str) -> Result<Self::File, FileError> {
        let contents = self.files.get(path).cloned().ok_or(FileError::NotFound)?;
        self.open_handles += 1;
        Ok(MockFile { contents })
    }

    async fn read_all(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FileError> {
        if file.contents.len() > buf.len() {
            return Err(FileError::BufferTooSmall);
        }
        buf[..file.contents.len()].copy_from_slice(&file.contents);
        Ok(file.contents.len())
    }

    fn close(&mut self, _file: Self::File) {
        self.open_handles -= 1;
    }
}
