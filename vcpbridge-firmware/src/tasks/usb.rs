//! USB tasks
//!
//! `usb_device_task` runs the device state machine; `cdc_task` shuttles
//! packets between the CDC-ACM endpoints and the bridge pipes.

use defmt::*;
use embassy_futures::select::select;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;
use portable_atomic::Ordering;

use crate::channels::{FROM_HOST, HOST_CONNECTED, HOST_DATA, TO_HOST};
use crate::usb::{UsbDriver, MAX_PACKET_SIZE};

/// USB device task
#[embassy_executor::task]
pub async fn usb_device_task(mut device: UsbDevice<'static, UsbDriver>) {
    info!("USB device task started");
    device.run().await;
}

/// CDC-ACM data task
#[embassy_executor::task]
pub async fn cdc_task(class: CdcAcmClass<'static, UsbDriver>) {
    info!("CDC task started");

    let (mut sender, mut receiver) = class.split();

    loop {
        sender.wait_connection().await;
        HOST_CONNECTED.store(true, Ordering::Relaxed);
        info!("USB host connected");

        select(host_to_pipe(&mut receiver), pipe_to_host(&mut sender)).await;

        HOST_CONNECTED.store(false, Ordering::Relaxed);
        info!("USB host disconnected");
    }
}

async fn host_to_pipe(receiver: &mut Receiver<'static, UsbDriver>) -> EndpointError {
    let mut buf = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        match receiver.read_packet(&mut buf).await {
            Ok(n) => {
                FROM_HOST.write_all(&buf[..n]).await;
                HOST_DATA.signal(());
            }
            Err(e) => return e,
        }
    }
}

async fn pipe_to_host(sender: &mut Sender<'static, UsbDriver>) -> EndpointError {
    let mut buf = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        let n = TO_HOST.read(&mut buf).await;
        if let Err(e) = sender.write_packet(&buf[..n]).await {
            return e;
        }
        // A full packet does not end a transfer; flush with a ZLP when idle
        if n == buf.len() && TO_HOST.is_empty() {
            if let Err(e) = sender.write_packet(&[]).await {
                return e;
            }
        }
    }
}
