//! End-to-end session: start, inject a command, watch the status, stop

mod common;

use common::{noop_irq, MockConsole, MockStore, MockUart, MockUsb};
use embassy_futures::block_on;
use vcpbridge_core::view::{Screen, UsbUartView};
use vcpbridge_core::{BridgeConfig, BridgeShared, ByteRing, ChannelRegistry, StatusSnapshot, UartBridge};
use vcpbridge_hal::{UartId, UartIrqEvent};

#[test]
fn test_injection_session() {
    let mut ring = ByteRing::<64>::new();
    let shared = BridgeShared::new();
    let registry = ChannelRegistry::new();
    let mut bridge = UartBridge::new(
        MockUart::default(),
        MockConsole::on(UartId::Uart0),
        &mut ring,
        &shared,
        &registry,
        noop_irq,
    );
    let command = [b'A'; 42];
    let mut store = MockStore::with_file("/any/uart/Right.txt", &command);
    let config = BridgeConfig::new(0, 115200, 0).unwrap();
    let mut view = UsbUartView::new();
    let mut screen = Screen::new();

    block_on(async {
        bridge.start(config).await.unwrap();
        let started = shared.status.snapshot(view.last_snapshot()).await;
        view.update_state(&config, started);

        assert_eq!(
            bridge.inject_file(&mut store, "/any/uart/Right.txt").await,
            Ok(42)
        );

        let snap = shared.status.snapshot(view.last_snapshot()).await;
        assert!(snap.running);
        assert_eq!(snap.tx_cnt, 42);
        assert!(snap.tx_active);
        assert!(!snap.rx_active);
        view.update_state(&config, snap);
        view.render(&mut screen);
        assert_eq!(screen.get_line(2), "TX Pin 13 ^     42 B.");
        assert!(screen.get_line(7).ends_with("Baud: 115200"));

        bridge.stop().await;

        let stopped = shared.status.snapshot(view.last_snapshot()).await;
        assert!(!stopped.running);
        assert_eq!(stopped.tx_cnt, 42);
        assert!(!stopped.tx_active);
        view.update_state(&config, stopped);
        view.render(&mut screen);
        assert_eq!(screen.get_line(2), "TX Pin 13 .     42 B.");
        assert_eq!(screen.get_line(3), "Ok to start");
    });
}

#[test]
fn test_loopback_session() {
    let mut ring = ByteRing::<64>::new();
    let shared = BridgeShared::new();
    let registry = ChannelRegistry::new();
    let mut bridge = UartBridge::new(
        MockUart::default(),
        MockConsole::on(UartId::Uart0),
        &mut ring,
        &shared,
        &registry,
        noop_irq,
    );
    let mut usb = MockUsb::default();
    usb.host_input.extend(b"ping");

    block_on(async {
        bridge
            .start(BridgeConfig::new(1, 9600, 0).unwrap())
            .await
            .unwrap();

        // Host writes, the device on the line echoes it back
        bridge.forward_from_usb(&mut usb).await.unwrap();
        let echoed = bridge.uart().wire.clone();
        for b in echoed {
            shared.slot.dispatch(UartIrqEvent::RxByte(b));
        }
        bridge.drain_to_usb(&mut usb).await.unwrap();

        assert_eq!(usb.received, b"ping");
        let snap = shared.status.snapshot(&StatusSnapshot::default()).await;
        assert_eq!((snap.tx_cnt, snap.rx_cnt, snap.rx_dropped), (4, 4, 0));

        // A new session starts from zero
        bridge.stop().await;
        bridge
            .start(BridgeConfig::new(1, 9600, 0).unwrap())
            .await
            .unwrap();
        let fresh = shared.status.snapshot(&snap).await;
        assert_eq!((fresh.tx_cnt, fresh.rx_cnt), (0, 0));
        assert!(fresh.running);
    });
}
