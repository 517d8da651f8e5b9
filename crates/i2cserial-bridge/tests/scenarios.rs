mod support;

use std::time::{Duration, Instant};

use i2cserial_bridge::{connect_with_config, BridgeError, FirmwareVersion, Message, State};
use support::*;

#[test]
fn write_acknowledged() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&write_frame(0x50, &[0x10, 0x20]), &reply(&[&[ESC, b'S'], &WATCHDOG]));
    let conn = connected(&bridge);

    let moved = conn.transfer(&mut [Message::write(0x50, &[0x10, 0x20])]).unwrap();

    assert_eq!(moved, 2);
    assert_eq!(bridge.sent(), vec![ESC, b'S', 0x50, 0x10, 0x20, ESC, EOT]);
    assert_eq!(conn.state(), State::Idle);
}

#[test]
fn write_payload_escape_is_doubled() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&write_frame(0x50, &[0x01, ESC, 0x02]), &reply(&[&[ESC, b'S'], &WATCHDOG]));
    let conn = connected(&bridge);

    conn.transfer(&mut [Message::write(0x50, &[0x01, ESC, 0x02])]).unwrap();

    assert_eq!(
        bridge.sent(),
        vec![0x1B, b'S', 0x50, 0x01, 0x1B, 0x1B, 0x02, 0x1B, 0x04]
    );
}

#[test]
fn read_ack_then_data() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&[ESC, b'r', 0x50, 1], &reply(&[&[ESC, b'r', 0x42], &WATCHDOG]));
    let conn = connected(&bridge);

    let mut buf = [0u8; 1];
    let moved = conn.transfer(&mut [Message::read(0x50, &mut buf)]).unwrap();

    assert_eq!(moved, 1);
    assert_eq!(buf, [0x42]);
    assert_eq!(conn.state(), State::Idle);
}

#[test]
fn read_data_then_ack() {
    let bridge = FakeBridge::with_version();
    bridge.expect(
        &[ESC, b'r', 0x50, 3],
        &reply(&[&[0xA0, ESC, ESC, 0xA2, ESC, b'r'], &WATCHDOG]),
    );
    let conn = connected(&bridge);

    let mut buf = [0u8; 3];
    conn.transfer(&mut [Message::read(0x50, &mut buf)]).unwrap();

    assert_eq!(buf, [0xA0, ESC, 0xA2]);
}

#[test]
fn silent_bridge_times_out_and_resets() {
    let bridge = FakeBridge::with_version();
    let conn = connected(&bridge);

    let started = Instant::now();
    let err = conn
        .transfer(&mut [Message::write(0x50, &[0x10])])
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout(_)), "got {err:?}");
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(bridge.sent().ends_with(&[ESC, b'z']));
    assert_eq!(conn.state(), State::WaitingForWatchdog);
}

#[test]
fn address_nak_reported_without_reset() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&write_frame(0x51, &[0x00]), &reply(&[&[ESC, b'N'], &WATCHDOG]));
    let conn = connected(&bridge);

    let err = conn
        .transfer(&mut [Message::write(0x51, &[0x00])])
        .unwrap_err();

    assert!(matches!(err, BridgeError::AddressNak), "got {err:?}");
    assert_eq!(bridge.sent(), write_frame(0x51, &[0x00]));
    assert_eq!(conn.state(), State::Idle);
}

#[test]
fn empty_version_reply_is_no_device() {
    let bridge = FakeBridge::new();
    bridge.expect(&[ESC, b'v'], &[ESC, b'v']);

    let err = connect_with_config(bridge.clone(), test_config()).unwrap_err();

    assert!(matches!(err, BridgeError::NoDevice(_)), "got {err:?}");
    assert!(!bridge.is_attached());
}

#[test]
fn version_ack_without_bytes_is_no_device() {
    let bridge = FakeBridge::new();
    bridge.expect(&[ESC, b'v'], &reply(&[&[ESC, b'V'], &WATCHDOG]));

    let err = connect_with_config(bridge.clone(), test_config()).unwrap_err();

    assert!(matches!(err, BridgeError::NoDevice(_)), "got {err:?}");
    assert!(!bridge.is_attached());
}

#[test]
fn missing_bridge_is_no_device() {
    let bridge = FakeBridge::new();
    let err = connect_with_config(bridge.clone(), test_config()).unwrap_err();
    assert!(matches!(err, BridgeError::NoDevice(_)), "got {err:?}");
    assert_eq!(bridge.attach_count(), 1);
    assert!(!bridge.is_attached());
}

#[test]
fn handshake_captures_firmware_version() {
    let bridge = FakeBridge::with_version();
    let conn = connected(&bridge);

    assert_eq!(conn.firmware_version(), FirmwareVersion(VERSION));
    assert_eq!(conn.firmware_version().to_string(), "1.2.3.4");
    assert_eq!(conn.state(), State::Idle);
    assert!(bridge.is_attached());

    let transport = conn.disconnect();
    assert!(!transport.is_attached());
}

#[test]
fn combined_register_read() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&[ESC, b'N', 0x50, 0x10], &[ESC, b'S']);
    bridge.expect(
        &[ESC, b'r', 0x50, 2],
        &reply(&[&[ESC, b'r', 0xCA, 0xFE], &WATCHDOG]),
    );
    let conn = connected(&bridge);

    let mut buf = [0u8; 2];
    let moved = conn
        .transfer(&mut [
            Message::write(0x50, &[0x10]).no_stop(),
            Message::read(0x50, &mut buf),
        ])
        .unwrap();

    assert_eq!(moved, 3);
    assert_eq!(buf, [0xCA, 0xFE]);
    assert_eq!(
        bridge.sent(),
        vec![ESC, b'N', 0x50, 0x10, ESC, b'r', 0x50, 2]
    );
}

#[test]
fn no_stop_read_chains_into_write() {
    let bridge = FakeBridge::with_version();
    // The bus stays claimed after the read, so no reset marker follows it.
    bridge.expect(&[ESC, b'n', 0x50, 2], &[ESC, b'r', 0x12, 0x34]);
    bridge.expect(&write_frame(0x50, &[0x99]), &reply(&[&[ESC, b'S'], &WATCHDOG]));
    let conn = connected(&bridge);

    let started = Instant::now();
    let mut buf = [0u8; 2];
    let moved = conn
        .transfer(&mut [
            Message::read(0x50, &mut buf).no_stop(),
            Message::write(0x50, &[0x99]),
        ])
        .unwrap();

    assert!(started.elapsed() < test_config().timeout);
    assert_eq!(moved, 3);
    assert_eq!(buf, [0x12, 0x34]);
    assert_eq!(
        bridge.sent(),
        reply(&[&[ESC, b'n', 0x50, 2], &write_frame(0x50, &[0x99])])
    );
    assert_eq!(bridge.remaining(), 0);
    assert_eq!(conn.state(), State::Idle);
}

#[test]
fn no_stop_read_chains_into_read() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&[ESC, b'n', 0x21, 1], &[ESC, b'r', 0x07]);
    bridge.expect(
        &[ESC, b'r', 0x21, 3],
        &reply(&[&[ESC, b'r', 0xA0, ESC, ESC, 0xA2], &WATCHDOG]),
    );
    let conn = connected(&bridge);

    let started = Instant::now();
    let mut head = [0u8; 1];
    let mut body = [0u8; 3];
    conn.transfer(&mut [
        Message::read(0x21, &mut head).no_stop(),
        Message::read(0x21, &mut body),
    ])
    .unwrap();

    assert!(started.elapsed() < test_config().timeout);
    assert_eq!(head, [0x07]);
    assert_eq!(body, [0xA0, ESC, 0xA2]);
    assert_eq!(conn.state(), State::Idle);
}

#[test]
fn delayed_reply_is_awaited() {
    let bridge = FakeBridge::with_version();
    bridge.expect_delayed(
        &write_frame(0x20, &[0xFF]),
        &reply(&[&[ESC, b'S'], &WATCHDOG]),
        Duration::from_millis(10),
    );
    let conn = connected(&bridge);

    conn.transfer(&mut [Message::write(0x20, &[0xFF])]).unwrap();
}

#[test]
fn failed_message_stops_the_transfer() {
    let bridge = FakeBridge::with_version();
    bridge.expect(&write_frame(0x50, &[1]), &reply(&[&[ESC, b'n'], &WATCHDOG]));
    let conn = connected(&bridge);

    let err = conn
        .transfer(&mut [Message::write(0x50, &[1]), Message::write(0x50, &[2])])
        .unwrap_err();

    assert!(matches!(err, BridgeError::DataNak));
    assert_eq!(bridge.sent(), write_frame(0x50, &[1]));
}

#[test]
fn each_error_code_maps() {
    let cases: [(u8, fn(&BridgeError) -> bool); 7] = [
        (b'o', |e| matches!(e, BridgeError::BufferOverflow)),
        (b't', |e| matches!(e, BridgeError::BusTimeout)),
        (b'c', |e| matches!(e, BridgeError::BusBusy)),
        (b'C', |e| matches!(e, BridgeError::BusBusy)),
        (b'x', |e| matches!(e, BridgeError::BusStalled)),
        (b'F', |e| matches!(e, BridgeError::MasterTransmitFailure)),
        (b'n', |e| matches!(e, BridgeError::DataNak)),
    ];

    for (code, check) in cases {
        let bridge = FakeBridge::with_version();
        bridge.expect(&write_frame(0x50, &[0]), &reply(&[&[ESC, code], &WATCHDOG]));
        let conn = connected(&bridge);

        let err = conn.transfer(&mut [Message::write(0x50, &[0])]).unwrap_err();
        assert!(check(&err), "code {} gave {err:?}", code as char);
    }
}
