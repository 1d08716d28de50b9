//! Master behaviour against the scripted mock transport.
//!
//! Every test runs on a paused clock, so response timeouts elapse instantly.

use mbus_telegram::mbus::{build_selection_frame, pack_frame, parse_mask, AddressMask};
use mbus_telegram::payload::MBusPacket;
use mbus_telegram::{MBusError, MBusFrame, MBusMaster, MasterConfig, MockTransport, SelectOutcome};
use std::time::Duration;

fn variable_reply(address: u8, id: [u8; 4], records: &[u8]) -> MBusFrame {
    let mut data = id.to_vec();
    data.extend([0x24, 0x40, 0x01, 0x07, 0x00, 0x00, 0x00, 0x00]);
    data.extend_from_slice(records);
    MBusFrame::long(0x08, address, 0x72, data).unwrap()
}

async fn connected(mock: MockTransport, config: MasterConfig) -> MBusMaster<MockTransport> {
    let mut master = MBusMaster::new(mock, config);
    master.connect().await.unwrap();
    master
}

#[tokio::test(start_paused = true)]
async fn test_request_all_follows_more_records() {
    let mut mock = MockTransport::new();
    mock.queue_frame(&variable_reply(5, [0x01, 0, 0, 0], &[0x01, 0x13, 0x05, 0x1F]))
        .queue_frame(&variable_reply(5, [0x01, 0, 0, 0], &[0x01, 0x13, 0x06]));
    let mut master = connected(mock, MasterConfig::default()).await;

    let packets = master.request_all(5).await.unwrap();
    assert_eq!(packets.len(), 2);
    assert_eq!(
        master.transport().written(),
        &[vec![0x10, 0x7B, 0x05, 0x80, 0x16], vec![0x10, 0x5B, 0x05, 0x60, 0x16]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_request_all_stops_at_telegram_limit() {
    let mut mock = MockTransport::new();
    for _ in 0..3 {
        mock.queue_frame(&variable_reply(5, [0x01, 0, 0, 0], &[0x1F]));
    }
    let config = MasterConfig {
        max_telegrams: 2,
        ..MasterConfig::default()
    };
    let mut master = connected(mock, config).await;

    assert_eq!(master.request_all(5).await.unwrap().len(), 2);
    assert_eq!(master.transport().pending_replies(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_not_retried() {
    let mut mock = MockTransport::new();
    mock.queue_error("line down");
    let mut master = connected(mock, MasterConfig::default()).await;

    assert_eq!(
        master.request_data(1).await.unwrap_err(),
        MBusError::Transport("line down".to_string())
    );
    assert_eq!(master.transport().written().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_answer() {
    let mut mock = MockTransport::new();
    mock.queue_silence()
        .queue_frame(&MBusFrame::long(0x08, 1, 0x70, vec![0x08]).unwrap());
    let mut master = connected(mock, MasterConfig::default()).await;

    assert_eq!(
        master.request_data(1).await.unwrap(),
        MBusPacket::ApplicationError { code: 0x08 }
    );
    // the repeat keeps the frame count bit
    let written = master.transport().written();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], written[1]);
}

#[tokio::test(start_paused = true)]
async fn test_ping_resets_frame_count_bit() {
    let mut mock = MockTransport::new();
    mock.queue_frame(&variable_reply(1, [0x01, 0, 0, 0], &[]))
        .queue_ack()
        .queue_frame(&variable_reply(1, [0x01, 0, 0, 0], &[]));
    let mut master = connected(mock, MasterConfig::default()).await;

    master.request_data(1).await.unwrap();
    assert!(master.ping(1).await.unwrap());
    master.request_data(1).await.unwrap();

    let written = master.transport().written();
    assert_eq!(written[0], pack_frame(&MBusFrame::req_ud2(1, true)).unwrap());
    assert_eq!(written[2], pack_frame(&MBusFrame::req_ud2(1, true)).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_scan_primary() {
    let mut mock = MockTransport::new();
    mock.queue_ack()
        .queue_silence()
        .queue_bytes(&[0x10, 0x40, 0x03, 0x00, 0x16]);
    let mut master = connected(mock, MasterConfig::default()).await;

    assert_eq!(master.scan_primary(1..=3).await.unwrap(), vec![1, 3]);
    assert_eq!(master.transport().written().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_select_outcomes() {
    let mut mock = MockTransport::new();
    mock.queue_ack()
        .queue_silence()
        .queue_bytes(&[0x68, 0x03])
        .queue_frame(&MBusFrame::short(0x08, 0xFD))
        .queue_error("framing");
    let mut master = connected(mock, MasterConfig::default()).await;
    let mask = AddressMask::wildcard();

    assert_eq!(master.select_secondary(&mask).await.unwrap(), SelectOutcome::Single);
    assert_eq!(master.select_secondary(&mask).await.unwrap(), SelectOutcome::Nothing);
    assert_eq!(master.select_secondary(&mask).await.unwrap(), SelectOutcome::Collision);
    assert_eq!(master.select_secondary(&mask).await.unwrap(), SelectOutcome::Collision);
    assert!(master.select_secondary(&mask).await.is_err());
    assert_eq!(
        master.transport().written()[0],
        pack_frame(&build_selection_frame(&mask)).unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_scan_secondary_splits_collisions() {
    let mut mock = MockTransport::new();
    mock.queue_bytes(&[0x68, 0x03]) // wildcard: overlapping replies
        .queue_silence() // 0FFFFFFF
        .queue_ack() // 1FFFFFFF
        .queue_frame(&variable_reply(0xFD, [0x78, 0x56, 0x34, 0x12], &[]))
        .queue_ack() // 2FFFFFFF
        .queue_frame(&variable_reply(0xFD, [0x78, 0x56, 0x34, 0x22], &[]));
    // digits 3-9 find an empty script and time out
    let mut master = connected(mock, MasterConfig::default()).await;

    let found = master.scan_secondary().await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].identification, 12345678);
    assert_eq!(found[1].identification, 22345678);
    assert_eq!(found[0].to_string(), "1234567840240107");
    assert_eq!(found[0].manufacturer_code(), "PAD");

    let written = master.transport().written();
    assert_eq!(written.len(), 13);
    let first_branch = parse_mask("0FFFFFFFFFFFFFFF").unwrap();
    assert_eq!(written[1], pack_frame(&build_selection_frame(&first_branch)).unwrap());
    assert_eq!(written[3], vec![0x10, 0x7B, 0xFD, 0x78, 0x16]);
    assert_eq!(written[5], vec![0x10, 0x5B, 0xFD, 0x58, 0x16]);
}

#[tokio::test(start_paused = true)]
async fn test_scan_secondary_from_exact_mask() {
    let mut mock = MockTransport::new();
    mock.queue_ack()
        .queue_frame(&variable_reply(0xFD, [0x78, 0x56, 0x34, 0x12], &[]));
    let mut master = connected(mock, MasterConfig::default()).await;

    let start = parse_mask("1234567840240107").unwrap();
    let found = master.scan_secondary_from(start).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(master.transport().written().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting() {
    let mut mock = MockTransport::new();
    mock.queue_silence();
    let config = MasterConfig {
        response_timeout: Duration::from_secs(5),
        ..MasterConfig::default()
    };
    let mut master = connected(mock, config).await;
    let token = master.cancellation_token();

    let cancel_soon = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    };
    let (result, _) = tokio::join!(master.request_data(1), cancel_soon);
    assert_eq!(result.unwrap_err(), MBusError::Cancelled);

    // nothing further is written once cancelled
    assert_eq!(master.ping(1).await.unwrap_err(), MBusError::Cancelled);
    assert_eq!(master.transport().written().len(), 1);
}

#[tokio::test]
async fn test_send_requires_connect() {
    let mut master = MBusMaster::new(MockTransport::new(), MasterConfig::default());
    let err = master.ping(1).await.unwrap_err();
    assert_eq!(err, MBusError::Transport("not connected".to_string()));
}
