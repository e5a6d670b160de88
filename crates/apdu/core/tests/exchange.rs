//! End-to-end exchanges against simulated devices

mod common;

use common::{LoopbackTransport, ScriptedTransport, init_tracing};
use keywire_apdu_core::prelude::*;
use keywire_apdu_core::{LengthField, LengthForm, ProtocolViolation};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_loopback_round_trip_short_mode() {
    init_tracing();

    for len in [0usize, 1, 200, 255, 256, 1000, 4096, 65535] {
        let data = pattern(len);
        let mut executor = CardExecutor::new(LoopbackTransport::default());

        let command = Command::new_with_data(0x00, 0xDA, 0x01, 0x02, data.clone());
        let response = executor.transmit(&command).unwrap();

        assert!(response.is_success(), "len {len}");
        assert_eq!(response.payload().as_ref(), data.as_slice(), "len {len}");
    }
}

#[test]
fn test_loopback_round_trip_extended_mode() {
    init_tracing();

    for len in [0usize, 255, 256, 30000, 65535] {
        let data = pattern(len);
        let config = ExchangeConfig::new().with_extended_length(true);
        let mut executor = CardExecutor::with_config(LoopbackTransport::default(), config);

        let command = Command::new_with_data_and_le(0x00, 0xDA, 0x01, 0x02, data.clone(), 65536);
        // Le beyond 256 forces the extended form even for short data
        assert_eq!(command.length_form().unwrap(), LengthForm::Extended);

        let response = executor.transmit(&command).unwrap();
        assert_eq!(response.payload().as_ref(), data.as_slice(), "len {len}");
        assert_eq!(executor.transport().round_trips, 1, "len {len}");
    }
}

#[test]
fn test_three_chunk_response_reassembly() {
    init_tracing();

    let chunks = [vec![0x11u8; 0x40], vec![0x22u8; 0x40], vec![0x33u8; 0x20]];
    let frames = [
        [chunks[0].as_slice(), &[0x61, 0x40]].concat(),
        [chunks[1].as_slice(), &[0x61, 0x20]].concat(),
        [chunks[2].as_slice(), &[0x90, 0x00]].concat(),
    ];
    let mut executor = CardExecutor::new(ScriptedTransport::new(frames));

    let response = executor.transmit(&Command::new(0x00, 0xCB, 0x3F, 0xFF)).unwrap();

    assert_eq!(response.payload().as_ref(), chunks.concat().as_slice());
    assert_eq!(response.status(), status::SUCCESS);

    let transport = executor.into_transport();
    assert_eq!(transport.round_trips(), 3);
    assert_eq!(transport.commands[1].as_ref(), &[0x00, 0xC0, 0x00, 0x00, 0x40]);
    assert_eq!(transport.commands[2].as_ref(), &[0x00, 0xC0, 0x00, 0x00, 0x20]);
}

#[test]
fn test_oversized_command_never_reaches_transport() {
    let mut executor = CardExecutor::new(ScriptedTransport::new([vec![0x90u8, 0x00]]));

    let command = Command::new_with_data(0x00, 0xDA, 0x00, 0x00, vec![0u8; 65536]);
    let err = executor.transmit(&command).unwrap_err();

    assert!(matches!(
        err.root(),
        Error::SizeLimitExceeded { field: LengthField::Data, len: 65536, .. }
    ));
    assert_eq!(executor.transport().round_trips(), 0);
}

#[test]
fn test_terminal_error_status_is_returned_not_raised() {
    let mut executor = CardExecutor::new(ScriptedTransport::new([vec![0x69u8, 0x85]]));

    let response = executor.transmit(&Command::new(0x00, 0x01, 0x00, 0x00)).unwrap();

    assert_eq!(response.outcome(), Outcome::ConditionsNotSatisfied);
    assert!(matches!(response.into_result(), Err(Error::Status { .. })));
}

#[test]
fn test_chained_command_rejected_mid_sequence() {
    let mut executor = CardExecutor::new(ScriptedTransport::new([
        vec![0x90u8, 0x00],
        vec![0x67, 0x00],
    ]));

    let command = Command::new_with_data(0x00, 0xDB, 0x3F, 0xFF, pattern(600));
    let err = executor.transmit(&command).unwrap_err();

    assert!(matches!(
        err.root(),
        Error::ProtocolViolation(ProtocolViolation::ChainingAborted { frame: 1, .. })
    ));
    assert!(executor.last_response().is_none());
}

#[test]
fn test_truncated_response_frame() {
    let mut executor = CardExecutor::new(ScriptedTransport::new([vec![0x90u8]]));

    let err = executor.transmit(&Command::new(0x00, 0x01, 0x00, 0x00)).unwrap_err();

    assert!(matches!(
        err.root(),
        Error::ProtocolViolation(ProtocolViolation::ResponseTooShort(1))
    ));
}

#[test]
fn test_failed_continuation_surfaces_no_payload() {
    init_tracing();

    let mut executor = CardExecutor::new(ScriptedTransport::new([
        vec![0x11u8, 0x22, 0x61, 0x10],
        vec![0x69, 0x82],
    ]));

    let err = executor.transmit(&Command::new(0x00, 0xCB, 0x3F, 0xFF)).unwrap_err();

    assert!(matches!(
        err.root(),
        Error::ProtocolViolation(ProtocolViolation::ContinuationAborted { round: 1, .. })
    ));
    assert!(executor.last_response().is_none());
    assert_eq!(executor.transport().round_trips(), 2);
}
